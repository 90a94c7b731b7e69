//! Per-contig misjoin detection.
//!
//! A contig is scanned in two passes. The wide pass bins intra-contig
//! read-pair positions at coarse resolution, caps contact counts at a
//! percentile saturation level, scores every interior bin boundary by the
//! capped contact mass spanning it, and extracts runs of sub-threshold
//! scores as candidate misjoin intervals. The narrow pass re-bins the same
//! pairs at fine resolution - with the coarse bin size as the new maximum
//! contact span - and narrows each candidate to the fine positions of
//! minimum residual score. Every stage is terminal on an empty result:
//! no pairs, no off-diagonal contacts, no scorable positions, or no
//! sub-threshold run all mean "no misjoin detectable for this contig".

pub mod binning;
pub mod depletion;
pub mod refine;
pub mod saturation;
pub mod wide;

use serde::Serialize;

use crate::config::DetectConfig;
use depletion::ScoreTrack;

/// 0-based positions of a Hi-C read pair's two ends on one contig.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactPair {
    pub pos1: i64,
    pub pos2: i64,
}

/// Half-open genomic interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub start: i64,
    pub end: i64,
}

/// Run the full two-pass detection for one contig.
///
/// Returns `None` when any stage reaches a no-signal terminal state, and
/// `Some(intervals)` with the final breakpoint intervals otherwise. The
/// caller owns the pair list; nothing here touches shared state, so one
/// call per contig parallelizes freely.
pub fn detect_contig(pairs: &[ContactPair], config: &DetectConfig) -> Option<Vec<Interval>> {
    if pairs.is_empty() {
        return None;
    }

    let matrix = binning::bin_pairs(pairs, config.wide_bin);
    let level = saturation::saturation_level(&matrix, config.saturation_pct);
    if level < 0.0 {
        return None;
    }

    let track = depletion::depletion_scores(
        &matrix,
        config.wide_bin,
        config.depletion_window,
        level,
    );
    if track.is_empty() {
        return None;
    }

    let threshold = wide::depletion_threshold(
        level,
        config.sensitivity,
        config.depletion_window,
        config.wide_bin,
    );
    let candidates = wide::depleted_runs(&track, threshold, config.wide_bin);
    if candidates.is_empty() {
        return None;
    }

    // Narrow pass: the coarse bin becomes the contact-span limit, so the
    // residual score inside a candidate only sees contacts local to one
    // coarse bin.
    let fine_matrix = binning::bin_pairs(pairs, config.narrow_bin);
    let fine_level = saturation::saturation_level(&fine_matrix, config.saturation_pct);
    let fine_track = if fine_level < 0.0 {
        ScoreTrack::default()
    } else {
        depletion::depletion_scores(&fine_matrix, config.narrow_bin, config.wide_bin, fine_level)
    };

    Some(refine::merge_regions(&candidates, &fine_track, config.narrow_bin))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Uniform contact lattice: `count` pairs between every bin pair with
    /// span up to `max_span_bins`, over `n_bins` bins of `bin` bp.
    fn uniform_pairs(n_bins: i64, bin: i64, max_span_bins: i64, count: usize) -> Vec<ContactPair> {
        let mut pairs = Vec::new();
        for i in 0..=n_bins {
            for d in 1..=max_span_bins {
                let j = i + d;
                if j > n_bins {
                    continue;
                }
                for _ in 0..count {
                    pairs.push(ContactPair {
                        pos1: i * bin,
                        pos2: j * bin,
                    });
                }
            }
        }
        pairs
    }

    #[test]
    fn test_empty_pair_list_is_terminal() {
        assert_eq!(detect_contig(&[], &DetectConfig::default()), None);
    }

    #[test]
    fn test_uniform_density_yields_no_misjoin() {
        let config = DetectConfig::default();
        // 1 Mb contig, contacts between all bin pairs within the window
        let pairs = uniform_pairs(40, config.wide_bin, 4, 10);
        assert_eq!(detect_contig(&pairs, &config), None);
    }

    #[test]
    fn test_depleted_window_at_midpoint_is_refined_to_one_fine_bin() {
        let config = DetectConfig::default();
        let midpoint = 20 * config.wide_bin;
        // Same lattice, minus every contact properly spanning the midpoint.
        let pairs: Vec<ContactPair> = uniform_pairs(40, config.wide_bin, 4, 10)
            .into_iter()
            .filter(|p| !(p.pos1 < midpoint && midpoint < p.pos2))
            .collect();

        let intervals = detect_contig(&pairs, &config).expect("expected a detected misjoin");
        assert_eq!(
            intervals,
            vec![Interval {
                start: midpoint,
                end: midpoint + config.narrow_bin,
            }]
        );
    }
}
