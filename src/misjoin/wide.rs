//! Coarse candidate detection.
//!
//! The detection threshold approximates the capped contact mass a fully
//! connected window would deposit on one of its interior boundaries: with
//! `r = window / bin` bins per window there are `r * (r - 1) / 2` bin
//! pairs, each contributing at most the saturation level. A position
//! scoring below a `sensitivity` fraction of that mass has materially
//! fewer long-range contacts than an intact region supports.

use super::Interval;
use super::depletion::ScoreTrack;

/// Sub-threshold cutoff for the depletion-score scan.
pub fn depletion_threshold(saturation: f64, sensitivity: f64, window: i64, bin_size: i64) -> f64 {
    let r = window as f64 / bin_size as f64;
    sensitivity * saturation * 0.5 * r * (r - 1.0)
}

/// Extract maximal runs of sub-threshold positions as candidate
/// intervals.
///
/// An interval opens at the first position scoring below the threshold
/// and closes at the first position at or above it; a run still open when
/// the series ends closes synthetically one bin past the last position.
/// Output is ascending and non-overlapping by construction.
pub fn depleted_runs(track: &ScoreTrack, threshold: f64, bin_size: i64) -> Vec<Interval> {
    let mut intervals = Vec::new();
    let mut open: Option<i64> = None;
    let mut last_pos: Option<i64> = None;

    for (&pos, &score) in &track.scores {
        if score < threshold {
            if open.is_none() {
                open = Some(pos);
            }
        } else if let Some(start) = open.take() {
            intervals.push(Interval { start, end: pos });
        }
        last_pos = Some(pos);
    }

    if let (Some(start), Some(last)) = (open, last_pos) {
        intervals.push(Interval {
            start,
            end: last + bin_size,
        });
    }

    intervals
}
