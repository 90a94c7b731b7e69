//! Breakpoint refinement and merging.
//!
//! Each coarse candidate interval is narrowed to the fine-resolution
//! positions of minimum residual score, collected as one-fine-bin
//! sub-intervals and coalesced where adjacent. The walk over the fine
//! series uses a single persistent cursor and a running minimum anchored
//! where the walk enters the interval; fine positions observed before an
//! interval's start never contribute to its minimum.
//!
//! The left-edge anchoring is kept exactly as-is rather than replaced by
//! a symmetric interval minimum; changing it would shift which positions
//! tie for the minimum and thereby alter detection output.

use super::Interval;
use super::depletion::ScoreTrack;

/// Merge fine-resolution minima into final breakpoint intervals.
///
/// With an empty fine score series this is the identity on `wide` - no
/// narrowing is possible, so the coarse result stands. A coarse interval
/// containing no fine position likewise falls back to itself.
pub fn merge_regions(wide: &[Interval], fine: &ScoreTrack, fine_bin: i64) -> Vec<Interval> {
    if fine.is_empty() {
        return wide.to_vec();
    }

    let positions: Vec<(i64, f64)> = fine.scores.iter().map(|(&p, &s)| (p, s)).collect();
    let mut merged = Vec::new();
    let mut cursor = 0;

    for candidate in wide {
        while cursor < positions.len() && positions[cursor].0 < candidate.start {
            cursor += 1;
        }

        let mut min_score: Option<f64> = None;
        let mut inside: Vec<(i64, f64)> = Vec::new();
        while cursor < positions.len() && positions[cursor].0 < candidate.end {
            let (pos, score) = positions[cursor];
            min_score = Some(match min_score {
                None => score,
                Some(current) => current.min(score),
            });
            inside.push((pos, score));
            cursor += 1;
        }

        match min_score {
            None => merged.push(*candidate),
            Some(minimum) => {
                let mut parts: Vec<Interval> = Vec::new();
                for &(pos, score) in &inside {
                    if score == minimum {
                        match parts.last_mut() {
                            Some(last) if last.end == pos => last.end = pos + fine_bin,
                            _ => parts.push(Interval {
                                start: pos,
                                end: pos + fine_bin,
                            }),
                        }
                    }
                }
                merged.extend(parts);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn track_from(scores: &[(i64, f64)]) -> ScoreTrack {
        let map: BTreeMap<i64, f64> = scores.iter().copied().collect();
        let (start, end) = match (map.keys().next(), map.keys().next_back()) {
            (Some(&lo), Some(&hi)) => (lo, hi + 10),
            _ => (0, 0),
        };
        ScoreTrack {
            scores: map,
            start,
            end,
        }
    }

    #[test]
    fn test_empty_fine_series_is_identity_on_wide() {
        let wide = vec![
            Interval { start: 100, end: 300 },
            Interval { start: 700, end: 900 },
        ];
        let merged = merge_regions(&wide, &ScoreTrack::default(), 10);
        assert_eq!(merged, wide);
    }

    #[test]
    fn test_single_minimum_becomes_one_fine_bin() {
        let wide = vec![Interval { start: 100, end: 200 }];
        let fine = track_from(&[
            (90, 0.5),
            (100, 4.0),
            (110, 4.0),
            (120, 1.0),
            (130, 4.0),
            (200, 9.0),
        ]);
        // 0.5 at position 90 lies before the interval and never applies
        let merged = merge_regions(&wide, &fine, 10);
        assert_eq!(merged, vec![Interval { start: 120, end: 130 }]);
    }

    #[test]
    fn test_tied_minima_coalesce_when_adjacent() {
        let wide = vec![Interval { start: 0, end: 100 }];
        let fine = track_from(&[
            (0, 3.0),
            (10, 1.0),
            (20, 1.0),
            (30, 3.0),
            (40, 1.0),
        ]);
        let merged = merge_regions(&wide, &fine, 10);
        assert_eq!(
            merged,
            vec![
                Interval { start: 10, end: 30 },
                Interval { start: 40, end: 50 },
            ]
        );
    }

    #[test]
    fn test_candidate_without_fine_positions_falls_back_to_itself() {
        let wide = vec![
            Interval { start: 0, end: 50 },
            Interval { start: 300, end: 400 },
        ];
        let fine = track_from(&[(310, 5.0), (320, 2.0)]);
        let merged = merge_regions(&wide, &fine, 10);
        assert_eq!(
            merged,
            vec![
                Interval { start: 0, end: 50 },
                Interval { start: 320, end: 330 },
            ]
        );
    }

    #[test]
    fn test_cursor_is_shared_across_candidates() {
        let wide = vec![
            Interval { start: 0, end: 40 },
            Interval { start: 40, end: 80 },
        ];
        let fine = track_from(&[(10, 2.0), (30, 2.0), (50, 7.0), (60, 4.0)]);
        let merged = merge_regions(&wide, &fine, 10);
        // each candidate only sees its own positions: minima 2.0 and 4.0
        assert_eq!(
            merged,
            vec![
                Interval { start: 10, end: 20 },
                Interval { start: 30, end: 40 },
                Interval { start: 60, end: 70 },
            ]
        );
    }
}
