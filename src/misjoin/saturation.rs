//! Saturation level estimation.
//!
//! The saturation level is a percentile of the off-diagonal contact
//! counts, used downstream as an upper cap on any single contact's
//! contribution to the depletion score. Diagonal entries are self-ligation
//! noise, not structural signal, and are excluded entirely.

use super::binning::ContactMatrix;

/// Sentinel returned when no off-diagonal contact exists. The caller must
/// treat the contig as having no detectable misjoin.
pub const UNDEFINED: f64 = -1.0;

/// Percentile of the off-diagonal counts, `pct` in `(0, 1]`.
///
/// NaN counts order below every real count (substituted by zero during
/// the sort, then restored into the lowest slots), so a NaN contact can
/// only surface as the result when the rank lands on it. The result is
/// rounded to 5 decimal digits.
pub fn saturation_level(matrix: &ContactMatrix, pct: f64) -> f64 {
    let mut counts: Vec<f64> = matrix
        .iter()
        .filter(|((b1, b2), _)| b1 != b2)
        .map(|(_, &count)| count)
        .collect();

    if counts.is_empty() {
        return UNDEFINED;
    }
    if counts.len() == 1 {
        return counts[0];
    }

    let nan_count = counts.iter().filter(|c| c.is_nan()).count();
    counts.sort_by(|a, b| {
        let a = if a.is_nan() { 0.0 } else { *a };
        let b = if b.is_nan() { 0.0 } else { *b };
        a.total_cmp(&b)
    });
    for slot in counts.iter_mut().take(nan_count) {
        *slot = f64::NAN;
    }

    let n = counts.len();
    let rank = pct * (n as f64 + 1.0);
    let level = if rank < 1.0 {
        counts[0]
    } else if rank >= n as f64 {
        counts[n - 1]
    } else {
        let lower = rank.floor() as usize;
        let frac = rank - rank.floor();
        counts[lower - 1] + frac * (counts[lower] - counts[lower - 1])
    };

    (level * 1e5).round() / 1e5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix_from(counts: &[f64]) -> ContactMatrix {
        // distinct off-diagonal keys, one per count
        counts
            .iter()
            .enumerate()
            .map(|(i, &c)| ((0, (i as i64 + 1) * 100), c))
            .collect()
    }

    #[test]
    fn test_all_diagonal_is_undefined() {
        let matrix: ContactMatrix = [((0, 0), 9.0), ((100, 100), 4.0)].into_iter().collect();
        assert_eq!(saturation_level(&matrix, 0.95), UNDEFINED);
    }

    #[test]
    fn test_single_off_diagonal_entry_is_returned_directly() {
        let matrix = matrix_from(&[7.0]);
        assert_eq!(saturation_level(&matrix, 0.95), 7.0);
        assert_eq!(saturation_level(&matrix, 0.05), 7.0);
    }

    #[test]
    fn test_interpolated_percentile() {
        let matrix = matrix_from(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        // rank = 0.5 * 6 = 3 -> third sorted value
        assert_eq!(saturation_level(&matrix, 0.5), 3.0);
        // rank = 0.25 * 6 = 1.5 -> halfway between first and second
        assert_eq!(saturation_level(&matrix, 0.25), 1.5);
        // rank beyond n -> maximum
        assert_eq!(saturation_level(&matrix, 0.95), 5.0);
    }

    #[test]
    fn test_low_rank_returns_minimum() {
        let matrix = matrix_from(&[10.0, 20.0, 30.0]);
        // rank = 0.1 * 4 = 0.4 < 1 -> minimum
        assert_eq!(saturation_level(&matrix, 0.1), 10.0);
    }

    #[test]
    fn test_monotonic_in_percentile() {
        let matrix = matrix_from(&[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0]);
        let mut previous = f64::NEG_INFINITY;
        for pct in [0.05, 0.25, 0.5, 0.75, 0.9, 1.0] {
            let level = saturation_level(&matrix, pct);
            assert!(level >= previous, "level decreased at pct {}", pct);
            previous = level;
        }
    }

    #[test]
    fn test_nan_counts_sort_low() {
        let matrix = matrix_from(&[f64::NAN, 5.0, 8.0]);
        // rank = 0.95 * 4 = 3.8 >= 3 -> maximum, untouched by the NaN
        assert_eq!(saturation_level(&matrix, 0.95), 8.0);
        // rank = 0.1 * 4 = 0.4 < 1 -> minimum slot, which holds the NaN
        assert!(saturation_level(&matrix, 0.1).is_nan());
    }

    #[test]
    fn test_rounded_to_five_decimals() {
        let matrix = matrix_from(&[1.0, 2.0]);
        // rank = 0.37 * 3 = 1.11 -> interpolated 1.11, exact after rounding
        assert_eq!(saturation_level(&matrix, 0.37), 1.11);
    }
}
