//! Contact binning.
//!
//! The contact matrix is sparse: contigs are large relative to the bin
//! size, so only observed bin pairs are materialized, keyed by their
//! 0-based bin start positions. Keys are normalized to `(low, high)` so
//! the conceptually symmetric matrix has exactly one entry per unordered
//! bin pair and downstream spans are always non-negative.

use std::collections::HashMap;

use super::ContactPair;

/// Sparse contact matrix: `(binStart1, binStart2)` -> count, with
/// `binStart1 <= binStart2`.
pub type ContactMatrix = HashMap<(i64, i64), f64>;

/// Aggregate read-pair positions into bin-pair counts.
///
/// Pairs failing the upstream filters (unmapped end, cross-contig mate,
/// low mapping quality) never reach this function. Empty input yields an
/// empty matrix, which the pipeline treats as "no misjoin possible".
pub fn bin_pairs(pairs: &[ContactPair], bin_size: i64) -> ContactMatrix {
    let mut matrix = ContactMatrix::new();
    for pair in pairs {
        let b1 = pair.pos1 / bin_size * bin_size;
        let b2 = pair.pos2 / bin_size * bin_size;
        let key = if b1 <= b2 { (b1, b2) } else { (b2, b1) };
        *matrix.entry(key).or_insert(0.0) += 1.0;
    }
    matrix
}
