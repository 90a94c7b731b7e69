//! Hi-C contact-based misjoin detection and contig correction.
//!
//! Hi-C read pairs mapped back to an assembly carry long-range proximity
//! signal: positions that are physically close on the same chromosome
//! accumulate contacts, while a misjoin (two unrelated segments stitched
//! into one contig) shows a depletion of contacts spanning the junction.
//! This crate bins intra-contig read-pair positions into a sparse contact
//! matrix, scores each bin boundary by the capped contact mass spanning
//! it, extracts low-score candidate intervals at coarse resolution,
//! refines them at fine resolution, and splits the contig sequences at
//! the resulting breakpoints.

pub mod config;
pub mod input;
pub mod misjoin;
pub mod output;
pub mod pipeline;
pub mod seq;
