//! Multi-contig detection dispatch.
//!
//! Contigs are independent: each task owns its contig's pair list,
//! contact matrices and score maps, and opens its own read-only BAM
//! handle for the region fetch. Tasks run on a fixed-size rayon pool and
//! the orchestrator blocks on the collect-all barrier; results come back
//! in contig-submission order regardless of completion order. A failed
//! contig is recorded and logged without aborting its siblings.

use anyhow::Result;
use log::{debug, error, info};
use rayon::prelude::*;

use crate::config::DetectConfig;
use crate::input::AlignmentInput;
use crate::misjoin::{self, Interval};
use crate::output::BreakpointMap;

/// Outcome of scanning every contig in the alignment file.
pub struct DetectOutcome {
    pub breakpoints: BreakpointMap,
    pub contigs_scanned: usize,
    pub failed_contigs: Vec<String>,
}

/// Detect misjoins across all contigs in the BAM header.
pub fn detect_all(bam_path: &str, config: &DetectConfig) -> Result<DetectOutcome> {
    let input = AlignmentInput::open(bam_path)?;
    input.require_index(bam_path)?;
    let contigs: Vec<(String, i64)> = input
        .header
        .contigs()
        .map(|(name, length)| (name.to_string(), length))
        .collect();
    drop(input);

    info!(
        "Scanning {} contig(s) with {} worker(s)...",
        contigs.len(),
        config.threads
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build worker pool: {}", e))?;

    // A non-empty retained score range needs the observed position span
    // to exceed 2*window - 5*bin; shorter contigs can never qualify.
    let min_span = 2 * config.depletion_window - 5 * config.wide_bin;

    let results: Vec<(String, Result<Option<Vec<Interval>>>)> = pool.install(|| {
        contigs
            .par_iter()
            .map(|(name, length)| {
                let result = detect_one(bam_path, name, *length, min_span, config);
                (name.clone(), result)
            })
            .collect()
    });

    let mut breakpoints = BreakpointMap::new();
    let mut failed_contigs = Vec::new();
    for (name, result) in results {
        match result {
            Ok(Some(intervals)) if !intervals.is_empty() => {
                info!("{}: {} breakpoint interval(s)", name, intervals.len());
                breakpoints.insert(name, intervals);
            }
            Ok(_) => debug!("{}: no misjoin detected", name),
            Err(e) => {
                error!("{}: detection failed: {}", name, e);
                failed_contigs.push(name);
            }
        }
    }

    info!(
        "Misjoins detected in {} of {} contig(s).",
        breakpoints.len(),
        contigs.len()
    );

    Ok(DetectOutcome {
        breakpoints,
        contigs_scanned: contigs.len(),
        failed_contigs,
    })
}

fn detect_one(
    bam_path: &str,
    contig: &str,
    length: i64,
    min_span: i64,
    config: &DetectConfig,
) -> Result<Option<Vec<Interval>>> {
    if length <= min_span {
        debug!("{}: too short to score ({} bp), skipping", contig, length);
        return Ok(None);
    }

    let mut bam = AlignmentInput::open(bam_path)?;
    let pairs = bam.fetch_contact_pairs(contig, length, config.min_mapq)?;
    debug!("{}: {} intra-contig pair(s)", contig, pairs.len());

    Ok(misjoin::detect_contig(&pairs, config))
}
