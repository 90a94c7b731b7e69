//! Run outputs: breakpoints TSV and the JSON run report.
//!
//! The TSV is the exchange format between detection and splitting - the
//! `split` subcommand consumes exactly what `detect` produces, so the
//! reader validates per contig what the detector guarantees: sorted,
//! non-overlapping half-open intervals.

use anyhow::Result;
use indexmap::IndexMap;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};

use crate::misjoin::Interval;

/// Per-contig breakpoint intervals, keyed by contig name in submission
/// order.
pub type BreakpointMap = IndexMap<String, Vec<Interval>>;

/// Summary of one detection run, serialized to `<prefix>.result.json`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Crate version that produced this report
    pub version: String,
    /// Contigs present in the alignment header
    pub contigs_scanned: usize,
    /// Contigs with at least one breakpoint interval
    pub contigs_with_misjoins: usize,
    /// Contigs whose detection task failed (siblings still completed)
    pub failed_contigs: Vec<String>,
    /// Final breakpoint intervals per contig
    pub breakpoints: BreakpointMap,
}

impl RunReport {
    pub fn new(breakpoints: BreakpointMap, contigs_scanned: usize, failed: Vec<String>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            contigs_scanned,
            contigs_with_misjoins: breakpoints.len(),
            failed_contigs: failed,
            breakpoints,
        }
    }

    pub fn write(&self, path: &str) -> Result<()> {
        let file = File::create(path)
            .map_err(|e| anyhow::anyhow!("Failed to create report {}: {}", path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

/// Write breakpoints as a 3-column TSV (contig, 0-based half-open
/// start/end).
pub fn write_breakpoints(path: &str, breakpoints: &BreakpointMap) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| anyhow::anyhow!("Failed to create breakpoints file {}: {}", path, e))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "#contig\tstart\tend")?;
    for (contig, intervals) in breakpoints {
        for interval in intervals {
            writeln!(writer, "{}\t{}\t{}", contig, interval.start, interval.end)?;
        }
    }
    Ok(())
}

pub fn read_breakpoints(path: &str) -> Result<BreakpointMap> {
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("Failed to open breakpoints file {}: {}", path, e))?;
    read_breakpoints_from_reader(BufReader::new(file))
}

pub fn read_breakpoints_from_reader<R: BufRead>(reader: R) -> Result<BreakpointMap> {
    let mut breakpoints = BreakpointMap::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 3 {
            anyhow::bail!(
                "Malformed breakpoints line {} (expected 3 columns, got {}): {}",
                i + 1,
                parts.len(),
                line
            );
        }

        let start: i64 = parts[1]
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid start at line {}: {}", i + 1, e))?;
        let end: i64 = parts[2]
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid end at line {}: {}", i + 1, e))?;
        if end <= start {
            anyhow::bail!("Empty interval at line {}: {}", i + 1, line);
        }

        breakpoints
            .entry(parts[0].to_string())
            .or_insert_with(Vec::new)
            .push(Interval { start, end });
    }

    for (contig, intervals) in breakpoints.iter_mut() {
        intervals.sort_by_key(|interval| interval.start);
        for pair in intervals.windows(2) {
            if pair[1].start < pair[0].end {
                anyhow::bail!(
                    "Overlapping breakpoint intervals for {}: [{}, {}) and [{}, {})",
                    contig,
                    pair[0].start,
                    pair[0].end,
                    pair[1].start,
                    pair[1].end
                );
            }
        }
    }

    Ok(breakpoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_breakpoints_parsing() {
        let data = "#contig\tstart\tend\nctg1\t100\t200\nctg1\t50\t80\nctg2\t700\t900\n";
        let breakpoints = read_breakpoints_from_reader(Cursor::new(data)).unwrap();

        assert_eq!(breakpoints.len(), 2);
        assert_eq!(
            breakpoints["ctg1"],
            vec![
                Interval { start: 50, end: 80 },
                Interval { start: 100, end: 200 },
            ]
        );
        assert_eq!(breakpoints["ctg2"], vec![Interval { start: 700, end: 900 }]);
    }

    #[test]
    fn test_malformed_line_is_rejected() {
        let data = "ctg1\t100\n";
        assert!(read_breakpoints_from_reader(Cursor::new(data)).is_err());
    }

    #[test]
    fn test_overlapping_intervals_are_rejected() {
        let data = "ctg1\t100\t300\nctg1\t200\t400\n";
        assert!(read_breakpoints_from_reader(Cursor::new(data)).is_err());
    }

    #[test]
    fn test_report_counts() {
        let mut breakpoints = BreakpointMap::new();
        breakpoints.insert("ctg2".to_string(), vec![Interval { start: 10, end: 20 }]);
        let report = RunReport::new(breakpoints, 5, vec!["ctg4".to_string()]);
        assert_eq!(report.contigs_scanned, 5);
        assert_eq!(report.contigs_with_misjoins, 1);
        assert_eq!(report.failed_contigs, vec!["ctg4".to_string()]);
    }
}
