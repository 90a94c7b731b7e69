//! Alignment input over noodles BAM.
//!
//! The detection pipeline only needs positions, mate positions, flags and
//! mapping quality, so records are decoded into a thin `PairRecord`
//! rather than a full alignment representation. Region queries require a
//! `.bai` index; every worker opens its own reader, so the handle is
//! never shared across contig tasks.

use std::fs::File;
use std::io::BufReader;
use anyhow::{Result, bail};

use noodles::bam;
use noodles::bgzf;
use noodles::core::Region;
use noodles::sam;

use crate::misjoin::ContactPair;

/// Secondary, duplicate, and supplementary alignments carry no usable
/// pairing signal for contact counting.
const FILTERED_FLAGS: u16 = 0x100 | 0x400 | 0x800;

/// Simplified header info extracted from noodles sam::Header.
#[derive(Debug, Clone)]
pub struct AlignmentHeader {
    pub refs: Vec<String>,
    pub lengths: Vec<i64>,
}

impl AlignmentHeader {
    fn from_sam_header(header: &sam::Header) -> Self {
        let mut refs = Vec::new();
        let mut lengths = Vec::new();
        for (name, map) in header.reference_sequences().iter() {
            refs.push(String::from_utf8_lossy(name).to_string());
            lengths.push(map.length().get() as i64);
        }
        AlignmentHeader { refs, lengths }
    }

    /// Contig names and lengths in header order.
    pub fn contigs(&self) -> impl Iterator<Item = (&str, i64)> {
        self.refs
            .iter()
            .map(|name| name.as_str())
            .zip(self.lengths.iter().copied())
    }
}

/// The slice of a BAM record relevant to contact-pair extraction.
/// Positions are 0-based; -1 marks an unmapped end.
#[derive(Debug, Clone, Copy)]
pub struct PairRecord {
    pub ref_id: i32,
    pub pos: i64,
    pub flag: u16,
    pub mapq: u8,
    pub mate_ref_id: i32,
    pub mate_pos: i64,
}

impl PairRecord {
    /// True when this record contributes a contact: both ends mapped to
    /// the same contig, primary alignment, at or above `min_mapq`.
    pub fn is_intra_contact(&self, min_mapq: u8) -> bool {
        self.flag & FILTERED_FLAGS == 0
            && self.pos >= 0
            && self.mate_pos >= 0
            && self.mate_ref_id == self.ref_id
            && self.mapq >= min_mapq
    }
}

/// Decode a noodles BAM record into our PairRecord.
fn decode_pair_record(rec: &bam::Record) -> Result<PairRecord> {
    let ref_id = match rec.reference_sequence_id() {
        Some(Ok(id)) => id as i32,
        Some(Err(e)) => return Err(e.into()),
        None => -1,
    };

    let pos = match rec.alignment_start() {
        Some(Ok(p)) => (p.get() as i64) - 1, // convert 1-based to 0-based
        Some(Err(e)) => return Err(e.into()),
        None => -1,
    };

    let flag = rec.flags().bits();
    let mapq = match rec.mapping_quality() {
        Some(q) => q.get(),
        None => 255,
    };

    let mate_ref_id = match rec.mate_reference_sequence_id() {
        Some(Ok(id)) => id as i32,
        _ => -1,
    };
    let mate_pos = match rec.mate_alignment_start() {
        Some(Ok(p)) => (p.get() as i64) - 1,
        _ => -1,
    };

    Ok(PairRecord {
        ref_id,
        pos,
        flag,
        mapq,
        mate_ref_id,
        mate_pos,
    })
}

/// Inner reader enum
enum Inner {
    Indexed(bam::io::IndexedReader<bgzf::Reader<File>>),
    Plain(bam::io::Reader<bgzf::Reader<BufReader<File>>>),
}

/// BAM input with a simplified header and per-contig contact queries.
pub struct AlignmentInput {
    inner: Inner,
    sam_header: sam::Header,
    pub header: AlignmentHeader,
}

impl AlignmentInput {
    /// Open a BAM file, using the `.bai` index when one exists next to it.
    pub fn open(path: &str) -> Result<Self> {
        let index_path = format!("{}.bai", path);
        let has_index = std::path::Path::new(&index_path).exists();

        if has_index {
            let mut reader = bam::io::indexed_reader::Builder::default()
                .build_from_path(path)
                .map_err(|e| anyhow::anyhow!("Failed to open BAM {}: {}", path, e))?;
            let sam_header = reader.read_header()?;
            let header = AlignmentHeader::from_sam_header(&sam_header);
            Ok(AlignmentInput {
                inner: Inner::Indexed(reader),
                sam_header,
                header,
            })
        } else {
            let file = File::open(path)
                .map_err(|e| anyhow::anyhow!("Failed to open BAM {}: {}", path, e))?;
            let mut reader = bam::io::Reader::new(BufReader::new(file));
            let sam_header = reader.read_header()?;
            let header = AlignmentHeader::from_sam_header(&sam_header);
            Ok(AlignmentInput {
                inner: Inner::Plain(reader),
                sam_header,
                header,
            })
        }
    }

    /// Fetch the intra-contig contact pairs for one contig.
    ///
    /// Every record passing the upstream filters yields exactly one pair
    /// (its own position and its mate's); mates are not deduplicated, so
    /// a fully mapped pair contributes twice, symmetrically.
    pub fn fetch_contact_pairs(
        &mut self,
        contig: &str,
        length: i64,
        min_mapq: u8,
    ) -> Result<Vec<ContactPair>> {
        let region_str = format!("{}:1-{}", contig, length);
        let region: Region = region_str
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid region '{}': {}", region_str, e))?;

        let reader = match &mut self.inner {
            Inner::Indexed(reader) => reader,
            Inner::Plain(_) => bail!("Contig queries require an indexed BAM file"),
        };

        let mut pairs = Vec::new();
        for result in reader.query(&self.sam_header, &region)? {
            let rec = result?;
            let record = decode_pair_record(&rec)?;
            if record.is_intra_contact(min_mapq) {
                pairs.push(ContactPair {
                    pos1: record.pos,
                    pos2: record.mate_pos,
                });
            }
        }
        Ok(pairs)
    }

    /// Returns true if an index file was found for this reader.
    pub fn has_index(&self) -> bool {
        matches!(self.inner, Inner::Indexed(_))
    }

    /// Check that an index exists, returning a clear error if not.
    pub fn require_index(&self, path: &str) -> Result<()> {
        if !self.has_index() {
            bail!(
                "Index file not found for '{}'. Expected '{}.bai'. \
                 Create one with 'samtools index'.",
                path,
                path
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pos: i64, mate_pos: i64) -> PairRecord {
        PairRecord {
            ref_id: 0,
            pos,
            flag: 0,
            mapq: 30,
            mate_ref_id: 0,
            mate_pos,
        }
    }

    #[test]
    fn test_mapped_same_contig_pair_is_kept() {
        assert!(record(100, 5000).is_intra_contact(1));
    }

    #[test]
    fn test_unmapped_ends_are_excluded() {
        assert!(!record(-1, 5000).is_intra_contact(1));
        assert!(!record(100, -1).is_intra_contact(1));
    }

    #[test]
    fn test_cross_contig_mate_is_excluded() {
        let mut rec = record(100, 5000);
        rec.mate_ref_id = 1;
        assert!(!rec.is_intra_contact(1));
    }

    #[test]
    fn test_low_mapping_quality_is_excluded() {
        let mut rec = record(100, 5000);
        rec.mapq = 0;
        assert!(!rec.is_intra_contact(1));
        assert!(rec.is_intra_contact(0));
    }

    #[test]
    fn test_secondary_and_supplementary_are_excluded() {
        for flag in [0x100, 0x400, 0x800] {
            let mut rec = record(100, 5000);
            rec.flag = flag;
            assert!(!rec.is_intra_contact(1), "flag {:#x} kept", flag);
        }
    }
}
