//! Detection configuration.
//!
//! All knobs live in one JSON-loadable struct with per-field defaults, so
//! a config file only needs to name the options it changes. Invariants
//! between options are checked once at load time, before any per-contig
//! work starts - a bad bin-size pairing would silently degrade detection
//! rather than crash, so it must never reach the pipeline.

use anyhow::{Result, bail};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;

/// Detection parameters for the misjoin pipeline.
#[derive(Deserialize, Debug, Clone)]
pub struct DetectConfig {
    /// Percentile of off-diagonal contact counts used as the saturation cap.
    #[serde(default = "default_saturation_pct")]
    pub saturation_pct: f64,
    /// Sensitivity multiplier on the depletion threshold.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    /// Minimum mapping quality for a read-pair record to be counted.
    #[serde(default = "default_min_mapq")]
    pub min_mapq: u8,
    /// Coarse bin size (bp) for candidate detection.
    #[serde(default = "default_wide_bin")]
    pub wide_bin: i64,
    /// Fine bin size (bp) for breakpoint refinement.
    #[serde(default = "default_narrow_bin")]
    pub narrow_bin: i64,
    /// Maximum contact span (bp) contributing to the depletion score.
    #[serde(default = "default_depletion_window")]
    pub depletion_window: i64,
    /// Worker pool size; one task per contig.
    #[serde(default = "default_threads")]
    pub threads: usize,
}

fn default_saturation_pct() -> f64 { 0.95 }
fn default_sensitivity() -> f64 { 0.5 }
fn default_min_mapq() -> u8 { 1 }
fn default_wide_bin() -> i64 { 25_000 }
fn default_narrow_bin() -> i64 { 1_000 }
fn default_depletion_window() -> i64 { 100_000 }
fn default_threads() -> usize { 1 }

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            saturation_pct: default_saturation_pct(),
            sensitivity: default_sensitivity(),
            min_mapq: default_min_mapq(),
            wide_bin: default_wide_bin(),
            narrow_bin: default_narrow_bin(),
            depletion_window: default_depletion_window(),
            threads: default_threads(),
        }
    }
}

impl DetectConfig {
    /// Load configuration from a JSON file and validate it.
    pub fn load(path: &str) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open config {}: {}", path, e))?;
        let reader = BufReader::new(file);
        let config: DetectConfig = serde_json::from_reader(reader)
            .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-option invariants.
    pub fn validate(&self) -> Result<()> {
        if !(self.saturation_pct > 0.0 && self.saturation_pct <= 1.0) {
            bail!(
                "saturation_pct must be in (0, 1], got {}",
                self.saturation_pct
            );
        }
        if self.sensitivity <= 0.0 {
            bail!("sensitivity must be positive, got {}", self.sensitivity);
        }
        if self.wide_bin <= 0 {
            bail!("wide_bin must be positive, got {}", self.wide_bin);
        }
        if self.narrow_bin <= 0 {
            bail!("narrow_bin must be positive, got {}", self.narrow_bin);
        }
        if self.narrow_bin >= self.wide_bin {
            bail!(
                "narrow_bin ({}) must be smaller than wide_bin ({})",
                self.narrow_bin,
                self.wide_bin
            );
        }
        if self.depletion_window < 2 * self.wide_bin {
            bail!(
                "depletion_window ({}) must be at least twice wide_bin ({})",
                self.depletion_window,
                self.wide_bin
            );
        }
        if self.threads == 0 {
            bail!("threads must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DetectConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.wide_bin, 25_000);
        assert_eq!(config.narrow_bin, 1_000);
        assert_eq!(config.depletion_window, 100_000);
        assert_eq!(config.threads, 1);
    }

    #[test]
    fn test_bin_size_ordering_rejected() {
        let config = DetectConfig {
            narrow_bin: 25_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_window_too_small_rejected() {
        let config = DetectConfig {
            depletion_window: 40_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_percentile_bounds() {
        let mut config = DetectConfig {
            saturation_pct: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        config.saturation_pct = 1.0;
        assert!(config.validate().is_ok());
        config.saturation_pct = 1.01;
        assert!(config.validate().is_err());
    }
}
