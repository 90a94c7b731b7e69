use std::path::Path;
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info, warn};

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use hicbreak::config::DetectConfig;
use hicbreak::output::{self, RunReport};
use hicbreak::pipeline;
use hicbreak::seq;

#[derive(Parser)]
#[command(name = "hicbreak")]
#[command(
    about = "Hi-C misjoin detection and contig correction",
    long_about = "Detects assembly misjoins from Hi-C contact depletion along contigs \
                  and splits contig sequences at the refined breakpoints."
)]
struct Cli {
    /// Log verbosity level
    #[arg(long, global = true, default_value = "info")]
    log_level: LogLevel,
    /// Write log output to a file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<String>,
    /// Append to log file instead of truncating
    #[arg(long, global = true)]
    append_log: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Detect misjoins and write the corrected assembly
    Run {
        /// Coordinate-sorted and indexed BAM of Hi-C read pairs mapped to the contigs.
        /// Must have an associated .bai index file.
        #[arg(long, required = true)]
        bam: String,
        /// Contig FASTA to split at the detected breakpoints.
        #[arg(long, required = true)]
        fasta: String,
        /// Prefix for output files (e.g., "results/sample1"). Output files will be named
        /// <prefix>.breakpoints.tsv, <prefix>.result.json and <prefix>.corrected.fasta.
        #[arg(long, required = true)]
        out_prefix: String,
        /// Path to detection configuration JSON file (bin sizes, thresholds, workers).
        #[arg(long)]
        config: Option<String>,
        /// Number of worker threads (overrides the config file).
        #[arg(long)]
        threads: Option<usize>,
        /// Force overwrite of existing output files.
        #[arg(short, long)]
        force: bool,
    },
    /// Detect misjoins only (no sequence splitting)
    Detect {
        /// Coordinate-sorted and indexed BAM of Hi-C read pairs mapped to the contigs.
        #[arg(long, required = true)]
        bam: String,
        /// Prefix for output files. Output files will be named
        /// <prefix>.breakpoints.tsv and <prefix>.result.json.
        #[arg(long, required = true)]
        out_prefix: String,
        /// Path to detection configuration JSON file (bin sizes, thresholds, workers).
        #[arg(long)]
        config: Option<String>,
        /// Number of worker threads (overrides the config file).
        #[arg(long)]
        threads: Option<usize>,
        /// Force overwrite of existing output files.
        #[arg(short, long)]
        force: bool,
    },
    /// Apply an existing breakpoints TSV to a FASTA
    Split {
        /// Contig FASTA to split.
        #[arg(long, required = true)]
        fasta: String,
        /// Breakpoints TSV (from the 'detect' command: contig, start, end).
        #[arg(long, required = true)]
        breakpoints: String,
        /// Prefix for output files. The output file will be named <prefix>.corrected.fasta.
        #[arg(long, required = true)]
        out_prefix: String,
        /// Force overwrite of existing output files.
        #[arg(short, long)]
        force: bool,
    },
}

// Helper to check output paths and create directories
fn check_output_paths(
    prefix: &str,
    suffixes: &[&str],
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(prefix);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty() && !parent.exists() {
            info!("Creating output directory: {:?}", parent);
            std::fs::create_dir_all(parent)?;
        }

    if !force {
        for suffix in suffixes {
            let p = format!("{}{}", prefix, suffix);
            if Path::new(&p).exists() {
                return Err(Box::new(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!(
                        "Output file {} already exists. Use --force to overwrite.",
                        p
                    ),
                )));
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&str>, threads: Option<usize>) -> Result<DetectConfig, anyhow::Error> {
    let mut config = match path {
        Some(p) => DetectConfig::load(p)?,
        None => DetectConfig::default(),
    };
    if let Some(t) = threads {
        config.threads = t;
    }
    config.validate()?;
    Ok(config)
}

struct StepTimer {
    total_start: std::time::Instant,
    step_start: std::time::Instant,
}

impl StepTimer {
    fn new() -> Self {
        let now = std::time::Instant::now();
        Self {
            total_start: now,
            step_start: now,
        }
    }
    fn start(&mut self, name: &str) {
        info!("===== [STAGE] {} =====", name);
        self.step_start = std::time::Instant::now();
    }
    fn end(&self) {
        let now = std::time::Instant::now();
        info!("----- Stage Time: {:.2?} -----", now.duration_since(self.step_start));
        info!("----- Total Time: {:.2?} -----", now.duration_since(self.total_start));
    }
}

fn main() {
    let cli = Cli::parse();

    let mut log_builder = env_logger::Builder::from_default_env();
    log_builder
        .filter_level(cli.log_level.to_level_filter())
        .format_module_path(false);
    if let Some(ref path) = cli.log_file {
        let file = if cli.append_log {
            std::fs::File::options().create(true).append(true).open(path)
        } else {
            std::fs::File::create(path)
        }
        .unwrap_or_else(|e| panic!("Could not open log file '{}': {}", path, e));
        log_builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    log_builder.init();

    match &cli.command {
        Commands::Run {
            bam,
            fasta,
            out_prefix,
            config,
            threads,
            force,
        } => {
            if let Err(e) = check_output_paths(
                out_prefix,
                &[".breakpoints.tsv", ".result.json", ".corrected.fasta"],
                *force,
            ) {
                error!("{}", e);
                return;
            }

            let detect_config = match load_config(config.as_deref(), *threads) {
                Ok(c) => c,
                Err(e) => {
                    error!("Error loading configuration: {}", e);
                    return;
                }
            };

            let mut timer = StepTimer::new();
            timer.start("Misjoin Detection");
            let outcome = match pipeline::detect_all(bam, &detect_config) {
                Ok(o) => o,
                Err(e) => {
                    error!("Detection failed: {}", e);
                    return;
                }
            };
            timer.end();

            timer.start("Writing Breakpoints");
            if let Err(e) = write_detection_outputs(out_prefix, &outcome) {
                error!("{}", e);
                return;
            }
            timer.end();

            timer.start("Splitting Sequences");
            if let Err(e) = split_fasta(fasta, out_prefix, &outcome.breakpoints) {
                error!("{}", e);
                return;
            }
            timer.end();
        }
        Commands::Detect {
            bam,
            out_prefix,
            config,
            threads,
            force,
        } => {
            if let Err(e) =
                check_output_paths(out_prefix, &[".breakpoints.tsv", ".result.json"], *force)
            {
                error!("{}", e);
                return;
            }

            let detect_config = match load_config(config.as_deref(), *threads) {
                Ok(c) => c,
                Err(e) => {
                    error!("Error loading configuration: {}", e);
                    return;
                }
            };

            let mut timer = StepTimer::new();
            timer.start("Misjoin Detection");
            let outcome = match pipeline::detect_all(bam, &detect_config) {
                Ok(o) => o,
                Err(e) => {
                    error!("Detection failed: {}", e);
                    return;
                }
            };
            timer.end();

            if let Err(e) = write_detection_outputs(out_prefix, &outcome) {
                error!("{}", e);
            }
        }
        Commands::Split {
            fasta,
            breakpoints,
            out_prefix,
            force,
        } => {
            if let Err(e) = check_output_paths(out_prefix, &[".corrected.fasta"], *force) {
                error!("{}", e);
                return;
            }

            let breakpoint_map = match output::read_breakpoints(breakpoints) {
                Ok(b) => b,
                Err(e) => {
                    error!("Error reading breakpoints {}: {}", breakpoints, e);
                    return;
                }
            };
            info!(
                "Loaded breakpoints for {} contig(s) from {}",
                breakpoint_map.len(),
                breakpoints
            );

            let mut timer = StepTimer::new();
            timer.start("Splitting Sequences");
            if let Err(e) = split_fasta(fasta, out_prefix, &breakpoint_map) {
                error!("{}", e);
                return;
            }
            timer.end();
        }
    }
}

fn write_detection_outputs(
    out_prefix: &str,
    outcome: &pipeline::DetectOutcome,
) -> Result<(), anyhow::Error> {
    let tsv_path = format!("{}.breakpoints.tsv", out_prefix);
    output::write_breakpoints(&tsv_path, &outcome.breakpoints)?;
    info!("Breakpoints written to {}", tsv_path);

    if !outcome.failed_contigs.is_empty() {
        warn!(
            "{} contig(s) failed detection: {}",
            outcome.failed_contigs.len(),
            outcome.failed_contigs.join(", ")
        );
    }

    let report = RunReport::new(
        outcome.breakpoints.clone(),
        outcome.contigs_scanned,
        outcome.failed_contigs.clone(),
    );
    let report_path = format!("{}.result.json", out_prefix);
    report.write(&report_path)?;
    info!("Report written to {}", report_path);
    Ok(())
}

fn split_fasta(
    fasta: &str,
    out_prefix: &str,
    breakpoints: &output::BreakpointMap,
) -> Result<(), anyhow::Error> {
    let sequences = seq::read_fasta(fasta)?;
    info!("Read {} sequence(s) from {}", sequences.len(), fasta);

    let out_path = format!("{}.corrected.fasta", out_prefix);
    let (records_written, contigs_split) = seq::write_corrected(&out_path, &sequences, breakpoints)?;
    info!(
        "Wrote {} record(s) ({} contig(s) split) to {}",
        records_written, contigs_split, out_path
    );
    Ok(())
}
