//! CLI argument parsing for trialstat

use crate::config::AnalysisConfig;
use crate::segment::SegmentationPolicy;
use crate::summary::GroupBy;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for analysis results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV per-session series for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "trialstat")]
#[command(version)]
#[command(
    about = "Behavioural trial segmentation and learning-curve statistics",
    long_about = None
)]
pub struct Cli {
    /// Analysis configuration file (TOML) listing subjects and sessions
    #[arg(short = 'C', long = "config", value_name = "FILE")]
    pub config: PathBuf,

    /// Directory session paths are resolved against (overrides the file)
    #[arg(long = "root", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Trial segmentation policy
    #[arg(long = "policy", value_enum)]
    pub policy: Option<SegmentationPolicy>,

    /// Stimulus parameter to group trials by
    #[arg(short = 'g', long = "group-by", value_enum)]
    pub group_by: Option<GroupBy>,

    /// Events to read (e.g., -e events=outcomes,stimulus or -e events=stm_size,success)
    #[arg(short = 'e', long = "expr", value_name = "EXPR")]
    pub filter: Option<String>,

    /// Sessions per bootstrap bin
    #[arg(long = "bin-size", value_name = "N")]
    pub bin_size: Option<usize>,

    /// Bootstrap resampling iterations
    #[arg(long = "iterations", value_name = "N")]
    pub iterations: Option<usize>,

    /// Bootstrap seed
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,

    /// Worker threads (0 = available parallelism)
    #[arg(short = 'j', long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Skip bootstrap resampling
    #[arg(long = "no-bootstrap")]
    pub no_bootstrap: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Apply command-line values on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut AnalysisConfig) {
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(group_by) = self.group_by {
            config.group_by = group_by;
        }
        if let Some(expr) = &self.filter {
            config.event_filter = Some(expr.clone());
        }
        if let Some(bin_size) = self.bin_size {
            config.bootstrap.bin_size = bin_size;
        }
        if let Some(iterations) = self.iterations {
            config.bootstrap.iterations = iterations;
        }
        if let Some(seed) = self.seed {
            config.bootstrap.seed = seed;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.no_bootstrap {
            config.bootstrap_enabled = false;
        }
    }
}
