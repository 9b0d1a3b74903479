//! CLI argument definitions

use std::path::PathBuf;

use clap::Parser;
use coplint_core::{DEFAULT_MAX_EXCLUSIONS, Severity};

/// coplint - static analysis and autocorrection for coplint scripts
#[derive(Parser, Debug)]
#[command(name = "coplint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Files or directories to inspect
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Apply corrections and rewrite files
    #[arg(short, long)]
    pub autocorrect: bool,

    /// Configuration file applied after the discovered ones
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Lowest severity that makes the run fail
    #[arg(long, default_value = "refactor")]
    pub fail_level: Severity,

    /// Write a configuration that suppresses every current offense
    #[arg(long)]
    pub auto_gen_config: bool,

    /// Files listed per rule before the generated configuration disables it
    #[arg(long, default_value_t = DEFAULT_MAX_EXCLUSIONS, requires = "auto_gen_config")]
    pub exclude_limit: usize,

    /// Measure time spent per rule
    #[arg(long)]
    pub timings: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
