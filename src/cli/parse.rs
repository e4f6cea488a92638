//! CLI parse: clap types for Footprints. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Footprints CLI - ship telemetry commands to a collection endpoint
#[derive(Parser, Debug)]
#[command(name = "footprints")]
#[command(about = "Ship telemetry events to a collection endpoint with retrying delivery")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory searched for footprints.toml
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Collection endpoint (overrides configuration)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Report non-fatal pipeline errors
    #[arg(long)]
    pub debug: bool,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read commands as JSON arrays, one per line, push them and flush
    Send {
        /// Input file (default: stdin)
        #[arg(long)]
        input: Option<PathBuf>,
        /// How long to wait for delivery before giving up
        #[arg(long, default_value = "30000")]
        flush_timeout_ms: u64,
    },
    /// Print the effective configuration as JSON
    Config,
    /// Validate configuration
    Validate,
}
