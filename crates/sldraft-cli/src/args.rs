//! Command-line argument definitions for the `sldraft` replay tool.

use std::path::PathBuf;

use clap::Parser;

/// Replay an interaction script against a single-line diagram
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Diagram JSON to start from (an empty diagram if omitted)
    pub input: Option<PathBuf>,

    /// Interaction script (JSON array of steps)
    #[arg(short, long)]
    pub script: PathBuf,

    /// Where to write the resulting diagram (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Component catalog (JSON array of templates)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
