use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pdv",
    author,
    version,
    about = "Compare metric distributions across power-grid dataset versions",
    long_about = None
)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute (or reuse) metrics for every configured version and compare them
    Compare {
        /// Path to the JSON run configuration
        #[arg(long)]
        config: PathBuf,
        /// Override the configured output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Recompute metrics even when a cached copy exists
        #[arg(long)]
        force: bool,
    },
    /// Compute and cache the metrics of one dataset version
    Metrics {
        /// Metrics processor (see `pdv processors`)
        #[arg(long, default_value = "snapshot")]
        processor: String,
        /// Directory holding the version's sample files
        #[arg(long)]
        data_dir: PathBuf,
        /// Recompute metrics even when a cached copy exists
        #[arg(long)]
        force: bool,
    },
    /// List the available metrics processors
    Processors,
}
