use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use jtlcompare_core::compare::{ComparisonMetric, DiffMode};

#[derive(Parser, Debug)]
#[command(
    name = "jtlcompare",
    version,
    about = "Analyse and compare JMeter JTL/CSV result files"
)]
pub struct Cli {
    /// Settings file (JSON). Flags given on the command line take precedence.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// APDEX toleration threshold in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub toleration: Option<u64>,

    /// APDEX frustration threshold in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub frustration: Option<u64>,

    /// Log filter used when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process result files and print their statistics
    Analyze {
        /// One or more .jtl/.csv files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Compare a baseline file against a candidate, endpoint by endpoint
    Compare {
        baseline: PathBuf,
        candidate: PathBuf,

        /// Comma-separated metrics, e.g. average,percentile95,errorPercentage
        #[arg(long, value_delimiter = ',')]
        metrics: Vec<ComparisonMetric>,

        /// Percent change below which a metric counts as unchanged
        #[arg(long)]
        threshold: Option<f64>,

        /// How differences are shown (absolute, percentage, hybrid)
        #[arg(long)]
        mode: Option<DiffMode>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Write statistics, APDEX scores, raw records or a comparison to a file
    Export {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(short, long, value_enum)]
        kind: ExportKind,

        /// Destination file; standard output when omitted
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Statistics,
    Apdex,
    Records,
    /// Needs exactly two files: baseline then candidate
    Comparison,
    Json,
}
