//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use unireport::{AggregationMode, ReportKind};

/// unireport: narrative reports over institutional CSV data
#[derive(Parser)]
#[command(name = "unireport")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate one report over every configured source
    Unified {
        /// Where to read sources from (local or api); overrides AGGREGATION_MODE
        #[arg(short, long)]
        mode: Option<AggregationMode>,

        /// Report kind (general, student, finance); detected when omitted
        #[arg(short, long)]
        kind: Option<ReportKind>,

        /// Directory for the report and its metadata
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Don't write cached copies of loaded sources
        #[arg(long)]
        no_cache: bool,
    },

    /// Generate a report for a single CSV file
    Single {
        /// Path to the data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Report kind (general, student, finance); detected when omitted
        #[arg(short, long)]
        kind: Option<ReportKind>,

        /// Directory for the report and its metadata
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// List saved reports, newest first
    List {
        /// Directory holding saved reports
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },
}
