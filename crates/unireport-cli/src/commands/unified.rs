//! Unified command - one report over every configured source.

use std::path::PathBuf;

use colored::Colorize;
use unireport::{AggregationMode, PipelineConfig, ReportKind, ReportPipeline, ReportStore};

pub fn run(
    mode: Option<AggregationMode>,
    kind: Option<ReportKind>,
    output: PathBuf,
    no_cache: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = PipelineConfig::from_env()?;
    if let Some(mode) = mode {
        config = config.with_mode(mode);
    }
    if no_cache {
        config = config.with_cache(false);
    }

    println!(
        "{} unified report ({} mode)",
        "Generating".cyan().bold(),
        config.mode
    );

    let pipeline = ReportPipeline::from_config(config)?;
    super::execute(ReportStore::new(output), verbose, move |job| {
        pipeline.run_unified(kind, Some(job))
    })
}
