//! Single command - report over one CSV file.

use std::path::PathBuf;

use colored::Colorize;
use unireport::{PipelineConfig, ReportKind, ReportPipeline, ReportStore};

pub fn run(
    file: PathBuf,
    kind: Option<ReportKind>,
    output: PathBuf,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    println!(
        "{} {}",
        "Generating report for".cyan().bold(),
        file.display().to_string().white()
    );

    let pipeline = ReportPipeline::from_config(PipelineConfig::from_env()?)?;
    super::execute(ReportStore::new(output), verbose, move |job| {
        pipeline.run_single(&file, kind, Some(job))
    })
}
