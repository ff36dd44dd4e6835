//! CLI command implementations.

pub mod list;
pub mod single;
pub mod unified;

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use colored::Colorize;
use unireport::{
    DigestFormatter, JobHandle, JobRegistry, JobState, ReportBundle, ReportStore, SavedReport,
};

/// Run `work` as a background job, printing stage changes, then save and summarize.
pub(crate) fn execute<F>(
    store: ReportStore,
    verbose: bool,
    work: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&JobHandle) -> unireport::Result<ReportBundle> + Send + 'static,
{
    let registry = JobRegistry::new();
    let (tx, rx) = mpsc::channel();

    let (id, join) = registry.spawn(move |job| {
        let bundle = work(job)?;
        let saved = store.save(&bundle)?;
        let name = saved.report_path.display().to_string();
        // the receiver only goes away if the CLI is already exiting
        let _ = tx.send((bundle, saved));
        Ok(name)
    });

    let mut last = String::new();
    loop {
        let status = registry.status(id)?;
        if status.state.is_terminal() {
            break;
        }
        let text = status.status_text();
        if text != last {
            println!("  [{:>3}%] {}", status.progress, text.dimmed());
            last = text;
        }
        thread::sleep(Duration::from_millis(100));
    }
    join.join().map_err(|_| "report job panicked")?;

    if let JobState::Error(message) = registry.status(id)?.state {
        return Err(message.into());
    }
    let (bundle, saved) = rx.recv()?;
    print_summary(&bundle, &saved, verbose);
    Ok(())
}

fn print_summary(bundle: &ReportBundle, saved: &SavedReport, verbose: bool) {
    let analysis = &bundle.analysis;

    println!();
    println!(
        "{} {} rows x {} columns ({} data)",
        "Analyzed".cyan().bold(),
        analysis.row_count.to_string().white().bold(),
        analysis.column_count,
        analysis.detected_type
    );

    let loaded = bundle.ingest.loaded().count();
    println!(
        "Sources: {} loaded, {} skipped",
        loaded.to_string().white().bold(),
        bundle.ingest.skipped_count()
    );
    for failure in bundle.ingest.failures() {
        println!("  {} {}", "failed".red(), failure);
    }

    let cleaning = &bundle.cleaning;
    println!(
        "Cleaning: {} duplicates removed, {} columns dropped, {} coerced, {} cells imputed",
        cleaning.duplicates_removed,
        cleaning.columns_dropped.len(),
        cleaning.columns_coerced.len(),
        cleaning.cells_imputed
    );

    if verbose {
        println!();
        println!("{}", "Data digest:".yellow().bold());
        for line in DigestFormatter::new().format(analysis).lines() {
            println!("  {}", line);
        }
    }

    println!();
    if bundle.is_fallback {
        println!(
            "{} generation failed after {} attempt(s); saved the template report",
            "Fallback:".yellow().bold(),
            bundle.attempts
        );
    } else {
        println!(
            "Generated by {} in {} attempt(s)",
            bundle.generator.white(),
            bundle.attempts
        );
    }
    if let Some(usage) = &bundle.usage {
        println!(
            "Tokens: {} prompt, {} output, {} total",
            usage.prompt_tokens, usage.output_tokens, usage.total_tokens
        );
    }

    if bundle.validation.is_valid {
        println!("{}", "Validation passed".green());
    } else {
        println!(
            "{} {} issue(s):",
            "Validation raised".yellow().bold(),
            bundle.validation.issues.len()
        );
        for issue in &bundle.validation.issues {
            println!("  - {}", issue.yellow());
        }
    }

    println!();
    println!(
        "{} {}",
        "Saved to".green().bold(),
        saved.report_path.display().to_string().white()
    );
    println!("Metadata: {}", saved.metadata_path.display());
}
