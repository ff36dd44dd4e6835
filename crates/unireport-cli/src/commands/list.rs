//! List command - show saved reports.

use std::path::PathBuf;

use chrono::Local;
use colored::Colorize;
use unireport::ReportStore;

pub fn run(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let store = ReportStore::new(output);
    let reports = store.list()?;

    if reports.is_empty() {
        println!("No reports found in {}", store.dir().display());
        return Ok(());
    }

    println!(
        "{} {} report(s) in {}",
        "Found".cyan().bold(),
        reports.len().to_string().white().bold(),
        store.dir().display()
    );
    println!();

    for report in reports {
        let modified = report
            .modified
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}  {:>9}  {}",
            modified.dimmed(),
            format_size(report.size_bytes),
            report.file_name.white()
        );
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
    }
}
