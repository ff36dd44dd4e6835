//! Deterministic textual digest of an analysis.

use crate::analysis::AnalysisResult;

/// Renders an [`AnalysisResult`] as the plain-text block embedded in prompts
/// and fallback reports.
///
/// Output depends only on the analysis, so the same result always renders
/// to the same text.
#[derive(Debug, Clone)]
pub struct DigestFormatter {
    precision: usize,
}

impl Default for DigestFormatter {
    fn default() -> Self {
        Self { precision: 2 }
    }
}

impl DigestFormatter {
    /// Create a formatter with two-decimal statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of decimals for numeric statistics.
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Render the digest.
    pub fn format(&self, analysis: &AnalysisResult) -> String {
        let p = self.precision;
        let mut lines = vec![
            "Data Overview:".to_string(),
            format!("- Total records: {}", analysis.row_count),
            format!("- Total columns: {}", analysis.column_count),
            format!("- Detected type: {}", analysis.detected_type),
            String::new(),
            "Columns:".to_string(),
        ];
        lines.extend(analysis.columns.iter().map(|c| format!("- {}", c)));

        if !analysis.numeric_stats.is_empty() {
            lines.push("\nNumerical Statistics:".to_string());
            for (column, stats) in &analysis.numeric_stats {
                lines.push(format!("\n{}:", column));
                lines.push(format!("  - Mean: {:.p$}", stats.mean));
                lines.push(format!("  - Median: {:.p$}", stats.median));
                lines.push(format!("  - Range: {:.p$} - {:.p$}", stats.min, stats.max));
                lines.push(format!("  - Std Dev: {:.p$}", stats.std));
            }
        }

        if !analysis.categorical.is_empty() {
            lines.push("\nCategorical Data:".to_string());
            for (column, summary) in &analysis.categorical {
                lines.push(format!("\n{}:", column));
                lines.push(format!("  - Unique values: {}", summary.unique_count));
                if let Some(value) = summary.most_common_value.as_deref().filter(|v| !v.is_empty()) {
                    lines.push(format!(
                        "  - Most common: {} ({} times)",
                        value, summary.most_common_count
                    ));
                }
            }
        }

        lines.join("\n")
    }
}
