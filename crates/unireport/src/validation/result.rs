//! Validation verdict types.

use serde::{Deserialize, Serialize};

/// Verdict on one generated narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True when no check raised an issue.
    pub is_valid: bool,
    /// Issues in check order.
    pub issues: Vec<String>,
    /// Numeric tokens found in the text. Informational only.
    pub numeric_mentions_count: usize,
    /// Length of the text in characters.
    pub report_length: usize,
}

impl ValidationResult {
    /// Build a result from collected issues.
    pub fn new(issues: Vec<String>, numeric_mentions_count: usize, report_length: usize) -> Self {
        Self {
            is_valid: issues.is_empty(),
            issues,
            numeric_mentions_count,
            report_length,
        }
    }
}
