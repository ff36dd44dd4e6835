//! Error types for the unireport library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for report pipeline operations.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Input had no header or no lines at all.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// A single source could not be read or parsed.
    #[error("Failed to read source '{source_name}': {reason}")]
    SourceRead { source_name: String, reason: String },

    /// No source produced a usable table.
    #[error("No valid data ingested from {} source(s)", failures.len())]
    NoDataIngested { failures: Vec<String> },

    /// HTTP transport or status error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Text generation failed.
    #[error("Generation error: {0}")]
    Generation(String),

    /// Writing a report artifact failed.
    #[error("Failed to persist '{path}': {reason}")]
    Persist { path: PathBuf, reason: String },

    /// Job id not present in the registry.
    #[error("Unknown job: {0}")]
    UnknownJob(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Result type alias for unireport operations.
pub type Result<T> = std::result::Result<T, ReportError>;
