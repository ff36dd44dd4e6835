//! Domain detection and descriptive statistics.

mod analyzer;
mod detector;
mod stats;

pub use analyzer::{AnalysisResult, Analyzer, EntityKind, EntitySet, EntityTotal};
pub use detector::{DetectedType, KeywordFamily, TypeDetector, detect_type};
pub use stats::{CategoricalSummary, NumericStats};
