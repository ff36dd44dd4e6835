//! unireport: narrative reports over university data.
//!
//! Tabular data (student records, financial ledgers, accreditation scores)
//! is ingested from local folders or a remote listing service, merged,
//! cleaned and summarized. A text generation model then writes a narrative
//! report, which is checked against the data for unsupported claims.
//!
//! # Pipeline
//!
//! - **Ingest**: resolve sources, parse CSVs, tag provenance, concatenate
//! - **Clean**: deduplicate, drop empty columns, coerce decimal commas, impute
//! - **Analyze**: detect the domain, compute numeric and categorical summaries
//! - **Generate**: prompt the model with bounded retries, fall back to a template
//! - **Validate**: flag short, hedging or numerically inconsistent narratives
//!
//! # Example
//!
//! ```no_run
//! use unireport::{PipelineConfig, ReportPipeline, ReportStore};
//!
//! let config = PipelineConfig::from_env().unwrap();
//! let pipeline = ReportPipeline::from_config(config).unwrap();
//! let bundle = pipeline.run_unified(None, None).unwrap();
//!
//! ReportStore::new("output").save(&bundle).unwrap();
//! println!("Valid: {}", bundle.validation.is_valid);
//! ```

pub mod analysis;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod input;
pub mod jobs;
pub mod llm;
pub mod output;
pub mod report;
pub mod validation;

mod pipeline;

pub use crate::pipeline::{ReportBundle, ReportPipeline};
pub use analysis::{AnalysisResult, Analyzer, DetectedType, TypeDetector};
pub use cleaner::{Cleaner, CleaningReport};
pub use config::{AggregationMode, LlmConfig, PipelineConfig};
pub use error::{ReportError, Result};
pub use input::{DataTable, IngestReport, Ingester, SourceLocator, SourceMetadata, SourceResolver};
pub use jobs::{JobHandle, JobRegistry, JobState, JobStatus};
pub use llm::{GeminiProvider, GenerationClient, GenerationResult, MockProvider, TextGenerator};
pub use output::{ReportEntry, ReportStore, SavedReport};
pub use report::{DigestFormatter, PromptBuilder, ReportKind};
pub use validation::{ReportValidator, ValidationResult};
