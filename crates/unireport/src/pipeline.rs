//! The end-to-end report pipeline and its output bundle.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::analysis::{AnalysisResult, Analyzer};
use crate::cleaner::{Cleaner, CleaningReport};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::input::{IngestReport, Ingester, RemoteFetcher, SourceLocator, SourceResolver};
use crate::jobs::JobHandle;
use crate::llm::{GeminiProvider, GenerationClient, Sleeper, TextGenerator, TokenUsage};
use crate::report::{DigestFormatter, PromptBuilder, ReportKind};
use crate::validation::{ReportValidator, ValidationResult};

/// Everything one run produced, handed to persistence as a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportBundle {
    pub run_id: Uuid,
    pub report_kind: ReportKind,
    pub narrative: String,
    pub usage: Option<TokenUsage>,
    pub is_fallback: bool,
    pub attempts: u32,
    /// Provider and model that produced the narrative.
    pub generator: String,
    pub analysis: AnalysisResult,
    pub validation: ValidationResult,
    pub cleaning: CleaningReport,
    pub ingest: IngestReport,
    pub generated_at: DateTime<Utc>,
}

/// Runs ingestion, cleaning, analysis, generation and validation.
pub struct ReportPipeline {
    config: PipelineConfig,
    ingester: Ingester,
    cleaner: Cleaner,
    analyzer: Analyzer,
    prompts: PromptBuilder,
    generator: GenerationClient,
    generator_name: String,
    validator: ReportValidator,
}

impl ReportPipeline {
    /// Build a pipeline that generates with Gemini.
    ///
    /// Fails before any network activity when no API key is configured.
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let key = config.require_api_key()?;
        let provider = GeminiProvider::with_config(key, config.llm.clone())?;
        Self::new(config, Arc::new(provider))
    }

    /// Build a pipeline with a custom text generator and an HTTP fetcher.
    pub fn new(config: PipelineConfig, provider: Arc<dyn TextGenerator>) -> Result<Self> {
        let ingester = Ingester::new(&config.cache_dir)?;
        Ok(Self::assemble(config, provider, ingester))
    }

    /// Build a pipeline with a custom text generator and remote fetcher.
    pub fn with_fetcher(
        config: PipelineConfig,
        provider: Arc<dyn TextGenerator>,
        fetcher: impl RemoteFetcher + 'static,
    ) -> Self {
        let ingester = Ingester::with_fetcher(&config.cache_dir, fetcher);
        Self::assemble(config, provider, ingester)
    }

    fn assemble(config: PipelineConfig, provider: Arc<dyn TextGenerator>, ingester: Ingester) -> Self {
        let formatter = Arc::new(DigestFormatter::new());
        let generator_name = format!("{}/{}", provider.name(), config.llm.model);
        let generator = GenerationClient::new(provider, formatter.clone())
            .with_max_attempts(config.llm.max_attempts);

        Self {
            ingester,
            cleaner: Cleaner::new(),
            analyzer: Analyzer::new(),
            prompts: PromptBuilder::new(formatter),
            generator,
            generator_name,
            validator: ReportValidator::new(),
            config,
        }
    }

    /// Replace the sleeper used between generation attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.generator = self.generator.with_sleeper(sleeper);
        self
    }

    /// Replace the narrative validator.
    pub fn with_validator(mut self, validator: ReportValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Configuration this pipeline was built with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Report over every configured source.
    pub fn run_unified(&self, kind: Option<ReportKind>, job: Option<&JobHandle>) -> Result<ReportBundle> {
        let locators = SourceResolver::new(&self.config).resolve();
        info!(
            "Running unified report over {} locator(s) in {} mode",
            locators.len(),
            self.config.mode
        );
        self.run(&locators, self.config.cache, kind, job)
    }

    /// Report over a single local file. Nothing is cached.
    pub fn run_single(
        &self,
        path: impl AsRef<Path>,
        kind: Option<ReportKind>,
        job: Option<&JobHandle>,
    ) -> Result<ReportBundle> {
        let locator = SourceLocator::local(path);
        self.run(std::slice::from_ref(&locator), false, kind, job)
    }

    /// Report over explicit locators.
    ///
    /// When `kind` is `None` it is chosen from the detected dataset type.
    pub fn run(
        &self,
        locators: &[SourceLocator],
        cache: bool,
        kind: Option<ReportKind>,
        job: Option<&JobHandle>,
    ) -> Result<ReportBundle> {
        let progress = |pct: u8, stage: &str| {
            if let Some(job) = job {
                job.stage(pct, stage);
            }
        };

        progress(10, "Loading data");
        let ingested = self.ingester.ingest(locators, cache)?;

        progress(30, "Cleaning data");
        let (table, cleaning) = self.cleaner.clean(ingested.table);

        progress(45, "Analyzing data");
        let analysis = self.analyzer.analyze(&table);
        let report_kind = kind.unwrap_or_else(|| ReportKind::for_detected(analysis.detected_type));

        progress(60, "Generating report");
        let prompt = self.prompts.build(&analysis, report_kind);
        let generated = self.generator.generate(&prompt, &analysis);

        progress(90, "Validating report");
        let validation = self.validator.validate(&generated.text, &analysis);
        info!(
            "Report ready: {} characters, valid={}, fallback={}",
            validation.report_length, validation.is_valid, generated.is_fallback
        );

        Ok(ReportBundle {
            run_id: job.map(JobHandle::id).unwrap_or_else(Uuid::new_v4),
            report_kind,
            narrative: generated.text,
            usage: generated.usage,
            is_fallback: generated.is_fallback,
            attempts: generated.attempts,
            generator: self.generator_name.clone(),
            analysis,
            validation,
            cleaning,
            ingest: ingested.report,
            generated_at: Utc::now(),
        })
    }
}
