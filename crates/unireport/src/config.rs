//! Pipeline configuration.
//!
//! Configuration is an explicit value handed to each component's
//! constructor. [`PipelineConfig::from_env`] is the only place that reads the
//! process environment.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// Environment variable holding the generation API credential.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Where source tables come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// CSV files under local folders.
    #[default]
    Local,
    /// Dataset listings served by the remote listing service.
    Api,
}

impl FromStr for AggregationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(AggregationMode::Local),
            "api" => Ok(AggregationMode::Api),
            other => Err(format!("Unknown aggregation mode: {}. Use local or api.", other)),
        }
    }
}

impl std::fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationMode::Local => write!(f, "local"),
            AggregationMode::Api => write!(f, "api"),
        }
    }
}

/// Configuration for the text generation provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model to use (e.g., "gemini-2.5-flash").
    pub model: String,

    /// Maximum tokens in response.
    pub max_tokens: usize,

    /// Temperature for generation (0.0-1.0).
    pub temperature: f64,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum number of generation attempts before falling back.
    pub max_attempts: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            max_tokens: 8192,
            temperature: 0.7,
            timeout_secs: 30,
            max_attempts: 3,
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Aggregation mode.
    pub mode: AggregationMode,
    /// Base URL of the dataset listing service.
    pub base_url: String,
    /// Local folders (or individual files) to ingest in local mode.
    pub local_folders: Vec<PathBuf>,
    /// Dataset names to request in API mode.
    pub datasets: Vec<String>,
    /// Directory for cached source copies.
    pub cache_dir: PathBuf,
    /// Whether to cache ingested sources.
    pub cache: bool,
    /// Generation provider settings.
    pub llm: LlmConfig,
    /// Generation API credential.
    pub api_key: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let datasets: Vec<String> = ["students", "finance", "akreditasi"]
            .into_iter()
            .map(String::from)
            .collect();
        Self {
            mode: AggregationMode::Local,
            base_url: "http://127.0.0.1:8000".to_string(),
            local_folders: datasets.iter().map(|d| Path::new("data").join(d)).collect(),
            datasets,
            cache_dir: PathBuf::from("data/cache"),
            cache: true,
            llm: LlmConfig::default(),
            api_key: None,
        }
    }
}

impl PipelineConfig {
    /// Build configuration from environment variables over the defaults.
    ///
    /// Recognized variables: `AGGREGATION_MODE`, `DATA_API_BASE_URL`,
    /// `DATA_FOLDERS` and `DATASETS` (comma-separated), `CACHE_DIR`,
    /// `GEMINI_MODEL`, `MAX_RETRIES` and `GEMINI_API_KEY`. When the key is
    /// not set it is looked up in a `.env` file in the working directory.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(mode) = std::env::var("AGGREGATION_MODE") {
            config.mode = mode.parse().map_err(ReportError::Config)?;
        }
        if let Ok(url) = std::env::var("DATA_API_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(folders) = std::env::var("DATA_FOLDERS") {
            config.local_folders = split_list(&folders).map(PathBuf::from).collect();
        }
        if let Ok(datasets) = std::env::var("DATASETS") {
            config.datasets = split_list(&datasets).map(String::from).collect();
        }
        if let Ok(dir) = std::env::var("CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.llm.model = model;
        }
        if let Ok(retries) = std::env::var("MAX_RETRIES") {
            config.llm.max_attempts = retries.trim().parse().map_err(|_| {
                ReportError::Config(format!("MAX_RETRIES must be a positive integer, got '{}'", retries))
            })?;
        }

        config.api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| read_env_file(Path::new(".env"), API_KEY_VAR));

        Ok(config)
    }

    /// Set the aggregation mode.
    pub fn with_mode(mut self, mode: AggregationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the listing service base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the local folders to scan.
    pub fn with_local_folders(mut self, folders: Vec<PathBuf>) -> Self {
        self.local_folders = folders;
        self
    }

    /// Set the remote datasets to request.
    pub fn with_datasets(mut self, datasets: Vec<String>) -> Self {
        self.datasets = datasets;
        self
    }

    /// Set the cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Enable or disable source caching.
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Set the generation API credential.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set generation settings.
    pub fn with_llm(mut self, llm: LlmConfig) -> Self {
        self.llm = llm;
        self
    }

    /// Return the API credential or fail before any network activity.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            ReportError::Config(format!(
                "{} not found. Set the environment variable or add `{}=<key>` to a .env file",
                API_KEY_VAR, API_KEY_VAR
            ))
        })
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Look up `key` in a dotenv-style file. Missing files yield `None`.
fn read_env_file(path: &Path, key: &str) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .find(|(k, _)| k.trim() == key)
        .map(|(_, v)| v.trim().trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
}
