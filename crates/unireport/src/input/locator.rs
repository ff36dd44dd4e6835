//! Source locators and their resolution from configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{AggregationMode, PipelineConfig};

/// Kind of ingestion input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorKind {
    /// A CSV file on the local filesystem.
    LocalPath,
    /// An endpoint that enumerates downloadable CSV files.
    RemoteListing,
    /// A single downloadable CSV file.
    RemoteFile,
}

impl LocatorKind {
    /// Value written to the `source_type` provenance column.
    pub fn provenance(&self) -> &'static str {
        match self {
            LocatorKind::LocalPath => "local",
            LocatorKind::RemoteListing | LocatorKind::RemoteFile => "api",
        }
    }
}

/// One ingestion input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocator {
    pub kind: LocatorKind,
    pub address: String,
}

impl SourceLocator {
    /// Locator for a local file.
    pub fn local(path: impl AsRef<Path>) -> Self {
        Self {
            kind: LocatorKind::LocalPath,
            address: path.as_ref().display().to_string(),
        }
    }

    /// Locator for a listing endpoint.
    pub fn listing(url: impl Into<String>) -> Self {
        Self {
            kind: LocatorKind::RemoteListing,
            address: url.into(),
        }
    }

    /// Locator for a single remote file.
    pub fn remote_file(url: impl Into<String>) -> Self {
        Self {
            kind: LocatorKind::RemoteFile,
            address: url.into(),
        }
    }

    /// File-like name of the source, used for provenance and caching.
    pub fn name(&self) -> String {
        source_name(&self.address)
    }
}

/// Last path segment of a path or URL, without any query string.
pub(crate) fn source_name(address: &str) -> String {
    let without_query = address.split(['?', '#']).next().unwrap_or(address);
    without_query
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(address)
        .to_string()
}

/// Decides which locators to ingest for a configuration.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    mode: AggregationMode,
    base_url: String,
    local_folders: Vec<PathBuf>,
    datasets: Vec<String>,
}

impl SourceResolver {
    /// Create a resolver from pipeline configuration.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            mode: config.mode,
            base_url: config.base_url.clone(),
            local_folders: config.local_folders.clone(),
            datasets: config.datasets.clone(),
        }
    }

    /// Resolve the ordered list of locators.
    ///
    /// In local mode every configured folder contributes its `*.csv` files
    /// sorted by name; a configured file is used as-is and a missing folder
    /// is skipped with a warning. In API mode each dataset becomes a listing
    /// locator on the listing service.
    pub fn resolve(&self) -> Vec<SourceLocator> {
        match self.mode {
            AggregationMode::Local => self.resolve_local(),
            AggregationMode::Api => self.resolve_api(),
        }
    }

    fn resolve_local(&self) -> Vec<SourceLocator> {
        let mut locators = Vec::new();
        for folder in &self.local_folders {
            if folder.is_file() {
                locators.push(SourceLocator::local(folder));
                continue;
            }
            let entries = match std::fs::read_dir(folder) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Folder not found: {} ({})", folder.display(), e);
                    continue;
                }
            };
            let mut files: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| {
                    path.is_file()
                        && path
                            .extension()
                            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
                })
                .collect();
            if files.is_empty() {
                warn!("No CSV files found in {}", folder.display());
                continue;
            }
            files.sort();
            debug!("Found {} CSV files in {}", files.len(), folder.display());
            locators.extend(files.iter().map(SourceLocator::local));
        }
        locators
    }

    fn resolve_api(&self) -> Vec<SourceLocator> {
        let base = self.base_url.trim_end_matches('/');
        self.datasets
            .iter()
            .map(|dataset| SourceLocator::listing(format!("{}/data/{}?format=json", base, dataset)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_source_name() {
        assert_eq!(source_name("data/students/a.csv"), "a.csv");
        assert_eq!(
            source_name("http://host/download/finance/biaya.csv?x=1"),
            "biaya.csv"
        );
        assert_eq!(source_name("http://host/data/students?format=json"), "students");
    }

    #[test]
    fn test_resolve_local_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        let students = dir.path().join("students");
        fs::create_dir(&students).unwrap();
        fs::write(students.join("b.csv"), "x\n1\n").unwrap();
        fs::write(students.join("a.CSV"), "x\n1\n").unwrap();
        fs::write(students.join("notes.txt"), "ignore").unwrap();

        let config = PipelineConfig::default()
            .with_local_folders(vec![students.clone(), dir.path().join("missing")]);
        let locators = SourceResolver::new(&config).resolve();

        let names: Vec<String> = locators.iter().map(SourceLocator::name).collect();
        assert_eq!(names, vec!["a.CSV", "b.csv"]);
        assert!(locators.iter().all(|l| l.kind == LocatorKind::LocalPath));
    }

    #[test]
    fn test_resolve_api_listings() {
        let config = PipelineConfig::default()
            .with_mode(AggregationMode::Api)
            .with_base_url("http://localhost:8000/")
            .with_datasets(vec!["students".into(), "finance".into()]);

        let locators = SourceResolver::new(&config).resolve();

        assert_eq!(
            locators,
            vec![
                SourceLocator::listing("http://localhost:8000/data/students?format=json"),
                SourceLocator::listing("http://localhost:8000/data/finance?format=json"),
            ]
        );
    }
}
