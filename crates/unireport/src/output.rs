//! Persisting report bundles and listing saved reports.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::{ReportError, Result};
use crate::pipeline::ReportBundle;

/// Paths written for one saved report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    pub report_path: PathBuf,
    pub metadata_path: PathBuf,
}

/// One previously saved report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub file_name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct Sidecar<'a> {
    saved_at: DateTime<Utc>,
    report_file: &'a str,
    #[serde(flatten)]
    bundle: &'a ReportBundle,
}

/// Writes narratives and metadata sidecars into one directory.
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `<kind>_<timestamp>.md` and `<kind>_<timestamp>_metadata.json`.
    ///
    /// A run id suffix is added when a report with the same name exists.
    pub fn save(&self, bundle: &ReportBundle) -> Result<SavedReport> {
        fs::create_dir_all(&self.dir).map_err(|e| self.persist_error(&self.dir, e))?;

        let mut stem = format!(
            "{}_{}",
            bundle.report_kind,
            bundle.generated_at.format("%Y%m%d_%H%M%S")
        );
        if self.dir.join(format!("{}.md", stem)).exists() {
            let run = bundle.run_id.simple().to_string();
            stem = format!("{}_{}", stem, &run[..8]);
        }

        let report_name = format!("{}.md", stem);
        let report_path = self.dir.join(&report_name);
        let metadata_path = self.dir.join(format!("{}_metadata.json", stem));

        fs::write(&report_path, &bundle.narrative).map_err(|e| self.persist_error(&report_path, e))?;

        let sidecar = Sidecar {
            saved_at: Utc::now(),
            report_file: &report_name,
            bundle,
        };
        let json = serde_json::to_string_pretty(&sidecar)?;
        fs::write(&metadata_path, json).map_err(|e| self.persist_error(&metadata_path, e))?;

        info!("Saved report to {}", report_path.display());
        Ok(SavedReport {
            report_path,
            metadata_path,
        })
    }

    /// Saved narratives, newest first. A missing directory lists nothing.
    pub fn list(&self) -> Result<Vec<ReportEntry>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ReportError::Io {
                    path: self.dir.clone(),
                    source: e,
                });
            }
        };

        let mut reports: Vec<ReportEntry> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
            .filter_map(|path| {
                let meta = fs::metadata(&path).ok()?;
                Some(ReportEntry {
                    file_name: path.file_name()?.to_string_lossy().into_owned(),
                    size_bytes: meta.len(),
                    modified: meta.modified().ok().map(DateTime::<Utc>::from),
                    path,
                })
            })
            .collect();

        reports.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.file_name.cmp(&a.file_name)));
        Ok(reports)
    }

    fn persist_error(&self, path: &Path, e: std::io::Error) -> ReportError {
        ReportError::Persist {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    }
}
