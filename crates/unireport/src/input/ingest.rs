//! Multi-source ingestion into one combined table.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::fetch::{HttpFetcher, RemoteFetcher, parse_listing};
use super::locator::{LocatorKind, SourceLocator, source_name};
use super::parser::Parser;
use super::source::{DataTable, SourceMetadata};
use crate::error::{ReportError, Result};

/// Provenance column holding the origin kind.
pub const SOURCE_TYPE_COLUMN: &str = "source_type";
/// Provenance column holding the originating file name.
pub const SOURCE_FILE_COLUMN: &str = "source_file";

/// Why a source contributed no table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The source parsed to zero rows.
    EmptyDataset,
    /// A listing endpoint advertised no files.
    NoLinks,
}

/// Outcome of loading one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Loaded { metadata: SourceMetadata },
    Skipped { source: String, reason: SkipReason },
    Failed { source: String, error: String },
}

/// Per-source outcomes of one ingest, in locator order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub outcomes: Vec<SourceOutcome>,
}

impl IngestReport {
    /// Metadata of every loaded source.
    pub fn loaded(&self) -> impl Iterator<Item = &SourceMetadata> {
        self.outcomes.iter().filter_map(|o| match o {
            SourceOutcome::Loaded { metadata } => Some(metadata),
            _ => None,
        })
    }

    /// Number of skipped sources.
    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, SourceOutcome::Skipped { .. }))
            .count()
    }

    /// Human-readable failure lines.
    pub fn failures(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                SourceOutcome::Failed { source, error } => Some(format!("{}: {}", source, error)),
                _ => None,
            })
            .collect()
    }
}

/// Combined table plus the per-source report.
#[derive(Debug, Clone)]
pub struct IngestOutput {
    pub table: DataTable,
    pub report: IngestReport,
}

/// Result of loading a single source, before merging.
enum SourceLoad {
    Loaded(DataTable, SourceMetadata),
    Skipped(String, SkipReason),
    Failed(String, ReportError),
}

/// Loads sources and concatenates them.
pub struct Ingester {
    parser: Parser,
    fetcher: Box<dyn RemoteFetcher>,
    cache_dir: PathBuf,
}

impl Ingester {
    /// Create an ingester with an HTTP fetcher.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::with_fetcher(cache_dir, HttpFetcher::new()?))
    }

    /// Create an ingester with a custom remote fetcher.
    pub fn with_fetcher(cache_dir: impl Into<PathBuf>, fetcher: impl RemoteFetcher + 'static) -> Self {
        Self {
            parser: Parser::new(),
            fetcher: Box::new(fetcher),
            cache_dir: cache_dir.into(),
        }
    }

    /// Use a custom parser.
    pub fn with_parser(mut self, parser: Parser) -> Self {
        self.parser = parser;
        self
    }

    /// Load every locator in order and combine the results.
    ///
    /// Fails only when no source produced a table.
    pub fn ingest(&self, locators: &[SourceLocator], cache: bool) -> Result<IngestOutput> {
        let mut tables = Vec::new();
        let mut report = IngestReport::default();

        for locator in locators {
            for load in self.load(locator) {
                match load {
                    SourceLoad::Loaded(mut table, metadata) => {
                        info!("Loaded {} ({} rows)", metadata.name, metadata.row_count);
                        table.set_constant_column(SOURCE_TYPE_COLUMN, locator.kind.provenance());
                        table.set_constant_column(SOURCE_FILE_COLUMN, &metadata.name);
                        if cache {
                            self.write_cache(&table, &metadata.name);
                        }
                        tables.push(table);
                        report.outcomes.push(SourceOutcome::Loaded { metadata });
                    }
                    SourceLoad::Skipped(source, reason) => {
                        warn!("Skipping {}: {:?}", source, reason);
                        report.outcomes.push(SourceOutcome::Skipped { source, reason });
                    }
                    SourceLoad::Failed(source, error) => {
                        warn!("Failed to load {}: {}", source, error);
                        report.outcomes.push(SourceOutcome::Failed {
                            source,
                            error: error.to_string(),
                        });
                    }
                }
            }
        }

        if tables.is_empty() {
            let mut failures = report.failures();
            failures.extend(report.outcomes.iter().filter_map(|o| match o {
                SourceOutcome::Skipped { source, reason } => {
                    Some(format!("{}: skipped ({:?})", source, reason))
                }
                _ => None,
            }));
            return Err(ReportError::NoDataIngested { failures });
        }

        let table = DataTable::concat(tables);
        info!(
            "Combined {} rows x {} columns from {} source(s)",
            table.row_count(),
            table.column_count(),
            report.loaded().count()
        );
        Ok(IngestOutput { table, report })
    }

    fn load(&self, locator: &SourceLocator) -> Vec<SourceLoad> {
        match locator.kind {
            LocatorKind::LocalPath => vec![self.load_local(&locator.address)],
            LocatorKind::RemoteFile => vec![self.load_remote(&locator.name(), &locator.address)],
            LocatorKind::RemoteListing => self.load_listing(locator),
        }
    }

    fn load_local(&self, path: &str) -> SourceLoad {
        let name = source_name(path);
        match self.parser.parse_file(Path::new(path)) {
            Ok((table, metadata)) => Self::accept(table, metadata),
            Err(e) => SourceLoad::Failed(
                name.clone(),
                ReportError::SourceRead {
                    source_name: name,
                    reason: e.to_string(),
                },
            ),
        }
    }

    fn load_remote(&self, name: &str, url: &str) -> SourceLoad {
        let parsed = self
            .fetcher
            .fetch(url)
            .and_then(|bytes| self.parser.parse_source(&bytes, name, url));
        match parsed {
            Ok((table, metadata)) => Self::accept(table, metadata),
            Err(e) => SourceLoad::Failed(
                name.to_string(),
                ReportError::SourceRead {
                    source_name: name.to_string(),
                    reason: e.to_string(),
                },
            ),
        }
    }

    fn load_listing(&self, locator: &SourceLocator) -> Vec<SourceLoad> {
        let listing_name = locator.name();
        let body = match self.fetcher.fetch(&locator.address) {
            Ok(body) => body,
            Err(e) => {
                return vec![SourceLoad::Failed(
                    listing_name.clone(),
                    ReportError::SourceRead {
                        source_name: listing_name,
                        reason: e.to_string(),
                    },
                )];
            }
        };

        let entries = parse_listing(&body, &locator.address);
        if entries.is_empty() {
            return vec![SourceLoad::Skipped(listing_name, SkipReason::NoLinks)];
        }
        debug!("Listing {} advertises {} file(s)", listing_name, entries.len());

        entries
            .iter()
            .map(|entry| self.load_remote(&entry.filename, &entry.url))
            .collect()
    }

    fn accept(table: DataTable, metadata: SourceMetadata) -> SourceLoad {
        if table.is_empty() {
            SourceLoad::Skipped(metadata.name, SkipReason::EmptyDataset)
        } else {
            SourceLoad::Loaded(table, metadata)
        }
    }

    /// Write a cached copy. Failures are logged, never fatal.
    fn write_cache(&self, table: &DataTable, name: &str) {
        let Some(file_name) = cache_file_name(name) else {
            warn!("Not caching {:?}: no usable file name", name);
            return;
        };
        let path = self.cache_dir.join(file_name);
        match write_table(table, &path) {
            Ok(()) => debug!("Cached {}", path.display()),
            Err(e) => warn!("Could not cache {}: {}", path.display(), e),
        }
    }
}

/// Cache file name for a source, confined to one path component.
///
/// Listing entries are remote input, so directories, `..` and absolute
/// paths are reduced to their final component or rejected.
fn cache_file_name(name: &str) -> Option<String> {
    let base = source_name(name);
    let component = Path::new(&base).file_name()?.to_str()?.trim();
    if component.is_empty() || component == "." || component == ".." {
        return None;
    }
    if component.to_lowercase().ends_with(".csv") {
        Some(component.to_string())
    } else {
        Some(format!("{}.csv", component))
    }
}

/// Write a table as comma-separated CSV, overwriting `path`.
pub fn write_table(table: &DataTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    writer.flush().map_err(|e| ReportError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    struct MapFetcher(HashMap<String, Vec<u8>>);

    impl RemoteFetcher for MapFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| ReportError::Http(format!("GET {} returned 404 Not Found", url)))
        }
    }

    fn local_ingester(dir: &Path) -> Ingester {
        Ingester::with_fetcher(dir.join("cache"), MapFetcher(HashMap::new()))
    }

    #[test]
    fn test_local_sources_with_empty_skip() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        fs::write(&a, "nama,ipk\nAhmad,3.5\nBudi,3.1\n").unwrap();
        fs::write(&b, "nama,ipk\n").unwrap();

        let output = local_ingester(dir.path())
            .ingest(&[SourceLocator::local(&a), SourceLocator::local(&b)], false)
            .unwrap();

        assert_eq!(output.table.row_count(), 2);
        assert_eq!(output.report.skipped_count(), 1);
        assert_eq!(
            output.table.headers,
            vec!["nama", "ipk", SOURCE_TYPE_COLUMN, SOURCE_FILE_COLUMN]
        );
        let file_idx = output.table.column_index(SOURCE_FILE_COLUMN).unwrap();
        assert_eq!(output.table.get(0, file_idx).unwrap().to_string(), "a.csv");
    }

    #[test]
    fn test_missing_file_is_recorded_not_fatal() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.csv");
        fs::write(&a, "x\n1\n").unwrap();

        let output = local_ingester(dir.path())
            .ingest(
                &[SourceLocator::local(dir.path().join("gone.csv")), SourceLocator::local(&a)],
                false,
            )
            .unwrap();

        assert_eq!(output.table.row_count(), 1);
        assert_eq!(output.report.failures().len(), 1);
        assert!(output.report.failures()[0].starts_with("gone.csv"));
    }

    #[test]
    fn test_no_tables_is_error() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty.csv");
        fs::write(&empty, "x,y\n").unwrap();

        let result = local_ingester(dir.path()).ingest(&[SourceLocator::local(&empty)], false);

        match result {
            Err(ReportError::NoDataIngested { failures }) => assert_eq!(failures.len(), 1),
            other => panic!("expected NoDataIngested, got {:?}", other.map(|o| o.report)),
        }
    }

    #[test]
    fn test_listing_with_failed_link() {
        let dir = TempDir::new().unwrap();
        let mut responses = HashMap::new();
        responses.insert(
            "http://svc/data/finance?format=json".to_string(),
            br#"[{"filename":"biaya.csv","url":"/download/finance/biaya.csv"},
                 {"filename":"hilang.csv","url":"/download/finance/hilang.csv"}]"#
                .to_vec(),
        );
        responses.insert(
            "http://svc/download/finance/biaya.csv".to_string(),
            b"biaya;tahun\n1000;2023\n2000;2024\n".to_vec(),
        );

        let ingester = Ingester::with_fetcher(dir.path().join("cache"), MapFetcher(responses));
        let output = ingester
            .ingest(&[SourceLocator::listing("http://svc/data/finance?format=json")], true)
            .unwrap();

        assert_eq!(output.table.row_count(), 2);
        assert_eq!(output.report.failures().len(), 1);
        let type_idx = output.table.column_index(SOURCE_TYPE_COLUMN).unwrap();
        assert_eq!(output.table.get(0, type_idx).unwrap().to_string(), "api");

        let cached = fs::read_to_string(dir.path().join("cache").join("biaya.csv")).unwrap();
        assert!(cached.starts_with("biaya,tahun,source_type,source_file"));
    }

    #[test]
    fn test_cache_stays_inside_cache_dir() {
        let dir = TempDir::new().unwrap();
        let mut responses = HashMap::new();
        responses.insert(
            "http://svc/data/finance?format=json".to_string(),
            br#"[{"filename":"../escaped.csv","url":"/download/finance/a.csv"}]"#.to_vec(),
        );
        responses.insert(
            "http://svc/download/finance/a.csv".to_string(),
            b"biaya,tahun\n1000,2023\n".to_vec(),
        );

        let ingester = Ingester::with_fetcher(dir.path().join("cache"), MapFetcher(responses));
        ingester
            .ingest(&[SourceLocator::listing("http://svc/data/finance?format=json")], true)
            .unwrap();

        assert!(!dir.path().join("escaped.csv").exists());
        assert!(dir.path().join("cache").join("escaped.csv").exists());
    }

    #[test]
    fn test_cache_file_name() {
        assert_eq!(cache_file_name("biaya.csv").as_deref(), Some("biaya.csv"));
        assert_eq!(cache_file_name("../../x.csv").as_deref(), Some("x.csv"));
        assert_eq!(cache_file_name("/etc/passwd").as_deref(), Some("passwd.csv"));
        assert_eq!(cache_file_name("..\\win.CSV").as_deref(), Some("win.CSV"));
        assert_eq!(cache_file_name("students"), Some("students.csv".to_string()));
        assert_eq!(cache_file_name(".."), None);
        assert_eq!(cache_file_name(""), None);
    }

    #[test]
    fn test_listing_without_links_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut responses = HashMap::new();
        responses.insert("http://svc/data/students?format=json".to_string(), b"[]".to_vec());
        let a = dir.path().join("a.csv");
        fs::write(&a, "x\n1\n").unwrap();

        let ingester = Ingester::with_fetcher(dir.path().join("cache"), MapFetcher(responses));
        let output = ingester
            .ingest(
                &[
                    SourceLocator::listing("http://svc/data/students?format=json"),
                    SourceLocator::local(&a),
                ],
                false,
            )
            .unwrap();

        assert!(matches!(
            output.report.outcomes[0],
            SourceOutcome::Skipped { reason: SkipReason::NoLinks, .. }
        ));
    }
}
