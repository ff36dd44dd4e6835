//! End-to-end tests for the report pipeline.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use unireport::input::{RemoteFetcher, SourceOutcome};
use unireport::llm::RecordingSleeper;
use unireport::report::fallback_report;
use unireport::{
    AggregationMode, DetectedType, DigestFormatter, Ingester, JobRegistry, JobState,
    MockProvider, PipelineConfig, ReportError, ReportKind, ReportPipeline, ReportStore,
    SourceResolver,
};

/// Serves canned bodies keyed by URL; anything else is a 404.
struct MapFetcher(HashMap<String, Vec<u8>>);

impl MapFetcher {
    fn new() -> Self {
        Self(HashMap::new())
    }

    fn with(mut self, url: &str, body: &str) -> Self {
        self.0.insert(url.to_string(), body.as_bytes().to_vec());
        self
    }
}

impl RemoteFetcher for MapFetcher {
    fn fetch(&self, url: &str) -> unireport::Result<Vec<u8>> {
        self.0
            .get(url)
            .cloned()
            .ok_or_else(|| ReportError::Http(format!("GET {} returned 404 Not Found", url)))
    }
}

fn student_csv(rows: usize, offset: usize) -> String {
    let mut csv = String::from("NIM,Nama,IPK\n");
    for i in 0..rows {
        let n = offset + i;
        csv.push_str(&format!("{},Mahasiswa {},{:.2}\n", 2000 + n, n, 2.5 + (n % 10) as f64 * 0.1));
    }
    csv
}

fn long_narrative(body: &str) -> String {
    format!(
        "# Laporan Performa Mahasiswa\n\n{}\n\n{}",
        body,
        "Rata-rata IPK berada pada kisaran yang baik dan stabil antar angkatan. ".repeat(5)
    )
}

fn local_config(dir: &Path, folders: &[&str]) -> PipelineConfig {
    PipelineConfig::default()
        .with_local_folders(folders.iter().map(|f| dir.join(f)).collect())
        .with_cache_dir(dir.join("cache"))
        .with_cache(false)
}

fn pipeline(config: PipelineConfig, provider: Arc<MockProvider>) -> ReportPipeline {
    ReportPipeline::with_fetcher(config, provider, MapFetcher::new())
        .with_sleeper(Arc::new(RecordingSleeper::new()))
}

// =============================================================================
// Ingestion
// =============================================================================

#[test]
fn test_three_sources_with_one_empty() {
    let dir = TempDir::new().unwrap();
    let students = dir.path().join("students");
    fs::create_dir(&students).unwrap();
    fs::write(students.join("a.csv"), student_csv(10, 0)).unwrap();
    fs::write(students.join("b.csv"), "NIM,Nama,IPK\n").unwrap();
    fs::write(students.join("c.csv"), student_csv(5, 100)).unwrap();

    let config = local_config(dir.path(), &["students"]);
    let locators = SourceResolver::new(&config).resolve();
    assert_eq!(locators.len(), 3);

    let output = Ingester::with_fetcher(dir.path().join("cache"), MapFetcher::new())
        .ingest(&locators, false)
        .unwrap();

    assert_eq!(output.table.row_count(), 15);
    assert_eq!(output.report.skipped_count(), 1);
    assert_eq!(output.report.loaded().count(), 2);
    assert!(output.report.loaded().all(|m| m.hash.starts_with("sha256:")));
}

#[test]
fn test_all_sources_empty_is_fatal() {
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("finance");
    fs::create_dir(&folder).unwrap();
    fs::write(folder.join("kosong.csv"), "biaya,tahun\n").unwrap();

    let result = pipeline(
        local_config(dir.path(), &["finance"]),
        Arc::new(MockProvider::new()),
    )
    .run_unified(None, None);

    assert!(matches!(result, Err(ReportError::NoDataIngested { .. })));
}

#[test]
fn test_api_mode_listing_and_cache() {
    let dir = TempDir::new().unwrap();
    let fetcher = MapFetcher::new()
        .with(
            "http://svc/data/finance?format=json",
            r#"[{"filename": "biaya.csv", "url": "/download/finance/biaya.csv"}]"#,
        )
        .with(
            "http://svc/download/finance/biaya.csv",
            "Kategori;Pemasukan (Rp)\nSPP;1000,5\nBeasiswa;250,0\n",
        );
    let config = PipelineConfig::default()
        .with_mode(AggregationMode::Api)
        .with_base_url("http://svc")
        .with_datasets(vec!["finance".into(), "students".into()])
        .with_cache_dir(dir.path().join("cache"));

    let bundle = ReportPipeline::with_fetcher(config, Arc::new(MockProvider::new()), fetcher)
        .run_unified(None, None)
        .unwrap();

    assert_eq!(bundle.analysis.row_count, 2);
    assert_eq!(bundle.analysis.detected_type, DetectedType::Finance);
    assert_eq!(bundle.report_kind, ReportKind::FinancialAnalysis);
    assert!(bundle.analysis.numeric_stats.contains_key("Pemasukan (Rp)"));
    // the students listing 404s and is recorded, not fatal
    assert!(matches!(bundle.ingest.outcomes[1], SourceOutcome::Failed { .. }));
    assert!(dir.path().join("cache").join("biaya.csv").exists());
}

// =============================================================================
// Cleaning and analysis
// =============================================================================

#[test]
fn test_decimal_comma_file_is_numeric() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("nilai.csv");
    fs::write(&file, "Nama;Nilai;Kota\nAhmad;3,5;Bandung\nBudi;4,0;Medan\nCitra;2,1;x1\n").unwrap();

    let bundle = pipeline(local_config(dir.path(), &[]), Arc::new(MockProvider::new()))
        .run_single(&file, None, None)
        .unwrap();

    assert_eq!(bundle.cleaning.columns_coerced, vec!["Nilai"]);
    let stats = &bundle.analysis.numeric_stats["Nilai"];
    assert!((stats.mean - (3.5 + 4.0 + 2.1) / 3.0).abs() < 1e-9);
    assert_eq!(stats.median, 3.5);
    assert!(bundle.analysis.categorical.contains_key("Kota"));
}

// =============================================================================
// Generation and validation
// =============================================================================

#[test]
fn test_unified_report_with_mock_provider() {
    let dir = TempDir::new().unwrap();
    let students = dir.path().join("students");
    fs::create_dir(&students).unwrap();
    fs::write(students.join("angkatan_2023.csv"), student_csv(8, 0)).unwrap();

    let provider = Arc::new(
        MockProvider::new().with_response(long_narrative("Terdapat 8 mahasiswa dalam data ini.")),
    );
    let bundle = pipeline(local_config(dir.path(), &["students"]), provider.clone())
        .run_unified(None, None)
        .unwrap();

    assert_eq!(bundle.report_kind, ReportKind::StudentPerformance);
    assert!(!bundle.is_fallback);
    assert!(bundle.validation.is_valid, "issues: {:?}", bundle.validation.issues);
    assert_eq!(provider.calls(), 1);

    let prompt = &provider.prompts()[0];
    assert!(prompt.contains("- Total records: 8"));
    assert!(prompt.contains("RINGKASAN EKSEKUTIF"));
    // identifier columns are not summarized for student data
    assert!(!prompt.contains("\nNIM:"));
}

#[test]
fn test_numeric_mismatch_is_flagged() {
    let dir = TempDir::new().unwrap();
    let students = dir.path().join("students");
    fs::create_dir(&students).unwrap();
    fs::write(students.join("mhs.csv"), student_csv(120, 0)).unwrap();

    let provider = Arc::new(
        MockProvider::new().with_response(long_narrative("Jumlah mahasiswa: 200 orang terdaftar.")),
    );
    let bundle = pipeline(local_config(dir.path(), &["students"]), provider)
        .run_unified(Some(ReportKind::StudentPerformance), None)
        .unwrap();

    assert_eq!(bundle.analysis.row_count, 120);
    assert!(!bundle.validation.is_valid);
    assert!(
        bundle
            .validation
            .issues
            .iter()
            .any(|i| i.contains("200") && i.contains("120"))
    );
}

#[test]
fn test_exhausted_generation_uses_fallback() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("mhs.csv");
    fs::write(&file, student_csv(4, 0)).unwrap();

    let provider = Arc::new(MockProvider::failing());
    let sleeper = Arc::new(RecordingSleeper::new());
    let bundle = ReportPipeline::with_fetcher(local_config(dir.path(), &[]), provider.clone(), MapFetcher::new())
        .with_sleeper(sleeper.clone())
        .run_single(&file, None, None)
        .unwrap();

    assert!(bundle.is_fallback);
    assert_eq!(bundle.usage, None);
    assert_eq!(
        bundle.narrative,
        fallback_report(&DigestFormatter::new().format(&bundle.analysis))
    );
    assert_eq!(provider.calls(), 3);
    assert_eq!(sleeper.delays(), vec![Duration::from_secs(1), Duration::from_secs(2)]);
}

#[test]
fn test_missing_api_key_fails_before_network() {
    let config = PipelineConfig::default();
    assert!(matches!(
        ReportPipeline::from_config(config),
        Err(ReportError::Config(_))
    ));
}

// =============================================================================
// Persistence and jobs
// =============================================================================

#[test]
fn test_save_and_list_reports() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("mhs.csv");
    fs::write(&file, student_csv(3, 0)).unwrap();

    let bundle = pipeline(local_config(dir.path(), &[]), Arc::new(MockProvider::new()))
        .run_single(&file, Some(ReportKind::General), None)
        .unwrap();

    let store = ReportStore::new(dir.path().join("output"));
    let first = store.save(&bundle).unwrap();
    let second = store.save(&bundle).unwrap();

    assert_ne!(first.report_path, second.report_path);
    let name = first.report_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("general_") && name.ends_with(".md"));

    let sidecar: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&first.metadata_path).unwrap()).unwrap();
    assert!(sidecar.get("saved_at").is_some());
    assert_eq!(sidecar["analysis"]["row_count"], 3);
    assert_eq!(sidecar["report_kind"], "general");

    assert_eq!(store.list().unwrap().len(), 2);
    assert!(ReportStore::new(dir.path().join("missing")).list().unwrap().is_empty());
}

#[test]
fn test_background_runs_report_status() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("mhs.csv");
    fs::write(&file, student_csv(6, 0)).unwrap();

    let registry = JobRegistry::new();
    let pipeline = Arc::new(pipeline(
        local_config(dir.path(), &[]),
        Arc::new(MockProvider::new()),
    ));
    let output_dir = dir.path().join("output");

    let run_pipeline = pipeline.clone();
    let run_file = file.clone();
    let (ok_id, ok_join) = registry.spawn(move |job| {
        let bundle = run_pipeline.run_single(&run_file, None, Some(job))?;
        let saved = ReportStore::new(output_dir).save(&bundle)?;
        Ok(saved.report_path.display().to_string())
    });

    let missing = dir.path().join("gone.csv");
    let (err_id, err_join) = registry.spawn(move |job| {
        pipeline.run_single(&missing, None, Some(job)).map(|_| String::new())
    });

    ok_join.join().unwrap();
    err_join.join().unwrap();

    let ok = registry.status(ok_id).unwrap();
    assert_eq!(ok.state, JobState::Completed);
    assert_eq!(ok.progress, 100);

    let err = registry.status(err_id).unwrap();
    assert!(matches!(err.state, JobState::Error(_)));
    assert_eq!(err.progress, 10);
}
