//! Cleaning, analysis and validation benchmarks.
//!
//! Measures the local stages of a report run; generation is mocked.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use unireport::input::Parser;
use unireport::{Analyzer, Cleaner, MockProvider, PipelineConfig, ReportPipeline, ReportValidator};

/// Generate a student roster with duplicates, gaps and decimal commas.
fn generate_student_data(rows: usize) -> String {
    let mut rng = StdRng::seed_from_u64(7);
    let prodi = ["Informatika", "Hukum", "Kedokteran", "Manajemen", "Akuntansi"];
    let mut data = String::from("NIM;Nama;Prodi;Angkatan;IPK;SKS\n");

    for row in 0..rows {
        // roughly one row in twenty repeats the previous NIM
        let nim = if row > 0 && rng.gen_ratio(1, 20) { row - 1 } else { row };
        let ipk = if rng.gen_ratio(1, 25) {
            String::new()
        } else {
            format!("{:.2}", rng.gen_range(2.0..4.0)).replace('.', ",")
        };
        data.push_str(&format!(
            "{};Mahasiswa {};{};{};{};{}\n",
            20_000 + nim,
            nim,
            prodi[nim % prodi.len()],
            2019 + nim % 5,
            ipk,
            rng.gen_range(18..24)
        ));
    }

    data
}

fn write_temp(data: &str) -> NamedTempFile {
    let mut temp = NamedTempFile::with_suffix(".csv").unwrap();
    temp.write_all(data.as_bytes()).unwrap();
    temp
}

fn bench_clean_and_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("clean_and_analyze");

    for rows in [100, 1_000, 10_000].iter() {
        let data = generate_student_data(*rows);
        let table = Parser::new().parse_bytes(data.as_bytes(), b';').unwrap();

        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("clean", rows), &table, |b, table| {
            b.iter_with_setup(|| table.clone(), |t| black_box(Cleaner::new().clean(t)))
        });

        let (cleaned, _) = Cleaner::new().clean(table);
        group.bench_with_input(BenchmarkId::new("analyze", rows), &cleaned, |b, table| {
            b.iter(|| black_box(Analyzer::new().analyze(table)))
        });
    }

    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let data = generate_student_data(500);
    let table = Parser::new().parse_bytes(data.as_bytes(), b';').unwrap();
    let (cleaned, _) = Cleaner::new().clean(table);
    let analysis = Analyzer::new().analyze(&cleaned);

    let narrative = "Terdapat 500 mahasiswa pada Program Studi Informatika dan Prodi Hukum. \
                     Rata-rata IPK 3,12 dengan median 3,10. "
        .repeat(40);

    c.bench_function("validate_narrative", |b| {
        let validator = ReportValidator::new();
        b.iter(|| black_box(validator.validate(&narrative, &analysis)))
    });
}

fn bench_single_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_report");
    group.sample_size(20);

    for rows in [100, 5_000].iter() {
        let temp = write_temp(&generate_student_data(*rows));
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::default().with_cache_dir(dir.path());
        let pipeline = ReportPipeline::new(config, Arc::new(MockProvider::new())).unwrap();

        group.bench_with_input(BenchmarkId::new("mock_rows", rows), temp.path(), |b, path| {
            b.iter(|| black_box(pipeline.run_single(path, None, None).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_clean_and_analyze, bench_validation, bench_single_report);
criterion_main!(benches);
