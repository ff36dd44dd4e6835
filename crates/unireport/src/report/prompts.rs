//! Report-kind instruction templates, prompt assembly and the fallback narrative.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::digest::DigestFormatter;
use crate::analysis::{AnalysisResult, DetectedType};

/// Line every fallback narrative carries so readers can tell it apart from
/// a generated one.
pub const FALLBACK_MARKER: &str =
    "Laporan ini dibuat menggunakan template fallback karena terjadi kesalahan";

/// Which report outline to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    #[default]
    General,
    StudentPerformance,
    FinancialAnalysis,
}

impl ReportKind {
    /// Identifier used in file names and metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::General => "general",
            ReportKind::StudentPerformance => "student_performance",
            ReportKind::FinancialAnalysis => "financial_analysis",
        }
    }

    /// Default report kind for a detected dataset type.
    pub fn for_detected(detected: DetectedType) -> Self {
        match detected {
            DetectedType::Student => ReportKind::StudentPerformance,
            DetectedType::Finance => ReportKind::FinancialAnalysis,
            _ => ReportKind::General,
        }
    }

    fn outline(&self) -> &'static str {
        match self {
            ReportKind::StudentPerformance => STUDENT_OUTLINE,
            ReportKind::FinancialAnalysis => FINANCE_OUTLINE,
            ReportKind::General => GENERAL_OUTLINE,
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" => Ok(ReportKind::General),
            "student" | "student_performance" => Ok(ReportKind::StudentPerformance),
            "finance" | "financial" | "financial_analysis" => Ok(ReportKind::FinancialAnalysis),
            other => Err(format!(
                "Unknown report kind: {}. Use general, student or finance.",
                other
            )),
        }
    }
}

const PREAMBLE: &str = "Anda adalah seorang analis data universitas yang ahli. Tugas Anda adalah membuat laporan
naratif yang profesional dan mudah dipahami berdasarkan data yang diberikan.

PENTING: Hanya gunakan informasi dari data yang diberikan. Jangan membuat asumsi atau
menambahkan informasi yang tidak ada dalam data.";

const STUDENT_OUTLINE: &str = "Buatlah laporan analisis performa mahasiswa dengan struktur berikut:

1. RINGKASAN EKSEKUTIF (2-3 paragraf)
   - Gambaran umum data mahasiswa
   - Temuan utama

2. ANALISIS DETAIL
   - Distribusi nilai/IPK
   - Identifikasi pola atau trend
   - Perbandingan antar kelompok (jika ada)

3. KESIMPULAN DAN REKOMENDASI
   - Kesimpulan berdasarkan data
   - Rekomendasi untuk perbaikan

Gunakan format Markdown dengan heading, bullet points, dan penekanan yang sesuai.";

const FINANCE_OUTLINE: &str = "Buatlah laporan analisis keuangan dengan struktur berikut:

1. RINGKASAN KEUANGAN (2-3 paragraf)
   - Overview kondisi keuangan
   - Highlight angka-angka penting

2. ANALISIS MENDALAM
   - Breakdown per kategori
   - Trend pendapatan/pengeluaran
   - Analisis rasio (jika relevan)

3. KESIMPULAN DAN SARAN
   - Kesimpulan finansial
   - Rekomendasi strategis

Gunakan format Markdown. Sertakan angka dengan format yang jelas (Rp untuk rupiah).";

const GENERAL_OUTLINE: &str = "Buatlah laporan analisis data dengan struktur:

1. RINGKASAN
2. ANALISIS DETAIL
3. KESIMPULAN

Gunakan format Markdown.";

/// Assembles generation prompts from an analysis.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    formatter: Arc<DigestFormatter>,
}

impl PromptBuilder {
    /// Create a builder sharing `formatter` with other components.
    pub fn new(formatter: Arc<DigestFormatter>) -> Self {
        Self { formatter }
    }

    /// Render the full prompt: preamble, outline, then the analysis digest.
    pub fn build(&self, analysis: &AnalysisResult, kind: ReportKind) -> String {
        format!(
            "{}\n\n{}\n\nDATA YANG HARUS DIANALISIS:\n{}\n\nMulai menulis laporan sekarang dalam Bahasa Indonesia:\n",
            PREAMBLE,
            kind.outline(),
            self.formatter.format(analysis)
        )
    }
}

/// Deterministic narrative used when generation is unavailable.
pub fn fallback_report(digest: &str) -> String {
    format!(
        "# Laporan Data Universitas

## Ringkasan

Laporan ini dibuat secara otomatis berdasarkan data yang tersedia.

## Data Overview

{digest}

## Catatan

{FALLBACK_MARKER} dalam proses generasi AI. Untuk laporan yang lebih detail, silakan coba lagi.

---
*Generated by University Report Generator*
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn analysis(detected_type: DetectedType) -> AnalysisResult {
        AnalysisResult {
            row_count: 10,
            column_count: 1,
            columns: vec!["ipk".into()],
            detected_type,
            numeric_stats: IndexMap::new(),
            categorical: IndexMap::new(),
            entities: Vec::new(),
        }
    }

    #[test]
    fn test_prompt_sections_in_order() {
        let formatter = Arc::new(DigestFormatter::new());
        let builder = PromptBuilder::new(formatter.clone());
        let analysis = analysis(DetectedType::Student);

        let prompt = builder.build(&analysis, ReportKind::StudentPerformance);

        let preamble = prompt.find("PENTING").unwrap();
        let outline = prompt.find("RINGKASAN EKSEKUTIF").unwrap();
        let data = prompt.find("DATA YANG HARUS DIANALISIS:").unwrap();
        assert!(preamble < outline && outline < data);
        assert!(prompt.contains(&formatter.format(&analysis)));
        assert!(prompt.ends_with("Bahasa Indonesia:\n"));
    }

    #[test]
    fn test_outline_per_kind() {
        let builder = PromptBuilder::new(Arc::new(DigestFormatter::new()));
        let analysis = analysis(DetectedType::Finance);

        assert!(builder.build(&analysis, ReportKind::FinancialAnalysis).contains("RINGKASAN KEUANGAN"));
        assert!(builder.build(&analysis, ReportKind::General).contains("1. RINGKASAN\n"));
    }

    #[test]
    fn test_kind_parsing_and_defaults() {
        assert_eq!("student".parse::<ReportKind>().unwrap(), ReportKind::StudentPerformance);
        assert_eq!("financial_analysis".parse::<ReportKind>().unwrap(), ReportKind::FinancialAnalysis);
        assert!("weekly".parse::<ReportKind>().is_err());
        assert_eq!(ReportKind::for_detected(DetectedType::Mixed), ReportKind::General);
        assert_eq!(ReportKind::for_detected(DetectedType::Finance), ReportKind::FinancialAnalysis);
    }

    #[test]
    fn test_fallback_contains_digest_and_marker() {
        let text = fallback_report("Data Overview:\n- Total records: 3");
        assert!(text.starts_with("# Laporan Data Universitas"));
        assert!(text.contains("- Total records: 3"));
        assert!(text.contains(FALLBACK_MARKER));
    }
}
