//! Column-name keyword classification of datasets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Domain category of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectedType {
    Student,
    Finance,
    Akreditasi,
    /// Two or more families matched.
    Mixed,
    /// No family matched.
    Unknown,
}

impl DetectedType {
    /// Lowercase name used in digests and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedType::Student => "student",
            DetectedType::Finance => "finance",
            DetectedType::Akreditasi => "akreditasi",
            DetectedType::Mixed => "mixed",
            DetectedType::Unknown => "unknown",
        }
    }

    /// Words a narrative uses when stating how many entities this dataset holds.
    pub fn entity_keywords(&self) -> &'static [&'static str] {
        match self {
            DetectedType::Student => &["mahasiswa", "students", "student"],
            DetectedType::Finance => &["transaksi", "transactions", "records"],
            DetectedType::Akreditasi => &["program studi", "prodi", "programs"],
            DetectedType::Mixed | DetectedType::Unknown => &[],
        }
    }
}

impl fmt::Display for DetectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named set of column-name keywords.
#[derive(Debug, Clone)]
pub struct KeywordFamily {
    pub detected: DetectedType,
    pub keywords: Vec<String>,
}

impl KeywordFamily {
    /// Create a family from static keywords.
    pub fn new(detected: DetectedType, keywords: &[&str]) -> Self {
        Self {
            detected,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn matches(&self, haystack: &str) -> bool {
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }
}

/// Classifies a dataset from its column names.
#[derive(Debug, Clone)]
pub struct TypeDetector {
    families: Vec<KeywordFamily>,
}

impl Default for TypeDetector {
    fn default() -> Self {
        Self {
            families: vec![
                KeywordFamily::new(
                    DetectedType::Student,
                    &["student", "mahasiswa", "nama", "grade", "nilai", "ipk", "gpa"],
                ),
                KeywordFamily::new(
                    DetectedType::Finance,
                    &[
                        "finance", "keuangan", "biaya", "pembayaran", "tagihan", "revenue",
                        "expense", "pemasukan", "pengeluaran", "saldo",
                    ],
                ),
                KeywordFamily::new(
                    DetectedType::Akreditasi,
                    &[
                        "akreditasi", "accreditation", "prodi", "program", "fakultas", "faculty",
                        "kurikulum", "curriculum",
                    ],
                ),
            ],
        }
    }
}

impl TypeDetector {
    /// Create a detector with the built-in keyword families.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with custom families.
    pub fn with_families(families: Vec<KeywordFamily>) -> Self {
        Self { families }
    }

    /// Classify by column names.
    pub fn detect<S: AsRef<str>>(&self, columns: &[S]) -> DetectedType {
        let haystack = columns
            .iter()
            .map(|c| c.as_ref().to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");

        let mut matched = self.families.iter().filter(|f| f.matches(&haystack));
        match (matched.next(), matched.next()) {
            (None, _) => DetectedType::Unknown,
            (Some(family), None) => family.detected,
            (Some(_), Some(_)) => DetectedType::Mixed,
        }
    }
}

/// Classify columns with the built-in families.
pub fn detect_type<S: AsRef<str>>(columns: &[S]) -> DetectedType {
    TypeDetector::default().detect(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_family() {
        assert_eq!(detect_type(&["NIM", "Nama Mahasiswa", "IPK"]), DetectedType::Student);
        assert_eq!(detect_type(&["Bulan", "Pemasukan (Rp)"]), DetectedType::Finance);
        assert_eq!(detect_type(&["Fakultas", "Skor"]), DetectedType::Akreditasi);
    }

    #[test]
    fn test_mixed_and_unknown() {
        assert_eq!(detect_type(&["ipk", "biaya"]), DetectedType::Mixed);
        assert_eq!(detect_type(&["alpha", "beta"]), DetectedType::Unknown);
        assert_eq!(detect_type::<&str>(&[]), DetectedType::Unknown);
    }

    #[test]
    fn test_custom_families() {
        let detector = TypeDetector::with_families(vec![KeywordFamily::new(
            DetectedType::Finance,
            &["rupiah"],
        )]);
        assert_eq!(detector.detect(&["Jumlah Rupiah"]), DetectedType::Finance);
        assert_eq!(detector.detect(&["ipk"]), DetectedType::Unknown);
    }
}
