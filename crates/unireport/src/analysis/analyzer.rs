//! Dataset analysis conditioned on the detected domain.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::detector::{DetectedType, TypeDetector};
use super::stats::{CategoricalSummary, NumericStats};
use crate::input::{ColumnKind, DataTable};

/// Column-name fragments marking nominal identifiers in student data.
const IDENTIFIER_KEYWORDS: &[&str] = &["nim", "id", "kode"];

/// Kind of named sub-entity a column or a narrative mention refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Study programs ("Program Studi", "Prodi").
    Program,
    /// Faculties ("Fakultas", "Faculty of").
    Faculty,
    /// Departments ("Jurusan", "Department of").
    Department,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Program, EntityKind::Faculty, EntityKind::Department];

    /// Column-name fragments marking a column of this kind.
    pub fn column_keywords(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Program => &["prodi", "program"],
            EntityKind::Faculty => &["fakultas", "faculty"],
            EntityKind::Department => &["jurusan", "department"],
        }
    }

    /// Kind named by a mention prefix such as "Program Studi" or "Faculty of".
    pub fn from_mention(prefix: &str) -> Option<Self> {
        let lower = prefix.trim().to_lowercase();
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.column_keywords().iter().any(|k| lower.starts_with(k)))
    }

    fn matches_column(&self, column: &str) -> bool {
        let lower = column.to_lowercase();
        self.column_keywords().iter().any(|k| lower.contains(k))
    }
}

/// Closed set of named sub-entities found in the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySet {
    pub kind: EntityKind,
    /// Column the names were taken from.
    pub column: String,
    /// Distinct names in first-seen order.
    pub names: Vec<String>,
}

impl EntitySet {
    /// Case-insensitive membership test.
    pub fn contains(&self, name: &str) -> bool {
        let needle = name.trim().to_lowercase();
        self.names.iter().any(|n| n.trim().to_lowercase() == needle)
    }
}

/// A true entity count and the words a narrative would use for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTotal {
    pub total: usize,
    pub keywords: &'static [&'static str],
}

/// Statistical digest of a cleaned table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<String>,
    pub detected_type: DetectedType,
    pub numeric_stats: IndexMap<String, NumericStats>,
    pub categorical: IndexMap<String, CategoricalSummary>,
    /// At most one set per [`EntityKind`].
    #[serde(default)]
    pub entities: Vec<EntitySet>,
}

impl AnalysisResult {
    /// Known names of one entity kind, if the data has a column for it.
    pub fn entity_set(&self, kind: EntityKind) -> Option<&EntitySet> {
        self.entities.iter().find(|set| set.kind == kind)
    }

    /// Known entity total, available when a single domain was detected.
    pub fn entity_total(&self) -> Option<EntityTotal> {
        let keywords = self.detected_type.entity_keywords();
        if keywords.is_empty() {
            return None;
        }
        Some(EntityTotal {
            total: self.row_count,
            keywords,
        })
    }
}

/// Computes an [`AnalysisResult`] from a cleaned table.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    detector: TypeDetector,
}

impl Analyzer {
    /// Create an analyzer with the built-in type detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer with a custom type detector.
    pub fn with_detector(detector: TypeDetector) -> Self {
        Self { detector }
    }

    /// Analyze a table.
    ///
    /// Numeric statistics cover every numeric column except, for student data
    /// only, identifier columns. Every text column gets a categorical summary.
    pub fn analyze(&self, table: &DataTable) -> AnalysisResult {
        let detected_type = self.detector.detect(table.headers.as_slice());
        info!("Detected data type: {}", detected_type);

        let mut numeric_stats = IndexMap::new();
        let mut categorical = IndexMap::new();

        for (idx, (name, kind)) in table.headers.iter().zip(&table.kinds).enumerate() {
            match kind {
                ColumnKind::Numeric => {
                    if detected_type == DetectedType::Student && is_identifier(name) {
                        debug!("Excluding identifier column {} from statistics", name);
                        continue;
                    }
                    numeric_stats.insert(name.clone(), NumericStats::from_cells(table.column_values(idx)));
                }
                ColumnKind::Text => {
                    categorical.insert(
                        name.clone(),
                        CategoricalSummary::from_cells(table.column_values(idx)),
                    );
                }
            }
        }

        AnalysisResult {
            row_count: table.row_count(),
            column_count: table.column_count(),
            columns: table.headers.clone(),
            detected_type,
            numeric_stats,
            categorical,
            entities: find_entities(table),
        }
    }
}

fn is_identifier(column: &str) -> bool {
    let lower = column.to_lowercase();
    IDENTIFIER_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// One entity set per kind, each from the first text column of that kind.
fn find_entities(table: &DataTable) -> Vec<EntitySet> {
    EntityKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let idx = table
                .headers
                .iter()
                .zip(&table.kinds)
                .position(|(name, col_kind)| *col_kind == ColumnKind::Text && kind.matches_column(name))?;

            let mut names: Vec<String> = Vec::new();
            for value in table.column_values(idx).filter_map(|c| c.as_text()) {
                let value = value.trim();
                if !value.is_empty() && !names.iter().any(|n| n == value) {
                    names.push(value.to_string());
                }
            }

            if names.is_empty() {
                return None;
            }
            Some(EntitySet {
                kind,
                column: table.headers[idx].clone(),
                names,
            })
        })
        .collect()
}
