//! Table sanitation: deduplication, empty-column removal, locale-aware
//! numeric coercion and imputation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analysis::CategoricalSummary;
use crate::input::{Cell, ColumnKind, DataTable};

/// Side effects of one cleaning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Exact-duplicate rows removed.
    pub duplicates_removed: usize,
    /// Columns dropped because every value was missing.
    pub columns_dropped: Vec<String>,
    /// Text columns converted to numeric.
    pub columns_coerced: Vec<String>,
    /// Missing cells filled in.
    pub cells_imputed: usize,
}

/// Sanitizes a combined table before analysis.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cleaner;

impl Cleaner {
    /// Create a new cleaner.
    pub fn new() -> Self {
        Self
    }

    /// Clean `table`, returning the cleaned table and what was changed.
    ///
    /// Steps run in order: remove duplicate rows (first occurrence kept),
    /// drop all-missing columns, coerce decimal-comma text columns to numbers
    /// (all-or-nothing per column), then impute the mean for numeric columns
    /// and the most frequent value for text columns.
    pub fn clean(&self, mut table: DataTable) -> (DataTable, CleaningReport) {
        let mut report = CleaningReport {
            duplicates_removed: remove_duplicates(&mut table),
            ..Default::default()
        };

        report.columns_dropped = drop_empty_columns(&mut table);
        report.columns_coerced = coerce_numeric_columns(&mut table);
        report.cells_imputed = impute_missing(&mut table);

        info!(
            "Cleaning removed {} duplicate(s), dropped {} column(s), coerced {} column(s), imputed {} cell(s)",
            report.duplicates_removed,
            report.columns_dropped.len(),
            report.columns_coerced.len(),
            report.cells_imputed
        );

        (table, report)
    }
}

fn remove_duplicates(table: &mut DataTable) -> usize {
    let before = table.row_count();
    let mut seen: HashSet<Vec<Cell>> = HashSet::with_capacity(before);
    table.rows.retain(|row| seen.insert(row.clone()));
    before - table.row_count()
}

fn drop_empty_columns(table: &mut DataTable) -> Vec<String> {
    // A table without rows keeps its columns
    if table.is_empty() {
        return Vec::new();
    }

    let empty: Vec<usize> = (0..table.column_count())
        .filter(|&col| table.column_values(col).all(Cell::is_missing))
        .collect();
    if empty.is_empty() {
        return Vec::new();
    }

    let dropped: Vec<String> = empty.iter().map(|&i| table.headers[i].clone()).collect();
    debug!("Dropping empty columns: {:?}", dropped);
    table.drop_columns(&empty.into_iter().collect());
    dropped
}

/// Parse a text value as a number, treating a comma as the decimal separator.
pub fn parse_locale_number(value: &str) -> Option<f64> {
    let normalized = value.trim().replace(',', ".");
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn coerce_numeric_columns(table: &mut DataTable) -> Vec<String> {
    let mut coerced = Vec::new();

    for col in 0..table.column_count() {
        if table.kinds[col] != ColumnKind::Text {
            continue;
        }

        let parsed: Option<Vec<Cell>> = table
            .column_values(col)
            .map(|cell| match cell {
                Cell::Missing => Some(Cell::Missing),
                Cell::Number(n) => Some(Cell::Number(*n)),
                Cell::Text(s) => parse_locale_number(s).map(Cell::Number),
            })
            .collect();

        let Some(values) = parsed else { continue };
        if values.iter().all(Cell::is_missing) {
            continue;
        }

        for (row, value) in table.rows.iter_mut().zip(values) {
            row[col] = value;
        }
        table.kinds[col] = ColumnKind::Numeric;
        coerced.push(table.headers[col].clone());
    }

    if !coerced.is_empty() {
        debug!("Coerced to numeric: {:?}", coerced);
    }
    coerced
}

fn impute_missing(table: &mut DataTable) -> usize {
    let mut imputed = 0;

    for col in 0..table.column_count() {
        let missing = table.column_values(col).filter(|c| c.is_missing()).count();
        if missing == 0 {
            continue;
        }

        let fill = match table.kinds[col] {
            ColumnKind::Numeric => {
                let (sum, count) = table
                    .column_values(col)
                    .filter_map(Cell::as_number)
                    .fold((0.0, 0usize), |(s, c), n| (s + n, c + 1));
                if count == 0 {
                    Cell::Number(0.0)
                } else {
                    Cell::Number(sum / count as f64)
                }
            }
            ColumnKind::Text => Cell::Text(
                CategoricalSummary::from_cells(table.column_values(col))
                    .most_common_value
                    .unwrap_or_default(),
            ),
        };

        for row in &mut table.rows {
            if row[col].is_missing() {
                row[col] = fill.clone();
            }
        }
        imputed += missing;
    }

    imputed
}
