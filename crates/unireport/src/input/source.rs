//! Tabular data model and source metadata.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Metadata about one loaded source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name used for provenance and caching.
    pub name: String,
    /// Path or URL the bytes came from.
    pub location: String,
    /// SHA-256 hash of the raw bytes.
    pub hash: String,
    /// Raw size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns, before provenance columns are added.
    pub column_count: usize,
    /// When the source was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a source that has been parsed.
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        hash: String,
        size_bytes: u64,
        format: String,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            hash,
            size_bytes,
            format,
            row_count,
            column_count,
            loaded_at: Utc::now(),
        }
    }
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Every present value is a number.
    Numeric,
    /// Free text or categorical values.
    Text,
}

/// A single cell value.
#[derive(Debug, Clone)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Returns true if the cell holds no value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric value, if this is a number cell.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text value, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to a text cell, keeping missing cells missing.
    pub fn into_text(self) -> Cell {
        match self {
            Cell::Number(n) => Cell::Text(n.to_string()),
            other => other,
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Missing, Cell::Missing) => true,
            (Cell::Number(a), Cell::Number(b)) => a.to_bits() == b.to_bits(),
            (Cell::Text(a), Cell::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Cell::Missing => 0u8.hash(state),
            Cell::Number(n) => {
                1u8.hash(state);
                n.to_bits().hash(state);
            }
            Cell::Text(s) => {
                2u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Parsed tabular data with a storage kind per column.
#[derive(Debug, Clone, Default)]
pub struct DataTable {
    /// Column headers.
    pub headers: Vec<String>,
    /// Storage kind per column, parallel to `headers`.
    pub kinds: Vec<ColumnKind>,
    /// Row data (row-major order). Every row has `headers.len()` cells.
    pub rows: Vec<Vec<Cell>>,
}

impl DataTable {
    /// Create a table from already-typed parts.
    pub fn new(headers: Vec<String>, kinds: Vec<ColumnKind>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            headers,
            kinds,
            rows,
        }
    }

    /// Build a table from raw strings, inferring each column's storage kind.
    ///
    /// A column is numeric when every non-null value parses as a finite
    /// period-decimal number; anything else (including `inf`) stays text. Decimal-comma
    /// values are left as text here and handled by the cleaner.
    pub fn from_strings(headers: Vec<String>, raw_rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let kinds: Vec<ColumnKind> = (0..width)
            .map(|col| {
                let mut present = raw_rows
                    .iter()
                    .filter_map(|row| row.get(col))
                    .filter(|v| !Self::is_null_value(v))
                    .peekable();
                if present.peek().is_none() {
                    return ColumnKind::Text;
                }
                if present.all(|v| parse_finite(v).is_some()) {
                    ColumnKind::Numeric
                } else {
                    ColumnKind::Text
                }
            })
            .collect();

        let rows = raw_rows
            .into_iter()
            .map(|row| {
                (0..width)
                    .map(|col| {
                        let value = row.get(col).map(String::as_str).unwrap_or("");
                        if Self::is_null_value(value) {
                            return Cell::Missing;
                        }
                        match kinds[col] {
                            ColumnKind::Numeric => {
                                parse_finite(value).map(Cell::Number).unwrap_or(Cell::Missing)
                            }
                            ColumnKind::Text => Cell::Text(value.to_string()),
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            headers,
            kinds,
            rows,
        }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get all cells for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Cell> {
        self.rows
            .iter()
            .map(move |row| row.get(index).unwrap_or(&Cell::Missing))
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Storage kind of a column by name.
    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        self.column_index(name).map(|i| self.kinds[i])
    }

    /// Get a specific cell.
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Append a text column holding the same value on every row.
    ///
    /// Replaces the column in place if a column with that name exists.
    pub fn set_constant_column(&mut self, name: &str, value: &str) {
        match self.column_index(name) {
            Some(idx) => {
                self.kinds[idx] = ColumnKind::Text;
                for row in &mut self.rows {
                    row[idx] = Cell::Text(value.to_string());
                }
            }
            None => {
                self.headers.push(name.to_string());
                self.kinds.push(ColumnKind::Text);
                for row in &mut self.rows {
                    row.push(Cell::Text(value.to_string()));
                }
            }
        }
    }

    /// Concatenate tables using the union of their columns.
    ///
    /// Columns keep first-seen order. Cells absent from a table are missing.
    /// A column that is numeric in one table and text in another becomes
    /// text, with numbers rendered as their decimal representation.
    pub fn concat(tables: Vec<DataTable>) -> DataTable {
        let mut columns: IndexMap<String, ColumnKind> = IndexMap::new();
        for table in &tables {
            for (name, kind) in table.headers.iter().zip(&table.kinds) {
                columns
                    .entry(name.clone())
                    .and_modify(|existing| {
                        if *existing != *kind {
                            *existing = ColumnKind::Text;
                        }
                    })
                    .or_insert(*kind);
            }
        }

        let total_rows = tables.iter().map(DataTable::row_count).sum();
        let mut rows = Vec::with_capacity(total_rows);

        for table in tables {
            let mapping: Vec<Option<usize>> = columns
                .keys()
                .map(|name| table.column_index(name))
                .collect();
            for mut row in table.rows {
                let merged = mapping
                    .iter()
                    .zip(columns.values())
                    .map(|(source, kind)| {
                        let cell = source
                            .map(|i| std::mem::replace(&mut row[i], Cell::Missing))
                            .unwrap_or(Cell::Missing);
                        match kind {
                            ColumnKind::Text => cell.into_text(),
                            ColumnKind::Numeric => cell,
                        }
                    })
                    .collect();
                rows.push(merged);
            }
        }

        let (headers, kinds) = columns.into_iter().unzip();
        DataTable {
            headers,
            kinds,
            rows,
        }
    }

    /// Remove columns by index, keeping the order of the rest.
    pub fn drop_columns(&mut self, indices: &HashSet<usize>) {
        if indices.is_empty() {
            return;
        }
        let keep = |i: &usize| !indices.contains(i);
        self.headers = std::mem::take(&mut self.headers)
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep(i))
            .map(|(_, h)| h)
            .collect();
        self.kinds = std::mem::take(&mut self.kinds)
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep(i))
            .map(|(_, k)| k)
            .collect();
        for row in &mut self.rows {
            *row = std::mem::take(row)
                .into_iter()
                .enumerate()
                .filter(|(i, _)| keep(i))
                .map(|(_, c)| c)
                .collect();
        }
    }

    /// Check if a raw value represents a missing/null value.
    pub fn is_null_value(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("#n/a")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("nan")
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed == "<NA>"
    }
}

/// Parse a period-decimal number, rejecting infinities and NaN.
fn parse_finite(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(rows: Vec<Vec<&str>>) -> Vec<Vec<String>> {
        rows.into_iter()
            .map(|r| r.into_iter().map(String::from).collect())
            .collect()
    }

    #[test]
    fn test_from_strings_infers_kinds() {
        let table = DataTable::from_strings(
            vec!["ipk".into(), "nama".into(), "nilai".into()],
            strings(vec![
                vec!["3.5", "Ahmad", "3,5"],
                vec!["NA", "Budi", "4,0"],
            ]),
        );

        assert_eq!(
            table.kinds,
            vec![ColumnKind::Numeric, ColumnKind::Text, ColumnKind::Text]
        );
        assert_eq!(table.get(0, 0), Some(&Cell::Number(3.5)));
        assert!(table.get(1, 0).unwrap().is_missing());
        assert_eq!(table.get(0, 2), Some(&Cell::Text("3,5".into())));
    }

    #[test]
    fn test_infinite_values_stay_text() {
        let table = DataTable::from_strings(
            vec!["skor".into(), "nilai".into()],
            strings(vec![
                vec!["1", "1"],
                vec!["inf", "1e400"],
                vec!["3", "NaN"],
            ]),
        );

        assert_eq!(table.kinds, vec![ColumnKind::Text, ColumnKind::Text]);
        assert_eq!(table.get(1, 0), Some(&Cell::Text("inf".into())));
    }

    #[test]
    fn test_concat_union_of_columns() {
        let a = DataTable::from_strings(
            vec!["nim".into(), "ipk".into()],
            strings(vec![vec!["1", "3.1"], vec!["2", "3.2"]]),
        );
        let b = DataTable::from_strings(
            vec!["biaya".into(), "nim".into()],
            strings(vec![vec!["1000", "x9"]]),
        );

        let combined = DataTable::concat(vec![a, b]);

        assert_eq!(combined.headers, vec!["nim", "ipk", "biaya"]);
        assert_eq!(combined.row_count(), 3);
        // nim is numeric in one table and text in the other
        assert_eq!(combined.kinds[0], ColumnKind::Text);
        assert_eq!(combined.get(0, 0), Some(&Cell::Text("1".into())));
        assert!(combined.get(0, 2).unwrap().is_missing());
        assert!(combined.get(2, 1).unwrap().is_missing());
        assert_eq!(combined.get(2, 0), Some(&Cell::Text("x9".into())));
    }

    #[test]
    fn test_set_constant_column() {
        let mut table = DataTable::from_strings(
            vec!["a".into()],
            strings(vec![vec!["1"], vec!["2"]]),
        );
        table.set_constant_column("source_type", "local");

        assert_eq!(table.column_count(), 2);
        assert_eq!(table.column_kind("source_type"), Some(ColumnKind::Text));
        assert_eq!(table.get(1, 1), Some(&Cell::Text("local".into())));
    }

    #[test]
    fn test_is_null_value() {
        assert!(DataTable::is_null_value(""));
        assert!(DataTable::is_null_value("NA"));
        assert!(DataTable::is_null_value("n/a"));
        assert!(DataTable::is_null_value("NULL"));
        assert!(DataTable::is_null_value("NaN"));
        assert!(!DataTable::is_null_value("0"));
        assert!(!DataTable::is_null_value("-"));
    }
}
