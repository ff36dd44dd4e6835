//! Per-column summary statistics.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::input::Cell;

// =============================================================================
// WELFORD ACCUMULATOR
// =============================================================================
// Mean and variance in a single numerically stable pass.

#[derive(Debug, Clone)]
struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn add(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;

        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Population variance (divide by n).
    fn variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }
}

/// Summary of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation.
    pub std: f64,
    pub missing_count: usize,
}

impl NumericStats {
    /// Summarize the numeric cells of a column. Non-numeric cells count as missing.
    ///
    /// With no present values every statistic is zero.
    pub fn from_cells<'a>(cells: impl Iterator<Item = &'a Cell>) -> Self {
        let mut running = RunningStats::new();
        let mut values = Vec::new();
        let mut missing_count = 0;

        for cell in cells {
            match cell.as_number() {
                Some(n) => {
                    running.add(n);
                    values.push(n);
                }
                None => missing_count += 1,
            }
        }

        if values.is_empty() {
            return Self {
                count: 0,
                mean: 0.0,
                median: 0.0,
                min: 0.0,
                max: 0.0,
                std: 0.0,
                missing_count,
            };
        }

        values.sort_by(f64::total_cmp);
        let mid = values.len() / 2;
        let median = if values.len() % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        };

        // Rounding in the running mean can land a hair outside [min, max]
        let mean = running.mean.clamp(running.min, running.max);

        Self {
            count: running.count,
            mean,
            median,
            min: running.min,
            max: running.max,
            std: running.variance().sqrt(),
            missing_count,
        }
    }
}

/// Summary of a text column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub unique_count: usize,
    /// Most frequent value; ties go to the first seen.
    pub most_common_value: Option<String>,
    pub most_common_count: usize,
    pub missing_count: usize,
}

impl CategoricalSummary {
    /// Summarize the text cells of a column. Number cells are counted by
    /// their decimal representation.
    pub fn from_cells<'a>(cells: impl Iterator<Item = &'a Cell>) -> Self {
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        let mut missing_count = 0;

        for cell in cells {
            if cell.is_missing() {
                missing_count += 1;
            } else {
                *counts.entry(cell.to_string()).or_insert(0) += 1;
            }
        }

        let mut best: Option<(&String, usize)> = None;
        for (value, &count) in &counts {
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((value, count));
            }
        }

        Self {
            unique_count: counts.len(),
            most_common_value: best.map(|(v, _)| v.clone()),
            most_common_count: best.map(|(_, c)| c).unwrap_or(0),
            missing_count,
        }
    }
}
