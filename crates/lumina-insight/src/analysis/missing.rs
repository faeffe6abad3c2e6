//! Missingness summary built from profiled column statistics.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::InsightConfig;
use crate::table::Table;
use crate::types::{ColumnStats, MissingDataRecord};

#[derive(Debug, Clone)]
pub struct MissingDataAnalyzer {
    threshold: f64,
}

impl Default for MissingDataAnalyzer {
    fn default() -> Self {
        Self::new(&InsightConfig::default())
    }
}

impl MissingDataAnalyzer {
    pub fn new(config: &InsightConfig) -> Self {
        Self {
            threshold: config.missing_threshold,
        }
    }

    /// Reads null counts from `stats`; `table` only supplies column order
    /// and shape. Columns absent from `stats` count as complete.
    pub fn analyze(&self, table: &Table, stats: &BTreeMap<String, ColumnStats>) -> MissingDataRecord {
        let mut null_ratios = BTreeMap::new();
        let mut total_missing = 0;
        let mut high_missing_columns = Vec::new();
        let mut with_missing: Vec<(&str, f64)> = Vec::new();

        for column in table.columns() {
            let (nulls, ratio) = stats
                .get(column.name())
                .map_or((0, 0.0), |s| (s.null_count, s.null_ratio));

            total_missing += nulls;
            null_ratios.insert(column.name().to_string(), ratio);
            if ratio > self.threshold {
                high_missing_columns.push(column.name().to_string());
            }
            if nulls > 0 {
                with_missing.push((column.name(), ratio));
            }
        }

        // stable: ties keep table order
        with_missing.sort_by(|a, b| b.1.total_cmp(&a.1));

        let cells = table.row_count() * table.column_count();
        let overall_missing_ratio = if cells == 0 {
            0.0
        } else {
            total_missing as f64 / cells as f64
        };
        debug!(total_missing, overall_missing_ratio, "missing data analysis finished");

        MissingDataRecord {
            null_ratios,
            overall_missing_ratio,
            total_missing,
            high_missing_columns,
            columns_with_missing: with_missing.into_iter().map(|(n, _)| n.to_string()).collect(),
            threshold: self.threshold,
        }
    }
}
