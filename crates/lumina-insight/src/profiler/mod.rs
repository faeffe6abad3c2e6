//! Per-column descriptive statistics.
//!
//! The profiler is a pure function of the [`Table`]: nulls are counted but
//! excluded from every moment and quantile, and a numeric column without a
//! single value gets no numeric summary at all.

pub mod statistics;

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::InsightConfig;
use crate::table::{Column, ColumnData, Table};
use crate::types::{
    CategoricalSummary, ColumnStats, NumericSummary, TemporalSummary, ValueCount,
};

/// Computes [`ColumnStats`] for every column of a table.
#[derive(Debug, Clone)]
pub struct StatisticalProfiler {
    top_k: usize,
}

impl Default for StatisticalProfiler {
    fn default() -> Self {
        Self::new(&InsightConfig::default())
    }
}

impl StatisticalProfiler {
    pub fn new(config: &InsightConfig) -> Self {
        Self {
            top_k: config.top_k_categories,
        }
    }

    /// Profile every column, keyed by column name.
    pub fn profile(&self, table: &Table) -> BTreeMap<String, ColumnStats> {
        table
            .columns()
            .iter()
            .map(|column| {
                let stats = self.profile_column(column, table.row_count());
                (column.name().to_string(), stats)
            })
            .collect()
    }

    pub fn profile_column(&self, column: &Column, row_count: usize) -> ColumnStats {
        let null_count = column.null_count();
        let null_ratio = if row_count > 0 {
            null_count as f64 / row_count as f64
        } else {
            0.0
        };

        let mut stats = ColumnStats {
            name: column.name().to_string(),
            kind: column.kind(),
            count: row_count - null_count,
            null_count,
            null_ratio,
            unique_count: 0,
            numeric: None,
            categorical: None,
            temporal: None,
        };

        match column.data() {
            ColumnData::Numeric(values) => {
                let present: Vec<f64> = values.iter().flatten().copied().collect();
                stats.unique_count = present
                    .iter()
                    .map(|v| v.to_bits())
                    .collect::<HashSet<_>>()
                    .len();
                stats.numeric = numeric_summary(&present);
                if stats.numeric.is_none() {
                    debug!(column = column.name(), "numeric column has no values");
                }
            }
            ColumnData::Categorical(values) | ColumnData::Text(values) => {
                let summary = self.categorical_summary(values);
                stats.unique_count = summary.cardinality;
                stats.categorical = Some(summary);
            }
            ColumnData::Temporal(values) => {
                let present: Vec<DateTime<Utc>> = values.iter().flatten().copied().collect();
                stats.unique_count = present.iter().collect::<HashSet<_>>().len();
                stats.temporal = match (present.iter().min(), present.iter().max()) {
                    (Some(&earliest), Some(&latest)) => Some(TemporalSummary { earliest, latest }),
                    _ => None,
                };
            }
        }

        stats
    }

    /// Cardinality and top-k values; ties keep first-seen order.
    fn categorical_summary(&self, values: &[Option<String>]) -> CategoricalSummary {
        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for value in values.iter().flatten() {
            let count = counts.entry(value.as_str()).or_insert_with(|| {
                order.push(value.as_str());
                0
            });
            *count += 1;
        }

        let mut ranked = order.clone();
        // stable sort keeps first-seen order among equal counts
        ranked.sort_by(|a, b| counts[b].cmp(&counts[a]));

        CategoricalSummary {
            cardinality: order.len(),
            top_values: ranked
                .into_iter()
                .take(self.top_k)
                .map(|value| ValueCount {
                    value: value.to_string(),
                    count: counts[value],
                })
                .collect(),
        }
    }
}

fn numeric_summary(values: &[f64]) -> Option<NumericSummary> {
    let mean = statistics::mean(values)?;
    let sorted = statistics::sorted(values);
    Some(NumericSummary {
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        mean,
        median: statistics::quantile_sorted(&sorted, 0.5),
        std: statistics::sample_std(values, mean),
        q1: statistics::quantile_sorted(&sorted, 0.25),
        q3: statistics::quantile_sorted(&sorted, 0.75),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnKind;
    use pretty_assertions::assert_eq;

    fn profile(columns: Vec<Column>) -> BTreeMap<String, ColumnStats> {
        let table = Table::new(columns).unwrap();
        StatisticalProfiler::default().profile(&table)
    }

    // ==================== Numeric tests ====================

    #[test]
    fn test_numeric_stats_exclude_nulls() {
        let stats = profile(vec![Column::numeric_opt(
            "x",
            [Some(1.0), None, Some(3.0), Some(5.0)],
        )]);
        let x = &stats["x"];

        assert_eq!(x.count, 3);
        assert_eq!(x.null_count, 1);
        assert_eq!(x.null_ratio, 0.25);

        let numeric = x.numeric.as_ref().unwrap();
        assert_eq!(numeric.mean, 3.0);
        assert_eq!(numeric.median, 3.0);
        assert_eq!(numeric.min, 1.0);
        assert_eq!(numeric.max, 5.0);
        assert_eq!(numeric.std, Some(2.0));
    }

    #[test]
    fn test_all_null_numeric_is_undefined() {
        let stats = profile(vec![Column::numeric_opt("x", [None, None])]);
        assert_eq!(stats["x"].kind, ColumnKind::Numeric);
        assert!(stats["x"].numeric.is_none());
        assert_eq!(stats["x"].null_ratio, 1.0);
    }

    #[test]
    fn test_single_value_std_undefined() {
        let stats = profile(vec![Column::numeric("x", [4.0])]);
        assert_eq!(stats["x"].numeric.as_ref().unwrap().std, None);
    }

    // ==================== Categorical tests ====================

    #[test]
    fn test_top_values_ties_first_seen() {
        let stats = profile(vec![Column::categorical(
            "c",
            ["b", "a", "c", "a", "b", "d"],
        )]);
        let summary = stats["c"].categorical.as_ref().unwrap();

        assert_eq!(summary.cardinality, 4);
        let order: Vec<&str> = summary.top_values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c", "d"]);
        assert_eq!(summary.top_values[0].count, 2);
    }

    #[test]
    fn test_top_k_limit() {
        let values: Vec<String> = (0..15).map(|i| format!("v{i}")).collect();
        let stats = profile(vec![Column::categorical("c", values)]);
        let summary = stats["c"].categorical.as_ref().unwrap();
        assert_eq!(summary.cardinality, 15);
        assert_eq!(summary.top_values.len(), 10);
    }

    #[test]
    fn test_temporal_range() {
        let early = DateTime::from_timestamp(0, 0).unwrap();
        let late = DateTime::from_timestamp(86_400, 0).unwrap();
        let stats = profile(vec![Column::temporal("t", [Some(late), None, Some(early)])]);
        let summary = stats["t"].temporal.as_ref().unwrap();
        assert_eq!(summary.earliest, early);
        assert_eq!(summary.latest, late);
        assert_eq!(stats["t"].unique_count, 2);
    }
}
