//! Set-based outlier detection.
//!
//! Per-column IQR and z-score sets, plus Isolation Forest and LOF run
//! jointly over all usable numeric columns. Every method's set stays
//! separate; [`union_outliers`] merges them on request.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::flag_top_fraction;
use super::isolation_forest::IsolationForest;
use super::lof::local_outlier_factor;
use crate::config::InsightConfig;
use crate::profiler::statistics;
use crate::table::{Column, Table};
use crate::types::{
    AnalyzerKind, AnalyzerSkip, ColumnSkip, MULTIVARIATE, OutlierMethod, OutlierRecord,
    OutlierUnion, SkipReason,
};

/// Full, uncapped outlier set produced by one method.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierSet {
    pub column: String,
    pub method: OutlierMethod,
    pub features: Vec<String>,
    /// Ascending row indices.
    pub indices: Vec<usize>,
    /// Values at `indices` for per-column methods.
    pub values: Vec<f64>,
    /// Scores at `indices` for joint methods.
    pub scores: Vec<f64>,
}

impl OutlierSet {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Reportable record; `outlier_count` is the size before capping.
    pub fn to_record(&self, row_count: usize, cap: usize) -> OutlierRecord {
        let kept = self.indices.len().min(cap);
        OutlierRecord {
            column: self.column.clone(),
            method: self.method,
            features: self.features.clone(),
            indices: self.indices[..kept].to_vec(),
            values: self.values.iter().take(kept).copied().collect(),
            scores: self.scores.iter().take(kept).copied().collect(),
            outlier_count: self.indices.len(),
            outlier_percentage: percentage(self.indices.len(), row_count),
            truncated: self.indices.len() > cap,
        }
    }
}

/// Set union of every method's indices, de-duplicated and capped for reporting.
pub fn union_outliers(sets: &[OutlierSet], row_count: usize, cap: usize) -> OutlierUnion {
    let all: BTreeSet<usize> = sets.iter().flat_map(|s| s.indices.iter().copied()).collect();
    let methods: BTreeSet<OutlierMethod> = sets
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.method)
        .collect();

    OutlierUnion {
        indices: all.iter().take(cap).copied().collect(),
        methods: methods.into_iter().collect(),
        outlier_count: all.len(),
        outlier_percentage: percentage(all.len(), row_count),
        truncated: all.len() > cap,
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Output of one [`OutlierDetector`] run.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierReport {
    /// Non-empty sets only, per-column methods first.
    pub sets: Vec<OutlierSet>,
    pub skipped: Vec<ColumnSkip>,
    pub analyzer_skips: Vec<AnalyzerSkip>,
    row_count: usize,
    sample_cap: usize,
}

impl OutlierReport {
    pub fn records(&self) -> Vec<OutlierRecord> {
        self.sets
            .iter()
            .map(|s| s.to_record(self.row_count, self.sample_cap))
            .collect()
    }

    pub fn union(&self) -> OutlierUnion {
        union_outliers(&self.sets, self.row_count, self.sample_cap)
    }
}

#[derive(Debug, Clone)]
pub struct OutlierDetector {
    zscore_threshold: f64,
    iqr_multiplier: f64,
    contamination: f64,
    min_values: usize,
    multivariate_min_rows: usize,
    lof_neighbors: usize,
    forest: IsolationForest,
    sample_cap: usize,
}

impl Default for OutlierDetector {
    fn default() -> Self {
        Self::new(&InsightConfig::default())
    }
}

impl OutlierDetector {
    pub fn new(config: &InsightConfig) -> Self {
        Self {
            zscore_threshold: config.zscore_threshold,
            iqr_multiplier: config.iqr_multiplier,
            contamination: config.contamination,
            min_values: config.min_anomaly_values,
            multivariate_min_rows: config.multivariate_min_rows,
            lof_neighbors: config.lof_neighbors,
            forest: IsolationForest::new(config.isolation_trees, config.random_seed),
            sample_cap: config.outlier_sample_cap,
        }
    }

    pub fn detect(&self, table: &Table) -> OutlierReport {
        let mut report = OutlierReport {
            sets: Vec::new(),
            skipped: Vec::new(),
            analyzer_skips: Vec::new(),
            row_count: table.row_count(),
            sample_cap: self.sample_cap,
        };

        let mut usable: Vec<&Column> = Vec::new();
        for column in table.numeric_columns() {
            match self.column_sets(column) {
                Ok(sets) => {
                    report.sets.extend(sets.into_iter().filter(|s| !s.is_empty()));
                    usable.push(column);
                }
                Err(reason) => {
                    warn!(column = column.name(), ?reason, "outlier detection skipped column");
                    report
                        .skipped
                        .push(ColumnSkip::new(AnalyzerKind::Outlier, column.name(), reason));
                }
            }
        }

        if usable.is_empty() {
            report.analyzer_skips.push(AnalyzerSkip {
                analyzer: AnalyzerKind::Outlier,
                reason: "no numeric column with variance".to_string(),
            });
        } else if table.row_count() < self.multivariate_min_rows {
            report.analyzer_skips.push(AnalyzerSkip {
                analyzer: AnalyzerKind::Outlier,
                reason: format!(
                    "isolation forest and LOF need at least {} rows",
                    self.multivariate_min_rows
                ),
            });
        } else {
            report.sets.extend(self.multivariate_sets(&usable, table.row_count()));
        }

        debug!(sets = report.sets.len(), "outlier detection finished");
        report
    }

    fn column_sets(&self, column: &Column) -> Result<[OutlierSet; 2], SkipReason> {
        let indexed = column.indexed_values();
        if indexed.is_empty() {
            return Err(SkipReason::NoValues);
        }
        if indexed.len() < self.min_values {
            return Err(SkipReason::InsufficientValues);
        }

        let values: Vec<f64> = indexed.iter().map(|&(_, v)| v).collect();
        let mean = statistics::mean(&values).ok_or(SkipReason::NoValues)?;
        let std = statistics::sample_std(&values, mean);
        if statistics::is_degenerate(std, mean) {
            return Err(SkipReason::ZeroVariance);
        }
        let std = std.unwrap_or(1.0);

        let sorted = statistics::sorted(&values);
        let (lower, upper) = statistics::iqr_bounds(
            statistics::quantile_sorted(&sorted, 0.25),
            statistics::quantile_sorted(&sorted, 0.75),
            self.iqr_multiplier,
        );

        let set = |method: OutlierMethod, flagged: &dyn Fn(f64) -> bool| {
            let hits: Vec<(usize, f64)> = indexed.iter().copied().filter(|&(_, v)| flagged(v)).collect();
            OutlierSet {
                column: column.name().to_string(),
                method,
                features: Vec::new(),
                indices: hits.iter().map(|&(i, _)| i).collect(),
                values: hits.iter().map(|&(_, v)| v).collect(),
                scores: Vec::new(),
            }
        };

        Ok([
            set(OutlierMethod::Iqr, &|v| v < lower || v > upper),
            set(OutlierMethod::Zscore, &|v| {
                ((v - mean) / std).abs() > self.zscore_threshold
            }),
        ])
    }

    /// Isolation Forest and LOF over standardized, mean-imputed features.
    fn multivariate_sets(&self, columns: &[&Column], row_count: usize) -> Vec<OutlierSet> {
        let features: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();
        let matrix = standardized_matrix(columns, row_count);

        let k = self.lof_neighbors.min(row_count - 1);
        let scored = [
            (OutlierMethod::IsolationForest, self.forest.score(&matrix)),
            (OutlierMethod::Lof, local_outlier_factor(&matrix, k)),
        ];

        scored
            .into_iter()
            .filter_map(|(method, scores)| {
                let indices = flag_top_fraction(&scores, self.contamination);
                if indices.is_empty() {
                    return None;
                }
                Some(OutlierSet {
                    column: MULTIVARIATE.to_string(),
                    method,
                    features: features.clone(),
                    scores: indices.iter().map(|&i| scores[i]).collect(),
                    values: Vec::new(),
                    indices,
                })
            })
            .collect()
    }
}

/// Row-major matrix of z-scored features; nulls become the column mean (0).
fn standardized_matrix(columns: &[&Column], row_count: usize) -> Vec<Vec<f64>> {
    let scaled: Vec<Vec<f64>> = columns
        .iter()
        .map(|column| {
            let raw = column.as_numeric().unwrap_or(&[]);
            let present: Vec<f64> = raw.iter().flatten().copied().collect();
            let mean = statistics::mean(&present).unwrap_or(0.0);
            let std = statistics::sample_std(&present, mean)
                .filter(|s| *s > 0.0)
                .unwrap_or(1.0);
            raw.iter()
                .map(|v| v.map_or(0.0, |x| (x - mean) / std))
                .collect()
        })
        .collect();

    (0..row_count)
        .map(|row| scaled.iter().map(|col| col[row]).collect())
        .collect()
}
