//! Threshold-based anomaly detection (z-score and IQR) per numeric column.

use tracing::{debug, warn};

use crate::config::InsightConfig;
use crate::profiler::statistics;
use crate::table::{Column, Table};
use crate::types::{
    AnalyzerKind, AnomalyMethod, AnomalyRecord, Findings, Severity, SkipReason,
};

/// Flags values far from a column's centre.
///
/// Each `(column, method)` pair yields at most one [`AnomalyRecord`]; a
/// column with nothing flagged yields none.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    zscore_threshold: f64,
    iqr_multiplier: f64,
    min_values: usize,
    sample_cap: usize,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(&InsightConfig::default())
    }
}

/// One flagged value before aggregation.
struct Flag {
    index: usize,
    value: f64,
    severity: Severity,
    score: f64,
}

impl AnomalyDetector {
    pub fn new(config: &InsightConfig) -> Self {
        Self {
            zscore_threshold: config.zscore_threshold,
            iqr_multiplier: config.iqr_multiplier,
            min_values: config.min_anomaly_values,
            sample_cap: config.anomaly_sample_cap,
        }
    }

    pub fn detect(&self, table: &Table) -> Findings<AnomalyRecord> {
        let mut findings = Findings::default();
        if table.numeric_columns().next().is_none() {
            findings.skip_analyzer(AnalyzerKind::Anomaly, "no numeric columns");
            return findings;
        }

        for column in table.numeric_columns() {
            match self.detect_column(column) {
                Ok(records) => findings.records.extend(records),
                Err(reason) => {
                    warn!(column = column.name(), ?reason, "anomaly detection skipped column");
                    findings.skip(AnalyzerKind::Anomaly, column.name(), reason);
                }
            }
        }

        debug!(records = findings.records.len(), "anomaly detection finished");
        findings
    }

    fn detect_column(&self, column: &Column) -> Result<Vec<AnomalyRecord>, SkipReason> {
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
        let q1 = statistics::quantile_sorted(&sorted, 0.25);
        let q3 = statistics::quantile_sorted(&sorted, 0.75);
        let (lower, upper) = statistics::iqr_bounds(q1, q3, self.iqr_multiplier);
        let (extreme_lower, extreme_upper) = statistics::iqr_bounds(q1, q3, 3.0);

        let mut z_flags = Vec::new();
        let mut iqr_flags = Vec::new();

        for &(index, value) in &indexed {
            let z = ((value - mean) / std).abs();
            let extreme = value < extreme_lower || value > extreme_upper;
            let z_flagged = z > self.zscore_threshold;

            if z_flagged {
                z_flags.push(Flag {
                    index,
                    value,
                    severity: classify(z, extreme),
                    score: (z / 6.0).min(1.0),
                });
            }

            if value < lower || value > upper {
                let (severity, score) = if z_flagged {
                    (classify(z, extreme), (z / 6.0).min(1.0))
                } else if extreme {
                    (Severity::Critical, 0.5)
                } else {
                    (Severity::Medium, 0.5)
                };
                iqr_flags.push(Flag {
                    index,
                    value,
                    severity,
                    score,
                });
            }
        }

        let non_null = indexed.len();
        Ok([
            (AnomalyMethod::Zscore, z_flags),
            (AnomalyMethod::Iqr, iqr_flags),
        ]
        .into_iter()
        .filter_map(|(method, flags)| self.to_record(column.name(), method, flags, non_null))
        .collect())
    }

    fn to_record(
        &self,
        column: &str,
        method: AnomalyMethod,
        flags: Vec<Flag>,
        non_null: usize,
    ) -> Option<AnomalyRecord> {
        let severity = flags.iter().map(|f| f.severity).max()?;
        let anomaly_score = flags.iter().map(|f| f.score).fold(0.0, f64::max);
        let affected_count = flags.len();
        let truncated = affected_count > self.sample_cap;
        let kept = &flags[..affected_count.min(self.sample_cap)];

        Some(AnomalyRecord {
            column: column.to_string(),
            method,
            indices: kept.iter().map(|f| f.index).collect(),
            values: kept.iter().map(|f| f.value).collect(),
            affected_count,
            percentage: affected_count as f64 / non_null as f64 * 100.0,
            severity,
            anomaly_score,
            truncated,
        })
    }
}

/// Severity of a single value from its |z| and whether it lies beyond 3×IQR.
fn classify(abs_z: f64, extreme: bool) -> Severity {
    if abs_z > 5.0 || extreme {
        Severity::Critical
    } else if abs_z > 4.0 {
        Severity::High
    } else if abs_z > 3.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}
