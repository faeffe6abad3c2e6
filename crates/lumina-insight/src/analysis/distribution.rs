//! Distribution shape per numeric column.

use tracing::{debug, warn};

use super::varying_values;
use crate::config::InsightConfig;
use crate::profiler::statistics;
use crate::table::Table;
use crate::types::{AnalyzerKind, DistributionRecord, Findings, ShapeLabel, SkipReason};

const SKEW_LIMIT: f64 = 0.5;
const KURTOSIS_LIMIT: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct DistributionAnalyzer {
    normality_min_rows: usize,
    alpha: f64,
}

impl Default for DistributionAnalyzer {
    fn default() -> Self {
        Self::new(&InsightConfig::default())
    }
}

impl DistributionAnalyzer {
    pub fn new(config: &InsightConfig) -> Self {
        Self {
            normality_min_rows: config.normality_min_rows,
            alpha: config.p_value_threshold,
        }
    }

    pub fn analyze(&self, table: &Table) -> Findings<DistributionRecord> {
        let mut findings = Findings::default();
        if table.numeric_columns().next().is_none() {
            findings.skip_analyzer(AnalyzerKind::Distribution, "no numeric columns");
            return findings;
        }

        for column in table.numeric_columns() {
            let values = match varying_values(column) {
                Ok(values) => values,
                Err(reason) => {
                    warn!(column = column.name(), ?reason, "distribution analysis skipped column");
                    findings.skip(AnalyzerKind::Distribution, column.name(), reason);
                    continue;
                }
            };

            let (Some(skewness), Some(kurtosis)) = (
                statistics::skewness(&values),
                statistics::excess_kurtosis(&values),
            ) else {
                findings.skip(AnalyzerKind::Distribution, column.name(), SkipReason::ZeroVariance);
                continue;
            };

            let p_value = if values.len() > self.normality_min_rows {
                statistics::dagostino_pearson(&values)
            } else {
                None
            };

            debug!(column = column.name(), skewness, kurtosis, ?p_value, "distribution");
            findings.records.push(DistributionRecord {
                column: column.name().to_string(),
                skewness,
                kurtosis,
                is_normal: p_value.map(|p| p > self.alpha),
                normality_p_value: p_value,
                shape_label: shape_label(skewness, kurtosis),
                sample_size: values.len(),
            });
        }

        findings
    }
}

/// Skew labels win over heavy tails.
pub fn shape_label(skewness: f64, kurtosis: f64) -> ShapeLabel {
    if skewness > SKEW_LIMIT {
        ShapeLabel::RightSkewed
    } else if skewness < -SKEW_LIMIT {
        ShapeLabel::LeftSkewed
    } else if kurtosis.abs() > KURTOSIS_LIMIT {
        ShapeLabel::HeavyTailed
    } else {
        ShapeLabel::Normal
    }
}
