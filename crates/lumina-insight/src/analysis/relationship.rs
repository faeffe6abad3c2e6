//! Pairwise Pearson correlation between numeric columns.

use tracing::{debug, warn};

use super::varying_values;
use crate::config::InsightConfig;
use crate::profiler::statistics;
use crate::table::{Column, Table};
use crate::types::{
    AnalyzerKind, CorrelationStrength, Direction, Findings, RelationshipRecord, RelationshipType,
};

/// Computes every unordered numeric column pair exactly once.
///
/// Returns all pairs regardless of significance; filtering for
/// presentation happens in the engine.
#[derive(Debug, Clone)]
pub struct RelationshipAnalyzer {
    threshold: f64,
    p_value_threshold: f64,
}

impl Default for RelationshipAnalyzer {
    fn default() -> Self {
        Self::new(&InsightConfig::default())
    }
}

impl RelationshipAnalyzer {
    pub fn new(config: &InsightConfig) -> Self {
        Self {
            threshold: config.correlation_threshold,
            p_value_threshold: config.p_value_threshold,
        }
    }

    pub fn analyze(&self, table: &Table) -> Findings<RelationshipRecord> {
        let mut findings = Findings::default();

        let mut usable: Vec<&Column> = Vec::new();
        for column in table.numeric_columns() {
            match varying_values(column) {
                Ok(_) => usable.push(column),
                Err(reason) => {
                    warn!(column = column.name(), ?reason, "relationship analysis skipped column");
                    findings.skip(AnalyzerKind::Relationship, column.name(), reason);
                }
            }
        }

        if usable.len() < 2 {
            findings.skip_analyzer(
                AnalyzerKind::Relationship,
                format!("needs two numeric columns with variance, found {}", usable.len()),
            );
            return findings;
        }

        usable.sort_by(|a, b| a.name().cmp(b.name()));
        for (i, left) in usable.iter().enumerate() {
            for right in &usable[i + 1..] {
                findings.records.push(self.pair(left, right));
            }
        }

        debug!(pairs = findings.records.len(), "relationship analysis finished");
        findings
    }

    /// Correlation over rows where both columns are non-null.
    fn pair(&self, left: &Column, right: &Column) -> RelationshipRecord {
        let (xs, ys): (Vec<f64>, Vec<f64>) = match (left.as_numeric(), right.as_numeric()) {
            (Some(a), Some(b)) => a
                .iter()
                .zip(b)
                .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                .unzip(),
            _ => (Vec::new(), Vec::new()),
        };
        let n = xs.len();

        let r = statistics::pearson(&xs, &ys);
        let p_value = r.and_then(|r| statistics::correlation_p_value(r, n));
        let coefficient = r.unwrap_or(0.0);

        RelationshipRecord {
            feature_1: left.name().to_string(),
            feature_2: right.name().to_string(),
            correlation_coefficient: coefficient,
            p_value,
            is_significant: r.is_some() && self.is_significant(coefficient, p_value),
            relationship_type: self.classify(r),
            strength: CorrelationStrength::from_coefficient(coefficient),
            direction: Direction::from_coefficient(coefficient),
            sample_size: n,
        }
    }

    /// Magnitude gate, plus the p-value cutoff when a p-value exists.
    fn is_significant(&self, r: f64, p_value: Option<f64>) -> bool {
        r.abs() >= self.threshold && p_value.is_none_or(|p| p < self.p_value_threshold)
    }

    fn classify(&self, r: Option<f64>) -> RelationshipType {
        match r {
            Some(r) if r >= self.threshold => RelationshipType::LinearPositive,
            Some(r) if r <= -self.threshold => RelationshipType::LinearNegative,
            Some(r) if r != 0.0 => RelationshipType::Weak,
            _ => RelationshipType::None,
        }
    }
}
