//! Analysis reliability score.
//!
//! Confidence measures how far the findings can be trusted given the data's
//! completeness, anomaly load, and size. It says nothing about whether the
//! data is healthy.

use crate::types::AnomalyRecord;

/// Ceiling applied to tables smaller than the low-confidence row count.
pub const SMALL_TABLE_CAP: f64 = 0.3;

const ANOMALY_PENALTY: f64 = 0.3;

/// Confidence in [0, 1].
///
/// `completeness × (1 − anomaly penalty) × (0.5 + 0.5 × size factor)`, where
/// the size factor reaches 1.0 at 1000 rows.
pub fn confidence_score(
    row_count: usize,
    overall_missing_ratio: f64,
    anomalies: &[AnomalyRecord],
    low_confidence_rows: usize,
) -> f64 {
    if row_count == 0 {
        return 0.0;
    }
    let rows = row_count as f64;

    let completeness = (1.0 - overall_missing_ratio).clamp(0.0, 1.0);

    let load: f64 = anomalies
        .iter()
        .map(|a| a.severity.weight() * a.affected_count as f64 / rows)
        .sum();
    let penalty = ANOMALY_PENALTY * load.min(1.0);

    let size_factor = (rows.log10() / 3.0).clamp(0.0, 1.0);

    let mut score = completeness * (1.0 - penalty) * (0.5 + 0.5 * size_factor);
    if row_count < low_confidence_rows {
        score = score.min(SMALL_TABLE_CAP);
    }
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnomalyMethod, Severity};

    fn anomaly(severity: Severity, affected: usize) -> AnomalyRecord {
        AnomalyRecord {
            column: "x".to_string(),
            method: AnomalyMethod::Iqr,
            indices: Vec::new(),
            values: Vec::new(),
            affected_count: affected,
            percentage: 0.0,
            severity,
            anomaly_score: 0.5,
            truncated: false,
        }
    }

    #[test]
    fn test_large_clean_table_is_fully_confident() {
        assert!((confidence_score(1000, 0.0, &[], 10) - 1.0).abs() < 1e-12);
        assert_eq!(confidence_score(50_000, 0.0, &[], 10), 1.0);
    }

    #[test]
    fn test_small_table_capped() {
        let score = confidence_score(5, 0.0, &[], 10);
        assert!(score <= SMALL_TABLE_CAP);
        assert!(score > 0.0);
    }

    #[test]
    fn test_missing_and_anomalies_lower_confidence() {
        let clean = confidence_score(100, 0.0, &[], 10);
        let sparse = confidence_score(100, 0.4, &[], 10);
        let noisy = confidence_score(100, 0.0, &[anomaly(Severity::Critical, 20)], 10);

        assert!(sparse < clean);
        assert!(noisy < clean);
        // 1 − 0.3 × 0.2
        assert!((noisy / clean - 0.94).abs() < 1e-12);
    }

    #[test]
    fn test_bounds() {
        let heavy = vec![anomaly(Severity::Critical, 1_000); 5];
        for rows in [1, 2, 9, 10, 50, 10_000] {
            for missing in [0.0, 0.5, 1.0] {
                let score = confidence_score(rows, missing, &heavy, 10);
                assert!((0.0..=1.0).contains(&score));
            }
        }
        assert_eq!(confidence_score(0, 0.0, &[], 10), 0.0);
    }
}
