//! Anomaly and outlier detection.
//!
//! [`AnomalyDetector`] grades individual values by severity;
//! [`OutlierDetector`] reports labelled index sets, one per method, and can
//! merge them into a capped union view.

mod anomaly;
pub mod isolation_forest;
pub mod lof;
mod outlier;

pub use anomaly::AnomalyDetector;
pub use outlier::{OutlierDetector, OutlierReport, OutlierSet, union_outliers};

/// Indices whose score ranks within the top `contamination` share.
///
/// The cut-off is the score at position `ceil(n * contamination) - 1` of the
/// descending order, and every point scoring at least that much is flagged,
/// so ties at the boundary are kept together.
pub fn flag_top_fraction(scores: &[f64], contamination: f64) -> Vec<usize> {
    let n = scores.len();
    let wanted = (n as f64 * contamination).ceil() as usize;
    if n == 0 || wanted == 0 {
        return Vec::new();
    }

    let mut ranked = scores.to_vec();
    ranked.sort_by(|a, b| b.total_cmp(a));
    let threshold = ranked[wanted.min(n) - 1];

    scores
        .iter()
        .enumerate()
        .filter(|(_, s)| **s >= threshold)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_top_fraction() {
        let scores = [0.1, 0.9, 0.2, 0.8, 0.3];
        assert_eq!(flag_top_fraction(&scores, 0.2), vec![1]);
        assert_eq!(flag_top_fraction(&scores, 0.4), vec![1, 3]);
        assert!(flag_top_fraction(&scores, 0.0).is_empty());
        assert!(flag_top_fraction(&[], 0.5).is_empty());
    }

    #[test]
    fn test_flag_top_fraction_keeps_ties() {
        let scores = [0.5, 0.9, 0.9, 0.1];
        assert_eq!(flag_top_fraction(&scores, 0.25), vec![1, 2]);
    }
}
