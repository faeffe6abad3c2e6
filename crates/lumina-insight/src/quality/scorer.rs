use tracing::debug;

use crate::profiler::statistics;
use crate::table::Table;
use crate::types::{DataQualityReport, MissingDataRecord, QualityRating};

const MISSING_WEIGHT: f64 = 0.30;
const DUPLICATE_WEIGHT: f64 = 0.20;
const OUTLIER_WEIGHT: f64 = 0.10;
const COMPLETENESS_WEIGHT: f64 = 0.40;

/// Points lost per percent of missing cells.
const MISSING_PENALTY: f64 = 3.0;
/// Points lost per percent of duplicate rows.
const DUPLICATE_PENALTY: f64 = 2.0;
/// Largest deduction a single numeric column can cause.
const OUTLIER_COLUMN_CAP: f64 = 10.0;

/// Weighted 0-100 score of how clean a table is.
#[derive(Debug, Clone, Default)]
pub struct DataQualityScorer;

impl DataQualityScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, table: &Table, missing: &MissingDataRecord) -> DataQualityReport {
        let rows = table.row_count();
        let columns = table.column_count();

        let missing_percentage = missing.overall_missing_ratio * 100.0;
        let missing_score = (100.0 - missing_percentage * MISSING_PENALTY).max(0.0);

        let duplicate_rows = table.duplicate_row_count();
        let duplicate_percentage = percentage(duplicate_rows, rows);
        let duplicate_score = (100.0 - duplicate_percentage * DUPLICATE_PENALTY).max(0.0);

        let outlier_score = (100.0 - outlier_deductions(table)).max(0.0);

        let empty_columns = table
            .columns()
            .iter()
            .filter(|c| !c.is_empty() && c.null_count() == c.len())
            .count();
        let completeness_score = 100.0 - percentage(empty_columns, columns);

        let score = round2(
            missing_score * MISSING_WEIGHT
                + duplicate_score * DUPLICATE_WEIGHT
                + outlier_score * OUTLIER_WEIGHT
                + completeness_score * COMPLETENESS_WEIGHT,
        );
        let rating = rate(missing_percentage, duplicate_percentage);
        debug!(score, ?rating, "data quality scored");

        DataQualityReport {
            score,
            rating,
            missing_score,
            duplicate_score,
            outlier_score,
            completeness_score,
            duplicate_rows,
            duplicate_percentage,
            missing_percentage,
            summary: format!(
                "Dataset with {rows} rows and {columns} columns. Missing values: {missing_percentage:.1}%. \
                 Duplicate rows: {duplicate_percentage:.1}%. Overall quality: {}.",
                rating.display_name()
            ),
        }
    }
}

/// Sum over numeric columns of the IQR outlier share of all rows, capped per column.
fn outlier_deductions(table: &Table) -> f64 {
    let rows = table.row_count();
    table
        .numeric_columns()
        .map(|column| {
            let values: Vec<f64> = column.indexed_values().into_iter().map(|(_, v)| v).collect();
            if values.is_empty() {
                return 0.0;
            }
            let sorted = statistics::sorted(&values);
            let (lower, upper) = statistics::iqr_bounds(
                statistics::quantile_sorted(&sorted, 0.25),
                statistics::quantile_sorted(&sorted, 0.75),
                1.5,
            );
            let count = values.iter().filter(|v| **v < lower || **v > upper).count();
            percentage(count, rows).min(OUTLIER_COLUMN_CAP)
        })
        .sum()
}

fn rate(missing_percentage: f64, duplicate_percentage: f64) -> QualityRating {
    if missing_percentage > 20.0 || duplicate_percentage > 10.0 {
        QualityRating::NeedsCleaning
    } else if missing_percentage > 5.0 || duplicate_percentage > 5.0 {
        QualityRating::Fair
    } else {
        QualityRating::Good
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
