//! Column relationships, distribution shape, and missingness.

mod distribution;
mod missing;
mod relationship;

pub use distribution::DistributionAnalyzer;
pub use missing::MissingDataAnalyzer;
pub use relationship::RelationshipAnalyzer;

use crate::profiler::statistics;
use crate::table::Column;
use crate::types::SkipReason;

/// Non-null values of a numeric column that has spread, or why it has none.
fn varying_values(column: &Column) -> Result<Vec<f64>, SkipReason> {
    let values: Vec<f64> = column.indexed_values().into_iter().map(|(_, v)| v).collect();
    let mean = statistics::mean(&values).ok_or(SkipReason::NoValues)?;
    if values.len() < 2 {
        return Err(SkipReason::InsufficientValues);
    }
    if statistics::is_degenerate(statistics::sample_std(&values, mean), mean) {
        return Err(SkipReason::ZeroVariance);
    }
    Ok(values)
}
