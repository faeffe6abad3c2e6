//! Data quality scoring.
//!
//! Combines missing cells, duplicate rows, IQR outliers, and fully empty
//! columns into one 0-100 score with a coarse rating.

mod scorer;

pub use scorer::DataQualityScorer;
