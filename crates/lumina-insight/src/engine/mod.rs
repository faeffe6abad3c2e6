//! Insight aggregation.
//!
//! [`InsightEngine`] runs the profiler and every analyzer over one table,
//! applies presentation filtering, and scores confidence.

mod builder;
pub mod confidence;
pub mod progress;

pub use builder::{InsightEngine, InsightEngineBuilder};
pub use confidence::confidence_score;
pub use progress::{ClosureProgressReporter, InsightStage, ProgressReporter, ProgressUpdate};
