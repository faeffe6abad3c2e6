//! Progress events for an insight generation run.
//!
//! The engine emits one [`ProgressUpdate`] as each analyzer finishes. There
//! is no cancellation: a run always ends with `Complete` or `Failed`.
//!
//! # Example
//!
//! ```rust,ignore
//! use lumina_insight::InsightEngine;
//!
//! let result = InsightEngine::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .generate(&table)?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of one insight generation run, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightStage {
    Profiling,
    Anomalies,
    Outliers,
    Relationships,
    Distributions,
    MissingData,
    Quality,
    Complete,
    Failed,
}

impl InsightStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Profiling => "Profiling Columns",
            Self::Anomalies => "Detecting Anomalies",
            Self::Outliers => "Detecting Outliers",
            Self::Relationships => "Analyzing Relationships",
            Self::Distributions => "Analyzing Distributions",
            Self::MissingData => "Analyzing Missing Data",
            Self::Quality => "Scoring Data Quality",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the whole run this stage accounts for. The analyzer stages sum to 1.0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Profiling => 0.15,
            Self::Anomalies => 0.15,
            Self::Outliers => 0.25,
            Self::Relationships => 0.15,
            Self::Distributions => 0.10,
            Self::MissingData => 0.05,
            Self::Quality => 0.15,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress once this stage has finished.
    pub fn completed_progress(&self) -> f32 {
        match self {
            Self::Profiling => 0.15,
            Self::Anomalies => 0.30,
            Self::Outliers => 0.55,
            Self::Relationships => 0.70,
            Self::Distributions => 0.80,
            Self::MissingData => 0.85,
            Self::Quality | Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: InsightStage,
    /// Overall progress (0.0 - 1.0)
    pub progress: f32,
    pub message: String,
}

impl ProgressUpdate {
    /// Update sent when `stage` has finished.
    pub fn finished(stage: InsightStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: stage.completed_progress(),
            message: message.into(),
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::finished(InsightStage::Complete, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::finished(InsightStage::Failed, message)
    }
}

/// Receiver of progress updates.
///
/// Must be `Send + Sync`: with `parallel` enabled the engine runs analyzers
/// on scoped worker threads, though updates are still sent from the calling
/// thread in stage order.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
