//! Insight Generation and Chart Configuration
//!
//! Automated statistical findings and chart configurations for tabular
//! datasets, built on Polars.
//!
//! # Overview
//!
//! Given an immutable [`Table`], the library produces:
//!
//! - **Column Statistics**: counts, moments, quantiles, top values, time ranges
//! - **Anomalies**: z-score and IQR detection with severity scoring
//! - **Outliers**: IQR, z-score, Isolation Forest and Local Outlier Factor,
//!   plus a deduplicated union across methods
//! - **Relationships**: pairwise Pearson correlation with significance testing
//! - **Distributions**: skewness, kurtosis and a normality test
//! - **Missing Data**: per-column and overall missingness
//! - **Data Quality**: a weighted 0-100 quality score
//! - **Charts**: a renderer-agnostic chart configuration chosen from the
//!   column-type signature
//!
//! Every analyzer is a pure function over the table; the result is one
//! JSON-serializable [`InsightResult`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lumina_insight::{ChartConfigGenerator, ChartRequest, InsightEngine, Table};
//! use polars::prelude::*;
//!
//! let df = CsvReadOptions::default()
//!     .try_into_reader_with_file_path(Some("sales.csv".into()))?
//!     .finish()?;
//! let table = Table::from_dataframe(&df)?;
//!
//! let insights = InsightEngine::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .generate(&table)?;
//!
//! println!("{} findings, confidence {:.2}", insights.finding_count(), insights.confidence_score);
//!
//! let chart = ChartConfigGenerator::new().generate(&table, &ChartRequest::default());
//! println!("{}", serde_json::to_string_pretty(&chart)?);
//! ```
//!
//! # Configuration
//!
//! Use [`InsightConfig`] to tune detection thresholds:
//!
//! ```rust,ignore
//! use lumina_insight::{InsightConfig, RelationshipVerbosity};
//!
//! let config = InsightConfig::builder()
//!     .zscore_threshold(2.5)
//!     .correlation_threshold(0.5)
//!     .relationship_verbosity(RelationshipVerbosity::All)
//!     .parallel(true)
//!     .build()?;
//! ```
//!
//! # Explanations
//!
//! SHAP/LIME explanations are an optional capability behind
//! [`ExplanationProvider`]. Without one, results report
//! `explanations_available = false`.

pub mod analysis;
pub mod charts;
pub mod config;
pub mod detectors;
pub mod engine;
pub mod error;
pub mod explain;
pub mod profiler;
pub mod quality;
pub mod table;
pub mod types;

// Re-exports for convenient access
pub use analysis::{DistributionAnalyzer, MissingDataAnalyzer, RelationshipAnalyzer};
pub use charts::{ChartConfigGenerator, PALETTE, explanation_chart};
pub use config::{
    ChartRequest, ConfigValidationError, InsightConfig, InsightConfigBuilder, RelationshipVerbosity,
};
pub use detectors::{AnomalyDetector, OutlierDetector, OutlierReport, union_outliers};
pub use engine::{
    ClosureProgressReporter, InsightEngine, InsightEngineBuilder, InsightStage, ProgressReporter,
    ProgressUpdate,
};
pub use error::{InsightError, Result, ResultExt};
pub use explain::{ExplanationProvider, UnavailableExplainer};
pub use profiler::StatisticalProfiler;
pub use quality::DataQualityScorer;
pub use table::{Column, ColumnData, Table};
pub use types::{
    AnalyzerKind, AnalyzerSkip, AnomalyMethod, AnomalyRecord, ChartConfig, ChartOptions,
    ChartOutcome, ChartPoint, ChartType, ColumnKind, ColumnSkip, ColumnStats, CorrelationStrength,
    DataQualityReport, DataSeries, Direction, DistributionRecord, ExplanationBackend,
    FeatureExplanation, InsightResult, MissingDataRecord, OutlierMethod, OutlierRecord,
    OutlierUnion, QualityRating, RelationshipRecord, RelationshipType, Severity, ShapeLabel,
    SkipReason,
};

static_assertions::assert_impl_all!(Table: Send, Sync);
static_assertions::assert_impl_all!(InsightResult: Send, Sync);
static_assertions::assert_impl_all!(ChartConfig: Send, Sync);
