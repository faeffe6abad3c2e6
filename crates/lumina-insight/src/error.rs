//! Error types for the insight engine.
//!
//! Only hard failures live here: table construction problems, insufficient
//! data and chart generation failures. Column-level problems an analyzer can
//! recover from (zero variance, unsupported kinds) are recorded as
//! [`crate::types::ColumnSkip`] entries in the result instead.
//!
//! Errors serialize as `{ "code", "message" }` so a persistence sink can
//! store a failed run next to successful ones.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// The main error type for insight generation.
#[derive(Error, Debug)]
pub enum InsightError {
    /// Too few rows (or usable values) for the requested analysis.
    #[error("Insufficient data: {reason} (required {required}, found {actual})")]
    InsufficientData {
        required: usize,
        actual: usize,
        reason: String,
    },

    /// Numeric column with zero variance.
    #[error("Column '{column}' has zero variance")]
    DegenerateColumn { column: String },

    /// Analyzer received a column kind it cannot process.
    #[error("{analyzer} cannot process column '{column}' of kind {kind}")]
    UnsupportedColumnType {
        analyzer: String,
        column: String,
        kind: String,
    },

    /// No chart rule matched and the fallback could not be satisfied.
    #[error("Chart generation failed: {0}")]
    ChartGeneration(String),

    /// Optional capability (e.g. model explanations) is not present.
    #[error("Optional dependency unavailable: {0}")]
    OptionalDependencyUnavailable(String),

    /// Table shape violated (unequal lengths, duplicate names).
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<InsightError>,
    },
}

impl InsightError {
    /// Shorthand for an [`InsightError::InsufficientData`] error.
    pub fn insufficient(required: usize, actual: usize, reason: impl Into<String>) -> Self {
        InsightError::InsufficientData {
            required,
            actual,
            reason: reason.into(),
        }
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        InsightError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for callers that persist or display failures.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientData { .. } => "INSUFFICIENT_DATA",
            Self::DegenerateColumn { .. } => "DEGENERATE_COLUMN",
            Self::UnsupportedColumnType { .. } => "UNSUPPORTED_COLUMN_TYPE",
            Self::ChartGeneration(_) => "CHART_GENERATION_FAILED",
            Self::OptionalDependencyUnavailable(_) => "OPTIONAL_DEPENDENCY_UNAVAILABLE",
            Self::InvalidTable(_) => "INVALID_TABLE",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// True for errors that analyzers recover from locally.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::DegenerateColumn { .. } | Self::UnsupportedColumnType { .. } => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }

    /// True when the error is an insufficient-data failure.
    pub fn is_insufficient_data(&self) -> bool {
        match self {
            Self::InsufficientData { .. } => true,
            Self::WithContext { source, .. } => source.is_insufficient_data(),
            _ => false,
        }
    }
}

impl Serialize for InsightError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("InsightError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for insight operations.
pub type Result<T> = std::result::Result<T, InsightError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| InsightError::Polars(e).with_context(context))
    }
}
