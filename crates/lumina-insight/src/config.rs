//! Configuration types for insight generation and chart configuration.
//!
//! Every threshold the analyzers use is a field on [`InsightConfig`], so
//! analyzers are plain values constructed from a config rather than shared
//! globals. Use [`InsightConfig::builder()`] for a validated configuration.

use serde::{Deserialize, Serialize};

use crate::types::ChartType;

/// Which relationship records the aggregator keeps in the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipVerbosity {
    /// Only pairs flagged `is_significant`
    #[default]
    SignificantOnly,
    /// Every computed pair
    All,
}

/// Configuration for the insight engine.
///
/// # Example
///
/// ```rust,ignore
/// use lumina_insight::config::InsightConfig;
///
/// let config = InsightConfig::builder()
///     .zscore_threshold(2.5)
///     .contamination(0.1)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// |z| above which a value is anomalous. Default: 3.0
    pub zscore_threshold: f64,

    /// Multiplier applied to the IQR for the Tukey fences. Default: 1.5
    pub iqr_multiplier: f64,

    /// Expected outlier share for Isolation Forest and LOF. Default: 0.05
    pub contamination: f64,

    /// Minimum |r| for a relationship to be significant. Default: 0.3
    pub correlation_threshold: f64,

    /// p-value cutoff applied when a p-value is available. Default: 0.05
    pub p_value_threshold: f64,

    /// Null ratio above which a column is high-missingness. Default: 0.5
    pub missing_threshold: f64,

    /// Reported sample cap for outlier sets and the union view. Default: 200
    pub outlier_sample_cap: usize,

    /// Reported index cap for anomaly records. Default: 100
    pub anomaly_sample_cap: usize,

    /// Most frequent values kept per categorical column. Default: 10
    pub top_k_categories: usize,

    /// Minimum non-null values before anomaly detection runs. Default: 3
    pub min_anomaly_values: usize,

    /// Minimum rows for Isolation Forest and LOF. Default: 10
    pub multivariate_min_rows: usize,

    /// Neighbour count for LOF, clamped to n - 1. Default: 20
    pub lof_neighbors: usize,

    /// Trees in the isolation forest. Default: 100
    pub isolation_trees: usize,

    /// Seed for every randomized method. Default: 42
    pub random_seed: u64,

    /// Normality is tested only when the sample is larger than this. Default: 20
    pub normality_min_rows: usize,

    /// Tables with fewer rows get their confidence capped at 0.3. Default: 10
    pub low_confidence_rows: usize,

    /// Hard failure below this many rows. Default: 2
    pub min_rows: usize,

    /// Relationship records kept in the result.
    pub relationship_verbosity: RelationshipVerbosity,

    /// Whether the result carries the union-of-methods outlier view. Default: true
    pub include_outlier_union: bool,

    /// Run analyzers on scoped threads. Results are identical either way. Default: false
    pub parallel: bool,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            zscore_threshold: 3.0,
            iqr_multiplier: 1.5,
            contamination: 0.05,
            correlation_threshold: 0.3,
            p_value_threshold: 0.05,
            missing_threshold: 0.5,
            outlier_sample_cap: 200,
            anomaly_sample_cap: 100,
            top_k_categories: 10,
            min_anomaly_values: 3,
            multivariate_min_rows: 10,
            lof_neighbors: 20,
            isolation_trees: 100,
            random_seed: 42,
            normality_min_rows: 20,
            low_confidence_rows: 10,
            min_rows: 2,
            relationship_verbosity: RelationshipVerbosity::default(),
            include_outlier_union: true,
            parallel: false,
        }
    }
}

impl InsightConfig {
    /// Create a new configuration builder.
    pub fn builder() -> InsightConfigBuilder {
        InsightConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [
            ("contamination", self.contamination),
            ("correlation_threshold", self.correlation_threshold),
            ("p_value_threshold", self.p_value_threshold),
            ("missing_threshold", self.missing_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::InvalidThreshold {
                    field: field.to_string(),
                    value,
                });
            }
        }

        for (field, value) in [
            ("zscore_threshold", self.zscore_threshold),
            ("iqr_multiplier", self.iqr_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigValidationError::NonPositive {
                    field: field.to_string(),
                    value,
                });
            }
        }

        for (field, value) in [
            ("outlier_sample_cap", self.outlier_sample_cap),
            ("anomaly_sample_cap", self.anomaly_sample_cap),
            ("top_k_categories", self.top_k_categories),
            ("lof_neighbors", self.lof_neighbors),
            ("isolation_trees", self.isolation_trees),
        ] {
            if value == 0 {
                return Err(ConfigValidationError::ZeroCount(field.to_string()));
            }
        }

        if self.min_rows < 2 {
            return Err(ConfigValidationError::InvalidMinRows(self.min_rows));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid value for '{field}': {value} (must be a positive number)")]
    NonPositive { field: String, value: f64 },

    #[error("Invalid value for '{0}': must be at least 1")]
    ZeroCount(String),

    #[error("Invalid min_rows: {0} (must be at least 2)")]
    InvalidMinRows(usize),
}

/// Builder for [`InsightConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct InsightConfigBuilder {
    config: InsightConfig,
}

macro_rules! setter {
    ($(#[$doc:meta])* $name:ident: $ty:ty) => {
        $(#[$doc])*
        pub fn $name(mut self, value: $ty) -> Self {
            self.config.$name = value;
            self
        }
    };
}

impl InsightConfigBuilder {
    setter!(
        /// Set the z-score anomaly threshold.
        zscore_threshold: f64
    );
    setter!(
        /// Set the IQR fence multiplier.
        iqr_multiplier: f64
    );
    setter!(
        /// Set the contamination share for Isolation Forest and LOF (0.0 - 1.0).
        contamination: f64
    );
    setter!(
        /// Set the |r| significance magnitude (0.0 - 1.0).
        correlation_threshold: f64
    );
    setter!(
        /// Set the correlation p-value cutoff (0.0 - 1.0).
        p_value_threshold: f64
    );
    setter!(
        /// Set the high-missingness null ratio (0.0 - 1.0).
        missing_threshold: f64
    );
    setter!(
        /// Set the reported sample cap for outlier sets.
        outlier_sample_cap: usize
    );
    setter!(anomaly_sample_cap: usize);
    setter!(top_k_categories: usize);
    setter!(min_anomaly_values: usize);
    setter!(multivariate_min_rows: usize);
    setter!(lof_neighbors: usize);
    setter!(isolation_trees: usize);
    setter!(random_seed: u64);
    setter!(normality_min_rows: usize);
    setter!(
        /// Set the row count under which confidence is capped.
        low_confidence_rows: usize
    );
    setter!(
        /// Set the row count under which generation fails outright.
        min_rows: usize
    );
    setter!(relationship_verbosity: RelationshipVerbosity);
    setter!(include_outlier_union: bool);
    setter!(
        /// Run analyzers on scoped worker threads.
        parallel: bool
    );

    /// Build the configuration.
    ///
    /// Returns a validated `InsightConfig` or an error if validation fails.
    pub fn build(self) -> Result<InsightConfig, ConfigValidationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn default_show_legend() -> bool {
    true
}

fn default_bar_top_categories() -> usize {
    20
}

fn default_pie_max_categories() -> usize {
    10
}

fn default_radar_max_columns() -> usize {
    6
}

/// Pass-through options for one chart configuration request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    /// Force a chart type instead of choosing one from the column signature.
    #[serde(default)]
    pub chart_type: Option<ChartType>,

    /// Column used for labels.
    #[serde(default)]
    pub x_column: Option<String>,

    /// Columns used for data series.
    #[serde(default)]
    pub y_columns: Vec<String>,

    /// Chart title. Derived from column names when absent.
    #[serde(default)]
    pub title: Option<String>,

    /// Default: true
    #[serde(default = "default_show_legend")]
    pub show_legend: bool,

    /// Prefer a bar chart over a pie for small categorical comparisons.
    #[serde(default)]
    pub categorical_comparison: bool,

    /// Categories kept before the rest is folded into "Other". Default: 20
    #[serde(default = "default_bar_top_categories")]
    pub bar_top_categories: usize,

    /// Largest cardinality still drawn as a pie. Default: 10
    #[serde(default = "default_pie_max_categories")]
    pub pie_max_categories: usize,

    /// Most numeric columns drawn as a radar. Default: 6
    #[serde(default = "default_radar_max_columns")]
    pub radar_max_columns: usize,
}

impl Default for ChartRequest {
    fn default() -> Self {
        Self {
            chart_type: None,
            x_column: None,
            y_columns: Vec::new(),
            title: None,
            show_legend: default_show_legend(),
            categorical_comparison: false,
            bar_top_categories: default_bar_top_categories(),
            pie_max_categories: default_pie_max_categories(),
            radar_max_columns: default_radar_max_columns(),
        }
    }
}

impl ChartRequest {
    pub fn with_chart_type(mut self, chart_type: ChartType) -> Self {
        self.chart_type = Some(chart_type);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_columns(mut self, x: impl Into<String>, ys: &[&str]) -> Self {
        self.x_column = Some(x.into());
        self.y_columns = ys.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn categorical_comparison(mut self, enabled: bool) -> Self {
        self.categorical_comparison = enabled;
        self
    }

    pub fn show_legend(mut self, show: bool) -> Self {
        self.show_legend = show;
        self
    }
}
