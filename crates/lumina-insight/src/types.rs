use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Column kinds and profiling output
// ============================================================================

/// Declared kind of a table column, decided once at table construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Temporal,
    Text,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Temporal => "temporal",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; undefined for a single value.
    pub std: Option<f64>,
    pub q1: f64,
    pub q3: f64,
}

impl NumericSummary {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub cardinality: usize,
    /// Most frequent values, ties in first-seen order.
    pub top_values: Vec<ValueCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalSummary {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

/// Descriptive statistics for one column.
///
/// `numeric` is `None` for a numeric column without any non-null value;
/// such a column is excluded from every numeric analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub name: String,
    pub kind: ColumnKind,
    /// Non-null values.
    pub count: usize,
    pub null_count: usize,
    pub null_ratio: f64,
    pub unique_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categorical: Option<CategoricalSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal: Option<TemporalSummary>,
}

// ============================================================================
// Anomalies and outliers
// ============================================================================

/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Weight used when an anomaly lowers analysis confidence.
    pub fn weight(&self) -> f64 {
        match self {
            Self::Low => 0.25,
            Self::Medium => 0.5,
            Self::High => 0.75,
            Self::Critical => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyMethod {
    Zscore,
    Iqr,
}

/// Values flagged by one method in one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub column: String,
    pub method: AnomalyMethod,
    /// Row indices into the table, capped for reporting.
    pub indices: Vec<usize>,
    /// Values at `indices`.
    pub values: Vec<f64>,
    /// True number of flagged values.
    pub affected_count: usize,
    /// Share of the column's non-null values that were flagged, in percent.
    pub percentage: f64,
    pub severity: Severity,
    pub anomaly_score: f64,
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    Iqr,
    Zscore,
    IsolationForest,
    Lof,
}

impl OutlierMethod {
    pub fn is_multivariate(&self) -> bool {
        matches!(self, Self::IsolationForest | Self::Lof)
    }
}

/// Column label used by records produced over several columns jointly.
pub const MULTIVARIATE: &str = "multivariate";

/// One method's outlier set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierRecord {
    /// Column name, or `"multivariate"` for joint methods.
    pub column: String,
    pub method: OutlierMethod,
    /// Columns a joint method ran over.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    /// Row indices, capped at the sample cap.
    pub indices: Vec<usize>,
    /// Values at `indices` (per-column methods only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<f64>,
    /// Outlier scores at `indices` (joint methods only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scores: Vec<f64>,
    /// True size of the set before capping.
    pub outlier_count: usize,
    pub outlier_percentage: f64,
    pub truncated: bool,
}

/// De-duplicated union of every method's outlier indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierUnion {
    pub indices: Vec<usize>,
    pub methods: Vec<OutlierMethod>,
    /// True size of the union before capping.
    pub outlier_count: usize,
    pub outlier_percentage: f64,
    pub truncated: bool,
}

// ============================================================================
// Relationships, distributions, missing data
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    LinearPositive,
    LinearNegative,
    Weak,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
}

impl CorrelationStrength {
    pub fn from_coefficient(r: f64) -> Self {
        let magnitude = r.abs();
        if magnitude > 0.7 {
            Self::Strong
        } else if magnitude > 0.5 {
            Self::Moderate
        } else {
            Self::Weak
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Positive,
    Negative,
    None,
}

impl Direction {
    pub fn from_coefficient(r: f64) -> Self {
        if r > 0.0 {
            Self::Positive
        } else if r < 0.0 {
            Self::Negative
        } else {
            Self::None
        }
    }
}

/// Pearson correlation of an unordered column pair, `feature_1 < feature_2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub feature_1: String,
    pub feature_2: String,
    /// 0.0 when undefined; `relationship_type` is then `none`.
    pub correlation_coefficient: f64,
    #[serde(default)]
    pub p_value: Option<f64>,
    pub is_significant: bool,
    pub relationship_type: RelationshipType,
    pub strength: CorrelationStrength,
    pub direction: Direction,
    /// Rows where both columns are non-null.
    pub sample_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeLabel {
    Normal,
    RightSkewed,
    LeftSkewed,
    HeavyTailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionRecord {
    pub column: String,
    pub skewness: f64,
    /// Excess kurtosis.
    pub kurtosis: f64,
    /// `None` when the sample was too small to test.
    #[serde(default)]
    pub is_normal: Option<bool>,
    #[serde(default)]
    pub normality_p_value: Option<f64>,
    pub shape_label: ShapeLabel,
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingDataRecord {
    pub null_ratios: BTreeMap<String, f64>,
    pub overall_missing_ratio: f64,
    pub total_missing: usize,
    /// Columns above the high-missingness threshold, in table order.
    pub high_missing_columns: Vec<String>,
    /// Columns with any nulls, most missing first.
    pub columns_with_missing: Vec<String>,
    pub threshold: f64,
}

// ============================================================================
// Data quality
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityRating {
    Good,
    Fair,
    NeedsCleaning,
}

impl QualityRating {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsCleaning => "Needs Cleaning",
        }
    }
}

/// Weighted 0-100 data quality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityReport {
    pub score: f64,
    pub rating: QualityRating,
    pub missing_score: f64,
    pub duplicate_score: f64,
    pub outlier_score: f64,
    pub completeness_score: f64,
    pub duplicate_rows: usize,
    pub duplicate_percentage: f64,
    pub missing_percentage: f64,
    pub summary: String,
}

// ============================================================================
// Skips and explanations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    Profiler,
    Anomaly,
    Outlier,
    Relationship,
    Distribution,
    MissingData,
    Quality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ZeroVariance,
    NoValues,
    InsufficientValues,
    UnsupportedKind,
}

/// A column an analyzer skipped and recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSkip {
    pub analyzer: AnalyzerKind,
    pub column: String,
    pub reason: SkipReason,
}

impl ColumnSkip {
    pub fn new(analyzer: AnalyzerKind, column: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            analyzer,
            column: column.into(),
            reason,
        }
    }
}

/// Records from one analyzer run plus the columns it skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Findings<T> {
    pub records: Vec<T>,
    pub skipped: Vec<ColumnSkip>,
    /// Set when the analyzer could not run on this table at all.
    pub analyzer_skip: Option<AnalyzerSkip>,
}

impl<T> Default for Findings<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
            analyzer_skip: None,
        }
    }
}

impl<T> Findings<T> {
    pub fn skip(&mut self, analyzer: AnalyzerKind, column: impl Into<String>, reason: SkipReason) {
        self.skipped.push(ColumnSkip::new(analyzer, column, reason));
    }

    pub fn skip_analyzer(&mut self, analyzer: AnalyzerKind, reason: impl Into<String>) {
        self.analyzer_skip = Some(AnalyzerSkip {
            analyzer,
            reason: reason.into(),
        });
    }
}

/// An analyzer that produced no records at all for this table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerSkip {
    pub analyzer: AnalyzerKind,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationBackend {
    Unavailable,
    ShapBased,
    LimeBased,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureExplanation {
    pub feature: String,
    /// Signed contribution; ranking uses the absolute value.
    pub importance: f64,
}

// ============================================================================
// Insight result
// ============================================================================

/// Everything one insight generation run produced.
///
/// Built once by [`crate::InsightEngine`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightResult {
    pub row_count: usize,
    pub column_count: usize,
    pub column_stats: BTreeMap<String, ColumnStats>,
    pub anomalies: Vec<AnomalyRecord>,
    pub outliers: Vec<OutlierRecord>,
    #[serde(default)]
    pub outlier_union: Option<OutlierUnion>,
    pub relationships: Vec<RelationshipRecord>,
    pub distributions: Vec<DistributionRecord>,
    pub missing_data: MissingDataRecord,
    pub data_quality: DataQualityReport,
    pub skipped_columns: Vec<ColumnSkip>,
    pub skipped_analyzers: Vec<AnalyzerSkip>,
    pub explanations_available: bool,
    pub explanation_backend: ExplanationBackend,
    #[serde(default)]
    pub explanations: Vec<FeatureExplanation>,
    pub confidence_score: f64,
}

impl InsightResult {
    pub fn finding_count(&self) -> usize {
        self.anomalies.len() + self.outliers.len() + self.relationships.len() + self.distributions.len()
    }

    pub fn skips_for(&self, analyzer: AnalyzerKind) -> impl Iterator<Item = &ColumnSkip> {
        self.skipped_columns
            .iter()
            .filter(move |s| s.analyzer == analyzer)
    }
}

// ============================================================================
// Chart configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Doughnut,
    Scatter,
    Radar,
    Bubble,
    Area,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Pie => "pie",
            Self::Doughnut => "doughnut",
            Self::Scatter => "scatter",
            Self::Radar => "radar",
            Self::Bubble => "bubble",
            Self::Area => "area",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Bar => "Bar Chart",
            Self::Line => "Line Chart",
            Self::Pie => "Pie Chart",
            Self::Doughnut => "Doughnut Chart",
            Self::Scatter => "Scatter Plot",
            Self::Radar => "Radar Chart",
            Self::Bubble => "Bubble Chart",
            Self::Area => "Area Chart",
        }
    }

    /// Pie and doughnut charts color each slice instead of each series.
    pub fn is_circular(&self) -> bool {
        matches!(self, Self::Pie | Self::Doughnut)
    }

    /// Charts whose series are point lists rather than label-aligned values.
    pub fn uses_points(&self) -> bool {
        matches!(self, Self::Scatter | Self::Bubble)
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bar" => Ok(Self::Bar),
            "line" | "timeseries" | "time" => Ok(Self::Line),
            "pie" => Ok(Self::Pie),
            "doughnut" | "donut" => Ok(Self::Doughnut),
            "scatter" => Ok(Self::Scatter),
            "radar" => Ok(Self::Radar),
            "bubble" => Ok(Self::Bubble),
            "area" => Ok(Self::Area),
            other => Err(format!("unknown chart type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,
}

/// One named series.
///
/// Label-aligned charts fill `data`; scatter and bubble charts fill `points`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSeries {
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<Option<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<ChartPoint>,
    pub color: String,
    /// Per-slice colors for pie and doughnut charts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slice_colors: Vec<String>,
    #[serde(default)]
    pub fill: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    pub title: String,
    pub show_legend: bool,
    pub responsive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub chart_type: ChartType,
    pub labels: Vec<String>,
    pub datasets: Vec<DataSeries>,
    pub options: ChartOptions,
}

/// Result of one chart configuration request.
///
/// `Empty` is a valid, renderable chart for a table with zero rows;
/// `Failed` carries no configuration at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartOutcome {
    Generated { config: ChartConfig },
    Empty { config: ChartConfig },
    Failed { code: String, message: String },
}

impl ChartOutcome {
    pub fn config(&self) -> Option<&ChartConfig> {
        match self {
            Self::Generated { config } | Self::Empty { config } => Some(config),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }
}
