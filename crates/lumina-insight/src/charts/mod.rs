//! Chart configuration generation.
//!
//! [`ChartConfigGenerator`] picks a chart type from the table's column
//! signature (or honors an explicit [`ChartRequest`]) and emits a
//! renderer-agnostic [`ChartConfig`]. It does not read an `InsightResult`.
//!
//! # Example
//!
//! ```rust,ignore
//! use lumina_insight::{ChartConfigGenerator, ChartOutcome, ChartRequest};
//!
//! match ChartConfigGenerator::new().generate(&table, &ChartRequest::default()) {
//!     ChartOutcome::Generated { config } => println!("{}", config.chart_type),
//!     ChartOutcome::Empty { .. } => println!("no rows to chart"),
//!     ChartOutcome::Failed { code, message } => eprintln!("{code}: {message}"),
//! }
//! ```

mod series;
mod signature;

use polars::prelude::DataFrame;
use tracing::{debug, warn};

use crate::config::ChartRequest;
use crate::error::{InsightError, Result};
use crate::table::Table;
use crate::types::{ChartConfig, ChartOptions, ChartOutcome, ChartType, DataSeries, FeatureExplanation};

use signature::Selection;

/// Series colors, assigned by series position.
pub const PALETTE: [&str; 6] = ["#00f3ff", "#bd00ff", "#ff00aa", "#00ff9d", "#ffaa00", "#ff6b6b"];

/// Features shown in an explanation chart.
pub const EXPLANATION_TOP_FEATURES: usize = 20;

#[derive(Debug, Clone, Copy, Default)]
pub struct ChartConfigGenerator;

impl ChartConfigGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Build a chart configuration for `table`.
    ///
    /// Never returns a partially populated config: selection problems come
    /// back as [`ChartOutcome::Failed`], a table with no rows as
    /// [`ChartOutcome::Empty`].
    pub fn generate(&self, table: &Table, request: &ChartRequest) -> ChartOutcome {
        match self.try_generate(table, request) {
            Ok(config) if table.row_count() == 0 => ChartOutcome::Empty { config },
            Ok(config) => ChartOutcome::Generated { config },
            Err(err) => {
                warn!(code = err.error_code(), "Chart generation failed: {}", err);
                ChartOutcome::Failed {
                    code: err.error_code().to_string(),
                    message: err.to_string(),
                }
            }
        }
    }

    /// Like [`generate`](Self::generate), converting the frame first.
    /// A frame that cannot be converted yields a failed outcome.
    pub fn generate_from_dataframe(&self, df: &DataFrame, request: &ChartRequest) -> ChartOutcome {
        match Table::from_dataframe(df) {
            Ok(table) => self.generate(&table, request),
            Err(err) => {
                let err = InsightError::ChartGeneration(format!("dataset could not be read: {err}"));
                ChartOutcome::Failed {
                    code: err.error_code().to_string(),
                    message: err.to_string(),
                }
            }
        }
    }

    /// Build a chart configuration, surfacing selection errors.
    pub fn try_generate(&self, table: &Table, request: &ChartRequest) -> Result<ChartConfig> {
        let selection = signature::select(table, request)?;
        debug!(
            chart_type = %selection.chart_type,
            x = selection.x.map(|c| c.name()),
            series = selection.ys.len(),
            "Selected chart"
        );

        let (labels, datasets) = series::populate(&selection, table.row_count(), request);
        Ok(ChartConfig {
            chart_type: selection.chart_type,
            labels,
            datasets,
            options: ChartOptions {
                title: request.title.clone().unwrap_or_else(|| default_title(&selection)),
                show_legend: request.show_legend,
                responsive: true,
            },
        })
    }
}

fn default_title(selection: &Selection<'_>) -> String {
    let name = selection.chart_type.display_name();
    let x = selection.x.map(|c| c.name()).unwrap_or("row");
    let ys: Vec<&str> = selection.ys.iter().map(|c| c.name()).collect();

    match (selection.chart_type, ys.as_slice()) {
        (_, []) => format!("{name} - count by {x}"),
        (ChartType::Scatter, _) => format!("{name} - {x} vs {}", ys.join(", ")),
        (ChartType::Bubble, [y, size, ..]) => format!("{name} - {x} vs {y} (size: {size})"),
        (chart_type, [first, ..]) if chart_type.is_circular() => format!("{name} - {first}"),
        _ => format!("{name} - {}", ys.join(", ")),
    }
}

/// Bar chart of the most important features by absolute importance.
///
/// Ties keep their input order.
pub fn explanation_chart(explanations: &[FeatureExplanation], title: impl Into<String>) -> ChartConfig {
    let mut ranked: Vec<&FeatureExplanation> = explanations.iter().collect();
    ranked.sort_by(|a, b| b.importance.abs().total_cmp(&a.importance.abs()));
    ranked.truncate(EXPLANATION_TOP_FEATURES);

    ChartConfig {
        chart_type: ChartType::Bar,
        labels: ranked.iter().map(|e| e.feature.clone()).collect(),
        datasets: vec![DataSeries {
            label: "importance".to_string(),
            data: ranked.iter().map(|e| Some(e.importance)).collect(),
            points: Vec::new(),
            color: series::color(0),
            slice_colors: Vec::new(),
            fill: false,
        }],
        options: ChartOptions {
            title: title.into(),
            show_legend: false,
            responsive: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use pretty_assertions::assert_eq;

    fn sales() -> Table {
        Table::new(vec![
            Column::categorical("region", ["north", "south", "east", "north", "west", "central"]),
            Column::numeric("revenue", [10.0, 20.0, 30.0, 5.0, 40.0, 50.0]),
        ])
        .unwrap()
    }

    fn generated(outcome: ChartOutcome) -> ChartConfig {
        match outcome {
            ChartOutcome::Generated { config } => config,
            other => panic!("expected generated chart, got {other:?}"),
        }
    }

    // ==================== Generation tests ====================

    #[test]
    fn test_pie_labels_first_seen() {
        let config = generated(ChartConfigGenerator::new().generate(&sales(), &ChartRequest::default()));

        assert_eq!(config.chart_type, ChartType::Pie);
        assert_eq!(config.labels, vec!["north", "south", "east", "west", "central"]);
        assert_eq!(
            config.datasets[0].data,
            vec![Some(15.0), Some(20.0), Some(30.0), Some(40.0), Some(50.0)]
        );
        assert_eq!(config.options.title, "Pie Chart - revenue");
        assert!(config.options.show_legend);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let generator = ChartConfigGenerator::new();
        let request = ChartRequest::default();
        let first = serde_json::to_string(&generator.generate(&sales(), &request)).unwrap();
        let second = serde_json::to_string(&generator.generate(&sales(), &request)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_request_pass_through() {
        let request = ChartRequest::default()
            .with_title("Revenue")
            .show_legend(false)
            .categorical_comparison(true);
        let config = generated(ChartConfigGenerator::new().generate(&sales(), &request));

        assert_eq!(config.chart_type, ChartType::Bar);
        assert_eq!(config.options.title, "Revenue");
        assert!(!config.options.show_legend);
        assert!(config.datasets[0].slice_colors.is_empty());
    }

    #[test]
    fn test_bar_truncates_to_other() {
        let labels: Vec<String> = (0..30).map(|i| format!("sku-{i}")).collect();
        let table = Table::new(vec![
            Column::categorical("sku", labels),
            Column::numeric("units", (0..30).map(|i| i as f64)),
        ])
        .unwrap();
        let config = generated(ChartConfigGenerator::new().generate(&table, &ChartRequest::default()));

        assert_eq!(config.chart_type, ChartType::Bar);
        assert_eq!(config.labels.len(), 21);
        assert_eq!(config.labels[0], "sku-10");
        assert_eq!(config.labels.last().map(String::as_str), Some("Other"));
        // 0 + 1 + ... + 9
        assert_eq!(config.datasets[0].data.last(), Some(&Some(45.0)));
    }

    #[test]
    fn test_fallback_bar_keeps_every_row() {
        let columns = (0..7)
            .map(|j| Column::numeric(format!("m{j}"), (0..30).map(|i| (i * (j + 1)) as f64)))
            .collect();
        let table = Table::new(columns).unwrap();
        let config = generated(ChartConfigGenerator::new().generate(&table, &ChartRequest::default()));

        assert_eq!(config.chart_type, ChartType::Bar);
        assert_eq!(config.labels.len(), 30);
        assert_eq!(config.labels[29], "29");
        assert_eq!(config.datasets.len(), 1);
        assert_eq!(config.datasets[0].label, "m0");
        assert_eq!(config.datasets[0].data[29], Some(29.0));
    }

    #[test]
    fn test_fallback_bar_over_two_categoricals_not_truncated() {
        let table = Table::new(vec![
            Column::categorical("sku", (0..30).map(|i| format!("sku-{i}"))),
            Column::categorical("shelf", (0..30).map(|i| format!("s{}", i % 3))),
            Column::numeric("units", (0..30).map(|i| i as f64)),
        ])
        .unwrap();
        let config = generated(ChartConfigGenerator::new().generate(&table, &ChartRequest::default()));

        assert_eq!(config.chart_type, ChartType::Bar);
        assert_eq!(config.labels.len(), 30);
        assert!(config.labels.iter().all(|l| l != "Other"));
    }

    #[test]
    fn test_zero_rows_is_empty_not_failed() {
        let table = Table::new(vec![
            Column::categorical("k", Vec::<String>::new()),
            Column::numeric("v", Vec::<f64>::new()),
        ])
        .unwrap();
        let outcome = ChartConfigGenerator::new().generate(&table, &ChartRequest::default());

        assert!(outcome.is_empty());
        let config = outcome.config().unwrap();
        assert!(config.labels.is_empty());
        assert!(config.datasets.iter().all(|s| s.data.is_empty()));
    }

    #[test]
    fn test_zero_columns_fails() {
        let outcome = ChartConfigGenerator::new().generate(&Table::default(), &ChartRequest::default());
        assert!(outcome.is_failed());
        assert!(outcome.config().is_none());
        match outcome {
            ChartOutcome::Failed { code, .. } => assert_eq!(code, "CHART_GENERATION_FAILED"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_scatter_and_bubble_titles() {
        let table = Table::new(vec![
            Column::numeric("height", [1.0, 2.0, 3.0]),
            Column::numeric("weight", [2.0, 3.0, 5.0]),
            Column::numeric("age", [30.0, 40.0, 50.0]),
        ])
        .unwrap();
        let generator = ChartConfigGenerator::new();

        let bubble = generated(generator.generate(&table, &ChartRequest::default()));
        assert_eq!(bubble.chart_type, ChartType::Bubble);
        assert_eq!(bubble.options.title, "Bubble Chart - height vs weight (size: age)");
        assert!(bubble.labels.is_empty());
        assert_eq!(bubble.datasets[0].points.len(), 3);

        let request = ChartRequest::default()
            .with_chart_type(ChartType::Scatter)
            .with_columns("height", &["weight", "age"]);
        let scatter = generated(generator.generate(&table, &request));
        assert_eq!(scatter.options.title, "Scatter Plot - height vs weight, age");
        assert_eq!(scatter.datasets.len(), 2);
        assert_eq!(scatter.datasets[1].color, PALETTE[1]);
    }

    #[test]
    fn test_area_fills() {
        let request = ChartRequest::default().with_chart_type(ChartType::Area);
        let config = generated(ChartConfigGenerator::new().generate(&sales(), &request));
        assert!(config.datasets.iter().all(|s| s.fill));
        assert_eq!(config.labels.len(), 5);
    }

    #[test]
    fn test_failed_outcome_for_unknown_column() {
        let request = ChartRequest::default().with_columns("nope", &["revenue"]);
        let outcome = ChartConfigGenerator::new().generate(&sales(), &request);
        assert!(matches!(outcome, ChartOutcome::Failed { ref code, .. } if code == "COLUMN_NOT_FOUND"));
    }

    // ==================== Explanation chart tests ====================

    #[test]
    fn test_explanation_chart_top_features() {
        let explanations: Vec<FeatureExplanation> = (0..25)
            .map(|i| FeatureExplanation {
                feature: format!("f{i}"),
                importance: if i % 2 == 0 { i as f64 } else { -(i as f64) },
            })
            .collect();
        let config = explanation_chart(&explanations, "Feature importance");

        assert_eq!(config.chart_type, ChartType::Bar);
        assert_eq!(config.labels.len(), EXPLANATION_TOP_FEATURES);
        assert_eq!(config.labels[0], "f24");
        assert_eq!(config.labels[1], "f23");
        assert_eq!(config.datasets[0].data[1], Some(-23.0));
        assert!(!config.options.show_legend);
    }
}
