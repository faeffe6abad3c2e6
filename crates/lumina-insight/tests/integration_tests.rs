//! Integration tests for insight generation and chart configuration.
//!
//! These tests load CSV fixtures through Polars and run the full engine.

use lumina_insight::{
    AnalyzerKind, AnomalyMethod, ChartConfigGenerator, ChartOutcome, ChartRequest, ChartType,
    ColumnKind, InsightConfig, InsightEngine, InsightError, InsightResult, InsightStage,
    RelationshipType, RelationshipVerbosity, Severity, SkipReason, Table,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_csv(filename: &str) -> DataFrame {
    let path = fixtures_path().join(filename);
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

fn load_table(filename: &str) -> Table {
    Table::from_dataframe(&load_csv(filename)).expect("Failed to build table")
}

fn generate(table: &Table) -> InsightResult {
    InsightEngine::builder()
        .build()
        .unwrap()
        .generate(table)
        .expect("Insight generation failed")
}

fn generate_with(table: &Table, config: InsightConfig) -> InsightResult {
    InsightEngine::builder()
        .config(config)
        .build()
        .unwrap()
        .generate(table)
        .expect("Insight generation failed")
}

// ============================================================================
// Scenario Tests
// ============================================================================

#[test]
fn test_spike_flagged_by_iqr_as_critical() {
    let result = generate(&load_table("spike.csv"));

    let iqr = result
        .anomalies
        .iter()
        .find(|a| a.column == "x" && a.method == AnomalyMethod::Iqr)
        .expect("IQR record for x");
    assert_eq!(iqr.indices, vec![4]);
    assert_eq!(iqr.values, vec![100.0]);
    assert_eq!(iqr.severity, Severity::Critical);
}

#[test]
fn test_spike_flagged_by_both_methods_at_lower_threshold() {
    // Five values cap |z| below 1.8, so the z test needs a lower threshold.
    let config = InsightConfig::builder().zscore_threshold(1.5).build().unwrap();
    let result = generate_with(&load_table("spike.csv"), config);

    for method in [AnomalyMethod::Zscore, AnomalyMethod::Iqr] {
        let record = result
            .anomalies
            .iter()
            .find(|a| a.method == method)
            .unwrap_or_else(|| panic!("missing {method:?} record"));
        assert_eq!(record.indices, vec![4]);
        assert_eq!(record.severity, Severity::Critical);
    }
}

#[test]
fn test_perfect_correlation() {
    let result = generate(&load_table("correlated.csv"));

    assert_eq!(result.relationships.len(), 1);
    let rel = &result.relationships[0];
    assert_eq!((rel.feature_1.as_str(), rel.feature_2.as_str()), ("x", "y"));
    assert!((rel.correlation_coefficient - 1.0).abs() < 1e-9);
    assert!(rel.is_significant);
    assert_eq!(rel.relationship_type, RelationshipType::LinearPositive);
    assert_eq!(rel.sample_size, 20);
}

#[test]
fn test_pie_chart_for_small_category() {
    let table = load_table("regional_sales.csv");
    let outcome = ChartConfigGenerator::new().generate(&table, &ChartRequest::default());

    let config = match outcome {
        ChartOutcome::Generated { config } => config,
        other => panic!("expected generated chart, got {other:?}"),
    };
    assert_eq!(config.chart_type, ChartType::Pie);
    assert_eq!(config.labels, vec!["north", "south", "east", "west", "central"]);
    assert_eq!(config.datasets.len(), 1);
    assert_eq!(config.datasets[0].data.len(), 5);
    assert_eq!(config.datasets[0].data[0], Some(378.0));
}

#[test]
fn test_single_row_is_insufficient() {
    let table = load_table("single_row.csv");
    let err = InsightEngine::builder().build().unwrap().generate(&table).unwrap_err();

    assert!(err.is_insufficient_data());
    assert!(matches!(
        err,
        InsightError::InsufficientData { required: 2, actual: 1, .. }
    ));
}

#[test]
fn test_constant_column_skipped_locally() {
    let result = generate(&load_table("constant_column.csv"));

    for analyzer in [AnalyzerKind::Anomaly, AnalyzerKind::Relationship] {
        let skip = result
            .skips_for(analyzer)
            .find(|s| s.column == "constant")
            .unwrap_or_else(|| panic!("{analyzer:?} did not skip the constant column"));
        assert_eq!(skip.reason, SkipReason::ZeroVariance);
    }

    assert_eq!(result.relationships.len(), 1);
    assert_eq!(result.relationships[0].feature_1, "x");
    assert_eq!(result.relationships[0].feature_2, "y");
    assert!(result.anomalies.iter().all(|a| a.column != "constant"));
    assert!(result.distributions.iter().any(|d| d.column == "x"));
}

// ============================================================================
// Mixed Dataset Tests
// ============================================================================

#[test]
fn test_orders_column_kinds() {
    let table = load_table("orders.csv");
    let kinds: Vec<(&str, ColumnKind)> = table.columns().iter().map(|c| (c.name(), c.kind())).collect();

    assert_eq!(
        kinds,
        vec![
            ("date", ColumnKind::Temporal),
            ("region", ColumnKind::Categorical),
            ("units", ColumnKind::Numeric),
            ("price", ColumnKind::Numeric),
            ("notes", ColumnKind::Text),
        ]
    );
    assert_eq!(table.total_nulls(), 2);
}

#[test]
fn test_orders_full_run() {
    let result = generate(&load_table("orders.csv"));

    assert_eq!(result.row_count, 30);
    assert_eq!(result.column_count, 5);
    assert_eq!(result.column_stats.len(), 5);
    assert_eq!(result.missing_data.total_missing, 2);
    assert_eq!(result.missing_data.columns_with_missing.len(), 2);
    assert!(result.missing_data.high_missing_columns.is_empty());

    let spike = result
        .anomalies
        .iter()
        .find(|a| a.column == "units" && a.method == AnomalyMethod::Iqr)
        .expect("units spike");
    assert!(spike.indices.contains(&23));

    let union = result.outlier_union.as_ref().expect("outlier union");
    assert!(union.indices.contains(&23));

    assert!(!result.explanations_available);
    assert!((0.0..=1.0).contains(&result.confidence_score));
    assert!((0.0..=100.0).contains(&result.data_quality.score));
}

#[test]
fn test_orders_line_chart() {
    let table = load_table("orders.csv");
    let outcome = ChartConfigGenerator::new().generate(&table, &ChartRequest::default());
    let config = outcome.config().expect("chart config");

    assert_eq!(config.chart_type, ChartType::Line);
    assert_eq!(config.labels.len(), 15);
    assert_eq!(config.labels[0], "2024-01-01");
    assert_eq!(config.datasets.len(), 2);
    assert_eq!(config.datasets[0].label, "units");
    assert_eq!(config.datasets[1].label, "price");
}

#[test]
fn test_explicit_chart_request() {
    let table = load_table("orders.csv");
    let request = ChartRequest::default()
        .with_chart_type(ChartType::Doughnut)
        .with_columns("region", &["price"])
        .with_title("Price by region");
    let config = ChartConfigGenerator::new()
        .try_generate(&table, &request)
        .unwrap();

    assert_eq!(config.chart_type, ChartType::Doughnut);
    assert_eq!(config.labels, vec!["north", "south", "east"]);
    assert_eq!(config.options.title, "Price by region");
    assert_eq!(config.datasets[0].slice_colors.len(), 3);
}

#[test]
fn test_chart_from_dataframe() {
    let outcome = ChartConfigGenerator::new()
        .generate_from_dataframe(&load_csv("correlated.csv"), &ChartRequest::default());
    assert_eq!(outcome.config().map(|c| c.chart_type), Some(ChartType::Scatter));
}

// ============================================================================
// Property Tests
// ============================================================================

#[test]
fn test_generation_is_deterministic() {
    let table = load_table("orders.csv");
    let first = serde_json::to_string(&generate(&table)).unwrap();
    let second = serde_json::to_string(&generate(&table)).unwrap();
    assert_eq!(first, second);

    let generator = ChartConfigGenerator::new();
    let request = ChartRequest::default();
    assert_eq!(
        serde_json::to_string(&generator.generate(&table, &request)).unwrap(),
        serde_json::to_string(&generator.generate(&table, &request)).unwrap()
    );
}

#[test]
fn test_parallel_matches_sequential() {
    let table = load_table("orders.csv");
    let parallel = InsightConfig::builder().parallel(true).build().unwrap();
    assert_eq!(generate(&table), generate_with(&table, parallel));
}

#[test]
fn test_json_round_trip() {
    let table = load_table("orders.csv");
    let result = generate(&table);
    let json = serde_json::to_string(&result).unwrap();
    let restored: InsightResult = serde_json::from_str(&json).unwrap();
    assert_eq!(result, restored);

    let outcome = ChartConfigGenerator::new().generate(&table, &ChartRequest::default());
    let json = serde_json::to_string(&outcome).unwrap();
    let restored: ChartOutcome = serde_json::from_str(&json).unwrap();
    assert_eq!(outcome, restored);
}

#[test]
fn test_relationships_are_symmetric() {
    let table = load_table("orders.csv");
    let reversed = Table::new(table.columns().iter().rev().cloned().collect()).unwrap();
    let config = InsightConfig::builder()
        .relationship_verbosity(RelationshipVerbosity::All)
        .build()
        .unwrap();

    let forward = generate_with(&table, config.clone()).relationships;
    let backward = generate_with(&reversed, config).relationships;
    assert_eq!(forward, backward);
    assert!(forward.iter().all(|r| r.feature_1 < r.feature_2));
}

#[test]
fn test_scores_stay_in_bounds() {
    for fixture in ["spike.csv", "correlated.csv", "regional_sales.csv", "constant_column.csv", "orders.csv"] {
        let result = generate(&load_table(fixture));
        assert!((0.0..=1.0).contains(&result.confidence_score), "{fixture}");
        assert!((0.0..=100.0).contains(&result.data_quality.score), "{fixture}");
        assert!(
            result.anomalies.iter().all(|a| (0.0..=1.0).contains(&a.anomaly_score)),
            "{fixture}"
        );
        for rel in &result.relationships {
            assert!((-1.0..=1.0).contains(&rel.correlation_coefficient));
            assert!(rel.p_value.is_none_or(|p| (0.0..=1.0).contains(&p)));
        }
    }
}

#[test]
fn test_small_table_confidence_capped() {
    let result = generate(&load_table("spike.csv"));
    assert!(result.confidence_score <= 0.3);
}

// ============================================================================
// Progress Tests
// ============================================================================

#[test]
fn test_progress_stages_reported() {
    let stages = Arc::new(Mutex::new(Vec::new()));
    let sink = stages.clone();

    InsightEngine::builder()
        .on_progress(move |update| sink.lock().unwrap().push(update.stage))
        .build()
        .unwrap()
        .generate(&load_table("orders.csv"))
        .unwrap();

    assert_eq!(
        *stages.lock().unwrap(),
        vec![
            InsightStage::Profiling,
            InsightStage::Anomalies,
            InsightStage::Outliers,
            InsightStage::Relationships,
            InsightStage::Distributions,
            InsightStage::MissingData,
            InsightStage::Quality,
            InsightStage::Complete,
        ]
    );
}

#[test]
fn test_progress_failed_stage() {
    let stages = Arc::new(Mutex::new(Vec::new()));
    let sink = stages.clone();

    let result = InsightEngine::builder()
        .on_progress(move |update| sink.lock().unwrap().push(update.stage))
        .build()
        .unwrap()
        .generate(&load_table("single_row.csv"));

    assert!(result.is_err());
    assert_eq!(*stages.lock().unwrap(), vec![InsightStage::Failed]);
}
