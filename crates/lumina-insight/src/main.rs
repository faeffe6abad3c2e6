//! CLI entry point for insight generation and chart configuration.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use lumina_insight::{
    ChartConfigGenerator, ChartOutcome, ChartRequest, ChartType, InsightConfig, InsightEngine,
    InsightResult, RelationshipVerbosity, Table,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Automated statistical insights and chart configuration for CSV datasets",
    long_about = "Profiles a CSV dataset, reports anomalies, outliers, correlations, \
                  distribution shapes, missing data and a quality score, and picks a chart.\n\n\
                  EXAMPLES:\n  \
                  # Human-readable summary\n  \
                  lumina-insight -i sales.csv\n\n  \
                  # Force a chart type and columns\n  \
                  lumina-insight -i sales.csv --chart-type line --x month --y revenue --y cost\n\n  \
                  # Machine output\n  \
                  lumina-insight -i sales.csv --json | jq .chart"
)]
struct Args {
    /// Path to the CSV file to analyze
    #[arg(short, long)]
    input: String,

    /// Chart type (bar, line, pie, doughnut, scatter, radar, bubble, area)
    ///
    /// Chosen from the column signature when omitted
    #[arg(long)]
    chart_type: Option<ChartType>,

    /// Label column for the chart
    #[arg(long = "x")]
    x_column: Option<String>,

    /// Numeric series column for the chart (repeatable)
    #[arg(long = "y")]
    y_columns: Vec<String>,

    /// Chart title
    #[arg(long)]
    title: Option<String>,

    /// Prefer a bar chart over a pie chart for small categorical comparisons
    #[arg(long)]
    categorical_comparison: bool,

    /// Hide the chart legend
    #[arg(long)]
    no_legend: bool,

    /// Categories kept in a bar chart before folding into "Other"
    #[arg(long, default_value = "20")]
    bar_top_categories: usize,

    /// |z| above which a value is anomalous
    #[arg(long, default_value = "3.0")]
    zscore_threshold: f64,

    /// IQR fence multiplier
    #[arg(long, default_value = "1.5")]
    iqr_multiplier: f64,

    /// Expected outlier fraction for Isolation Forest and LOF (0.0 - 0.5)
    #[arg(long, default_value = "0.05")]
    contamination: f64,

    /// Minimum |r| for a significant correlation
    #[arg(long, default_value = "0.3")]
    correlation_threshold: f64,

    /// p-value cutoff for correlation and normality tests
    #[arg(long, default_value = "0.05")]
    p_value_threshold: f64,

    /// Null ratio above which a column is reported as high-missing (0.0 - 1.0)
    #[arg(long, default_value = "0.5")]
    missing_threshold: f64,

    /// Maximum indices listed per outlier record
    #[arg(long, default_value = "200")]
    outlier_sample_cap: usize,

    /// Row count below which confidence is capped
    #[arg(long, default_value = "10")]
    low_confidence_rows: usize,

    /// Row count below which analysis fails
    #[arg(long, default_value = "2")]
    min_rows: usize,

    /// Seed for Isolation Forest
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Report every column pair, not only significant correlations
    #[arg(long)]
    all_relationships: bool,

    /// Run analyzers on worker threads
    #[arg(long)]
    parallel: bool,

    /// Skip chart generation
    #[arg(long)]
    no_chart: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs; only outputs `{ "insights": ..., "chart": ... }`.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and the final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    info!("Loading dataset from: {}", args.input);
    let data = load_csv_with_fallbacks(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    let table = Table::from_dataframe(&data).context("Failed to build table from dataset")?;
    let config = build_config(&args)?;

    let engine = InsightEngine::builder()
        .config(config)
        .on_progress(|update| {
            info!("[{:>3.0}%] {}", update.progress * 100.0, update.message);
        })
        .build()?;

    let insights = match engine.generate(&table) {
        Ok(result) => result,
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&json!({ "error": e }))?);
            }
            error!("Insight generation failed: {}", e);
            return Err(anyhow!("Insight generation failed: {}", e));
        }
    };

    let chart = (!args.no_chart).then(|| {
        let outcome = ChartConfigGenerator::new().generate(&table, &chart_request(&args));
        if let ChartOutcome::Failed { code, message } = &outcome {
            warn!("Chart generation failed ({}): {}", code, message);
        }
        outcome
    });

    if args.json {
        let output = json!({ "insights": insights, "chart": chart });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(&args, &insights, chart.as_ref());
    }

    Ok(())
}

fn build_config(args: &Args) -> Result<InsightConfig> {
    let verbosity = if args.all_relationships {
        RelationshipVerbosity::All
    } else {
        RelationshipVerbosity::SignificantOnly
    };

    let config = InsightConfig::builder()
        .zscore_threshold(args.zscore_threshold)
        .iqr_multiplier(args.iqr_multiplier)
        .contamination(args.contamination)
        .correlation_threshold(args.correlation_threshold)
        .p_value_threshold(args.p_value_threshold)
        .missing_threshold(args.missing_threshold)
        .outlier_sample_cap(args.outlier_sample_cap)
        .low_confidence_rows(args.low_confidence_rows)
        .min_rows(args.min_rows)
        .random_seed(args.seed)
        .relationship_verbosity(verbosity)
        .parallel(args.parallel)
        .build()?;
    debug!(?config, "Insight configuration");
    Ok(config)
}

fn chart_request(args: &Args) -> ChartRequest {
    ChartRequest {
        chart_type: args.chart_type,
        x_column: args.x_column.clone(),
        y_columns: args.y_columns.clone(),
        title: args.title.clone(),
        show_legend: !args.no_legend,
        categorical_comparison: args.categorical_comparison,
        bar_top_categories: args.bar_top_categories,
        ..ChartRequest::default()
    }
}

/// Print the human-readable report.
///
/// Uses `println!` on purpose: this is the primary output and should be
/// visible regardless of log level.
fn print_summary(args: &Args, insights: &InsightResult, chart: Option<&ChartOutcome>) {
    println!("\n{}", "=".repeat(80));
    println!("INSIGHTS - {}", args.input);
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  Rows: {}", insights.row_count);
    println!("  Columns: {}", insights.column_count);
    println!(
        "  Quality: {:.1}/100 ({})",
        insights.data_quality.score,
        insights.data_quality.rating.display_name()
    );
    println!("  Confidence: {:.2}", insights.confidence_score);
    println!();

    println!("COLUMNS");
    println!("{}", "-".repeat(40));
    println!(
        "{:<20} {:<12} {:<10} {:<10}",
        "Column", "Kind", "Missing %", "Unique"
    );
    println!("{}", "-".repeat(56));
    for (name, stats) in &insights.column_stats {
        println!(
            "{:<20} {:<12} {:<10.1} {:<10}",
            truncate_str(name, 19),
            stats.kind.as_str(),
            stats.null_ratio * 100.0,
            stats.unique_count
        );
    }
    println!();

    println!("ANOMALIES");
    println!("{}", "-".repeat(40));
    if insights.anomalies.is_empty() {
        println!("  No anomalies detected");
    }
    for anomaly in &insights.anomalies {
        println!(
            "  - [{:?}] {} ({:?}): {} values ({:.1}%)",
            anomaly.severity,
            anomaly.column,
            anomaly.method,
            anomaly.affected_count,
            anomaly.percentage
        );
    }
    println!();

    println!("OUTLIERS");
    println!("{}", "-".repeat(40));
    if insights.outliers.is_empty() {
        println!("  No outliers detected");
    }
    for outlier in &insights.outliers {
        println!(
            "  - {} ({:?}): {} rows ({:.1}%)",
            outlier.column, outlier.method, outlier.outlier_count, outlier.outlier_percentage
        );
    }
    if let Some(union) = &insights.outlier_union {
        println!("  Union across methods: {} rows", union.outlier_count);
    }
    println!();

    println!("RELATIONSHIPS");
    println!("{}", "-".repeat(40));
    if insights.relationships.is_empty() {
        println!("  No significant correlations");
    }
    for rel in &insights.relationships {
        println!(
            "  - {} ~ {}: r = {:.3} ({:?}, {:?}){}",
            rel.feature_1,
            rel.feature_2,
            rel.correlation_coefficient,
            rel.strength,
            rel.direction,
            rel.p_value.map(|p| format!(", p = {p:.4}")).unwrap_or_default()
        );
    }
    println!();

    println!("DISTRIBUTIONS");
    println!("{}", "-".repeat(40));
    for dist in &insights.distributions {
        let normal = match dist.is_normal {
            Some(true) => "normal",
            Some(false) => "not normal",
            None => "untested",
        };
        println!(
            "  - {:<20} skew {:>7.3}  kurt {:>7.3}  {:?} ({})",
            truncate_str(&dist.column, 19),
            dist.skewness,
            dist.kurtosis,
            dist.shape_label,
            normal
        );
    }
    println!();

    println!("MISSING DATA");
    println!("{}", "-".repeat(40));
    println!(
        "  Overall: {:.1}% ({} cells)",
        insights.missing_data.overall_missing_ratio * 100.0,
        insights.missing_data.total_missing
    );
    if !insights.missing_data.high_missing_columns.is_empty() {
        println!(
            "  Above {:.0}%: {:?}",
            insights.missing_data.threshold * 100.0,
            insights.missing_data.high_missing_columns
        );
    }
    println!();

    if !insights.skipped_columns.is_empty() || !insights.skipped_analyzers.is_empty() {
        println!("SKIPPED");
        println!("{}", "-".repeat(40));
        for skip in &insights.skipped_analyzers {
            println!("  - {:?}: {}", skip.analyzer, skip.reason);
        }
        for skip in &insights.skipped_columns {
            println!("  - {:?} / {}: {:?}", skip.analyzer, skip.column, skip.reason);
        }
        println!();
    }

    if let Some(outcome) = chart {
        println!("CHART");
        println!("{}", "-".repeat(40));
        match outcome {
            ChartOutcome::Generated { config } | ChartOutcome::Empty { config } => {
                println!("  Type: {}", config.chart_type.display_name());
                println!("  Title: {}", config.options.title);
                println!("  Labels: {}", config.labels.len());
                println!(
                    "  Series: {}",
                    config
                        .datasets
                        .iter()
                        .map(|s| s.label.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            ChartOutcome::Failed { code, message } => println!("  Failed ({code}): {message}"),
        }
        println!();
    }

    println!("{}", insights.data_quality.summary);
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

/// Load a CSV, retrying without quote handling and finally with cleaned content.
fn load_csv_with_fallbacks(path: &str) -> Result<DataFrame> {
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Loading without quotes failed: {}", e);
        }
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read file: {path}"))?;
    let cleaned = clean_csv_content(&content);

    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .into_reader_with_file_handle(std::io::Cursor::new(cleaned))
        .finish()
        .map_err(|e| e.into())
}

/// Collapse doubled quotes and drop blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
