//! The insight engine and its builder.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::confidence::confidence_score;
use super::progress::{ClosureProgressReporter, InsightStage, ProgressReporter, ProgressUpdate};
use crate::analysis::{DistributionAnalyzer, MissingDataAnalyzer, RelationshipAnalyzer};
use crate::config::{ConfigValidationError, InsightConfig, RelationshipVerbosity};
use crate::detectors::{AnomalyDetector, OutlierDetector, OutlierReport};
use crate::error::{InsightError, Result};
use crate::explain::{ExplanationProvider, UnavailableExplainer};
use crate::profiler::StatisticalProfiler;
use crate::quality::DataQualityScorer;
use crate::table::Table;
use crate::types::{
    AnomalyRecord, DistributionRecord, FeatureExplanation, Findings, InsightResult,
    RelationshipRecord,
};

/// Runs every analyzer over one [`Table`] and assembles an [`InsightResult`].
///
/// Analyzers never read each other's output, so with `parallel` enabled
/// they run on scoped threads and the result is identical to a sequential run.
///
/// # Example
///
/// ```rust,ignore
/// use lumina_insight::{InsightConfig, InsightEngine};
///
/// let engine = InsightEngine::builder()
///     .config(InsightConfig::builder().zscore_threshold(2.5).build()?)
///     .on_progress(|update| println!("{}", update.stage.display_name()))
///     .build()?;
///
/// let result = engine.generate(&table)?;
/// println!("confidence {:.2}", result.confidence_score);
/// ```
pub struct InsightEngine {
    config: InsightConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    explainer: Arc<dyn ExplanationProvider>,
    profiler: StatisticalProfiler,
    anomalies: AnomalyDetector,
    outliers: OutlierDetector,
    relationships: RelationshipAnalyzer,
    distributions: DistributionAnalyzer,
    missing: MissingDataAnalyzer,
    quality: DataQualityScorer,
}

static_assertions::assert_impl_all!(InsightEngine: Send, Sync);

/// Outputs of the analyzers that only read the table.
struct ColumnFindings {
    anomalies: Findings<AnomalyRecord>,
    outliers: OutlierReport,
    relationships: Findings<RelationshipRecord>,
    distributions: Findings<DistributionRecord>,
}

impl InsightEngine {
    pub fn builder() -> InsightEngineBuilder {
        InsightEngineBuilder::default()
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    /// Analyze `table`.
    ///
    /// # Errors
    ///
    /// Returns [`InsightError::InsufficientData`] when the table has fewer
    /// than `min_rows` rows; no partial result is produced. Column-level
    /// problems never fail the run.
    pub fn generate(&self, table: &Table) -> Result<InsightResult> {
        match self.generate_internal(table) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "{} findings, confidence {:.2}",
                    result.finding_count(),
                    result.confidence_score
                )));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Insight generation failed: {}", e);
                Err(e)
            }
        }
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn finished(&self, stage: InsightStage, detail: impl std::fmt::Display) {
        debug!(stage = stage.display_name(), %detail, "stage finished");
        self.report_progress(ProgressUpdate::finished(
            stage,
            format!("{}: {}", stage.display_name(), detail),
        ));
    }

    fn generate_internal(&self, table: &Table) -> Result<InsightResult> {
        let start = Instant::now();
        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            "Starting insight generation"
        );

        if table.row_count() < self.config.min_rows {
            return Err(InsightError::insufficient(
                self.config.min_rows,
                table.row_count(),
                "table has too few rows to analyze",
            ));
        }

        let column_stats = self.profiler.profile(table);
        self.finished(InsightStage::Profiling, format!("{} columns", column_stats.len()));

        let ColumnFindings {
            anomalies,
            outliers,
            relationships,
            distributions,
        } = if self.config.parallel {
            self.analyze_parallel(table)
        } else {
            self.analyze_sequential(table)
        };
        self.finished(InsightStage::Anomalies, format!("{} records", anomalies.records.len()));
        self.finished(InsightStage::Outliers, format!("{} sets", outliers.sets.len()));
        self.finished(
            InsightStage::Relationships,
            format!("{} pairs", relationships.records.len()),
        );
        self.finished(
            InsightStage::Distributions,
            format!("{} columns", distributions.records.len()),
        );

        let missing_data = self.missing.analyze(table, &column_stats);
        self.finished(
            InsightStage::MissingData,
            format!("{:.1}% missing", missing_data.overall_missing_ratio * 100.0),
        );

        let data_quality = self.quality.score(table, &missing_data);
        self.finished(InsightStage::Quality, format!("score {:.1}", data_quality.score));

        let (explanations_available, explanations) = self.explain(table);

        let mut skipped_columns = Vec::new();
        skipped_columns.extend(anomalies.skipped);
        skipped_columns.extend(outliers.skipped.iter().cloned());
        skipped_columns.extend(relationships.skipped);
        skipped_columns.extend(distributions.skipped);

        let mut skipped_analyzers: Vec<_> = [
            anomalies.analyzer_skip,
            relationships.analyzer_skip,
            distributions.analyzer_skip,
        ]
        .into_iter()
        .flatten()
        .chain(outliers.analyzer_skips.iter().cloned())
        .collect();
        skipped_analyzers.sort_by_key(|s| s.analyzer);

        let relationships = match self.config.relationship_verbosity {
            RelationshipVerbosity::All => relationships.records,
            RelationshipVerbosity::SignificantOnly => relationships
                .records
                .into_iter()
                .filter(|r| r.is_significant)
                .collect(),
        };

        let confidence_score = confidence_score(
            table.row_count(),
            missing_data.overall_missing_ratio,
            &anomalies.records,
            self.config.low_confidence_rows,
        );

        let result = InsightResult {
            row_count: table.row_count(),
            column_count: table.column_count(),
            column_stats,
            anomalies: anomalies.records,
            outliers: outliers.records(),
            outlier_union: self.config.include_outlier_union.then(|| outliers.union()),
            relationships,
            distributions: distributions.records,
            missing_data,
            data_quality,
            skipped_columns,
            skipped_analyzers,
            explanations_available,
            explanation_backend: self.explainer.backend(),
            explanations,
            confidence_score,
        };

        info!(
            findings = result.finding_count(),
            confidence = result.confidence_score,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Insight generation complete"
        );
        Ok(result)
    }

    fn analyze_sequential(&self, table: &Table) -> ColumnFindings {
        ColumnFindings {
            anomalies: self.anomalies.detect(table),
            outliers: self.outliers.detect(table),
            relationships: self.relationships.analyze(table),
            distributions: self.distributions.analyze(table),
        }
    }

    fn analyze_parallel(&self, table: &Table) -> ColumnFindings {
        std::thread::scope(|scope| {
            let anomalies = scope.spawn(|| self.anomalies.detect(table));
            let outliers = scope.spawn(|| self.outliers.detect(table));
            let relationships = scope.spawn(|| self.relationships.analyze(table));
            let distributions = self.distributions.analyze(table);

            ColumnFindings {
                anomalies: join(anomalies),
                outliers: join(outliers),
                relationships: join(relationships),
                distributions,
            }
        })
    }

    fn explain(&self, table: &Table) -> (bool, Vec<FeatureExplanation>) {
        if !self.explainer.is_available() {
            debug!("No explanation backend available");
            return (false, Vec::new());
        }
        match self.explainer.explain(table) {
            Ok(explanations) => (true, explanations),
            Err(e) => {
                warn!("Explanation backend failed: {}", e);
                (false, Vec::new())
            }
        }
    }
}

/// Re-raise a worker panic on the calling thread.
fn join<T>(handle: std::thread::ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}

/// Builder for [`InsightEngine`].
#[derive(Default)]
pub struct InsightEngineBuilder {
    config: Option<InsightConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    explainer: Option<Arc<dyn ExplanationProvider>>,
}

static_assertions::assert_impl_all!(InsightEngineBuilder: Send);

impl InsightEngineBuilder {
    pub fn config(mut self, config: InsightConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Plug in a SHAP/LIME bridge. Defaults to [`UnavailableExplainer`].
    pub fn explanation_provider(mut self, provider: Arc<dyn ExplanationProvider>) -> Self {
        self.explainer = Some(provider);
        self
    }

    /// Build the engine.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<InsightEngine, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(InsightEngine {
            profiler: StatisticalProfiler::new(&config),
            anomalies: AnomalyDetector::new(&config),
            outliers: OutlierDetector::new(&config),
            relationships: RelationshipAnalyzer::new(&config),
            distributions: DistributionAnalyzer::new(&config),
            missing: MissingDataAnalyzer::new(&config),
            quality: DataQualityScorer::new(),
            progress_reporter: self.progress_reporter,
            explainer: self
                .explainer
                .unwrap_or_else(|| Arc::new(UnavailableExplainer)),
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use crate::types::{AnalyzerKind, ExplanationBackend, SkipReason};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn mixed_table() -> Table {
        let n = 40;
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let mut y: Vec<f64> = x.iter().map(|v| 3.0 * v + 1.0).collect();
        y[n - 1] = 500.0;
        Table::new(vec![
            Column::numeric("x", x),
            Column::numeric("y", y),
            Column::numeric("k", vec![7.0; n]),
            Column::categorical("group", (0..n).map(|i| ["a", "b", "c"][i % 3])),
        ])
        .unwrap()
    }

    // ==================== Builder tests ====================

    #[test]
    fn test_builder_default() {
        let engine = InsightEngine::builder().build().unwrap();
        assert_eq!(engine.config(), &InsightConfig::default());
        assert!(!engine.explainer.is_available());
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let config = InsightConfig {
            contamination: 2.0,
            ..InsightConfig::default()
        };
        assert!(InsightEngine::builder().config(config).build().is_err());
    }

    // ==================== Generation tests ====================

    #[test]
    fn test_single_row_is_insufficient() {
        let table = Table::new(vec![Column::numeric("x", [1.0])]).unwrap();
        let err = InsightEngine::builder()
            .build()
            .unwrap()
            .generate(&table)
            .unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn test_generate_collects_every_analyzer() {
        let result = InsightEngine::builder()
            .build()
            .unwrap()
            .generate(&mixed_table())
            .unwrap();

        assert_eq!(result.row_count, 40);
        assert_eq!(result.column_stats.len(), 4);
        assert!(result.anomalies.iter().any(|a| a.column == "y"));
        assert!(!result.outliers.is_empty());
        assert!(result.outlier_union.is_some());
        assert_eq!(result.relationships.len(), 1);
        assert_eq!(result.distributions.len(), 2);
        assert!(!result.explanations_available);
        assert_eq!(result.explanation_backend, ExplanationBackend::Unavailable);
        assert!((0.0..=1.0).contains(&result.confidence_score));

        let constant: Vec<_> = result
            .skipped_columns
            .iter()
            .filter(|s| s.column == "k")
            .map(|s| (s.analyzer, s.reason))
            .collect();
        assert!(constant.contains(&(AnalyzerKind::Anomaly, SkipReason::ZeroVariance)));
        assert!(constant.contains(&(AnalyzerKind::Relationship, SkipReason::ZeroVariance)));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let table = mixed_table();
        let sequential = InsightEngine::builder().build().unwrap().generate(&table).unwrap();
        let parallel = InsightEngine::builder()
            .config(InsightConfig::builder().parallel(true).build().unwrap())
            .build()
            .unwrap()
            .generate(&table)
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_verbosity_all_keeps_weak_pairs() {
        let table = Table::new(vec![
            Column::numeric("a", (0..30).map(f64::from)),
            Column::numeric("b", (0..30).map(|i| f64::from((i * 7) % 11))),
        ])
        .unwrap();

        let significant = InsightEngine::builder().build().unwrap().generate(&table).unwrap();
        assert!(significant.relationships.is_empty());

        let all = InsightEngine::builder()
            .config(
                InsightConfig::builder()
                    .relationship_verbosity(RelationshipVerbosity::All)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
            .generate(&table)
            .unwrap();
        assert_eq!(all.relationships.len(), 1);
    }

    #[test]
    fn test_categorical_only_table() {
        let table = Table::new(vec![Column::categorical_opt(
            "c",
            [Some("a"), None, Some("b"), Some("a")],
        )])
        .unwrap();
        let result = InsightEngine::builder().build().unwrap().generate(&table).unwrap();

        assert!(result.anomalies.is_empty());
        assert_eq!(result.missing_data.total_missing, 1);
        assert!(result.column_stats["c"].categorical.is_some());
        let skipped: Vec<_> = result.skipped_analyzers.iter().map(|s| s.analyzer).collect();
        assert!(skipped.contains(&AnalyzerKind::Anomaly));
        assert!(skipped.contains(&AnalyzerKind::Relationship));
    }

    // ==================== Progress tests ====================

    #[test]
    fn test_progress_stage_order() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let sink = stages.clone();
        let engine = InsightEngine::builder()
            .on_progress(move |update| sink.lock().unwrap().push(update.stage))
            .build()
            .unwrap();

        engine.generate(&mixed_table()).unwrap();
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
    fn test_failure_reports_failed_stage() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let sink = stages.clone();
        let engine = InsightEngine::builder()
            .on_progress(move |update| sink.lock().unwrap().push(update.stage))
            .build()
            .unwrap();

        let table = Table::new(vec![Column::numeric("x", [1.0])]).unwrap();
        assert!(engine.generate(&table).is_err());
        assert_eq!(*stages.lock().unwrap(), vec![InsightStage::Failed]);
    }

    // ==================== Explanation tests ====================

    struct FixedExplainer;

    impl ExplanationProvider for FixedExplainer {
        fn backend(&self) -> ExplanationBackend {
            ExplanationBackend::ShapBased
        }

        fn explain(&self, table: &Table) -> Result<Vec<FeatureExplanation>> {
            Ok(table
                .numeric_columns()
                .map(|c| FeatureExplanation {
                    feature: c.name().to_string(),
                    importance: 0.5,
                })
                .collect())
        }
    }

    #[test]
    fn test_available_explainer_fills_result() {
        let result = InsightEngine::builder()
            .explanation_provider(Arc::new(FixedExplainer))
            .build()
            .unwrap()
            .generate(&mixed_table())
            .unwrap();

        assert!(result.explanations_available);
        assert_eq!(result.explanation_backend, ExplanationBackend::ShapBased);
        assert_eq!(result.explanations.len(), 3);
    }
}
