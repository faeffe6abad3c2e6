//! Feature explanation capability.
//!
//! SHAP- or LIME-style explanations need a model and a backend library this
//! crate does not ship. The engine asks an [`ExplanationProvider`] whether it
//! can explain before calling it, so a missing backend shows up as
//! `explanations_available = false` in the result instead of an error.
//!
//! # Implementing a Provider
//!
//! ```rust,ignore
//! use lumina_insight::{ExplanationBackend, ExplanationProvider, FeatureExplanation, Table};
//!
//! struct ShapBridge { /* model handle */ }
//!
//! impl ExplanationProvider for ShapBridge {
//!     fn backend(&self) -> ExplanationBackend {
//!         ExplanationBackend::ShapBased
//!     }
//!
//!     fn explain(&self, table: &Table) -> lumina_insight::Result<Vec<FeatureExplanation>> {
//!         todo!("call into the model")
//!     }
//! }
//! ```

use crate::error::{InsightError, Result};
use crate::table::Table;
use crate::types::{ExplanationBackend, FeatureExplanation};

/// Source of per-feature importance values.
///
/// Implementations must be `Send + Sync` so an engine holding one can run
/// on a worker thread.
pub trait ExplanationProvider: Send + Sync {
    fn backend(&self) -> ExplanationBackend;

    /// Capability query, checked before [`explain`](Self::explain) is called.
    fn is_available(&self) -> bool {
        self.backend() != ExplanationBackend::Unavailable
    }

    fn explain(&self, table: &Table) -> Result<Vec<FeatureExplanation>>;
}

/// Provider used when no explanation backend is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableExplainer;

impl ExplanationProvider for UnavailableExplainer {
    fn backend(&self) -> ExplanationBackend {
        ExplanationBackend::Unavailable
    }

    fn explain(&self, _table: &Table) -> Result<Vec<FeatureExplanation>> {
        Err(InsightError::OptionalDependencyUnavailable(
            "no SHAP or LIME backend is installed".to_string(),
        ))
    }
}
