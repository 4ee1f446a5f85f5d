//! Classifier abstraction and the deploy-safe model formats behind it.
//!
//! Training happens elsewhere; this module only evaluates exported artifacts.
//! Everything here is CPU-only and read-only once loaded, so a single
//! [`LoadedModel`] is shared across request handlers without locking.

pub mod artifact;
pub mod dense;
pub mod forest;
pub mod loader;
pub mod logistic;
#[cfg(feature = "onnx")]
pub mod onnx;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{CardioError, Result};
use crate::features::FeatureVector;

pub use artifact::{ModelArtifact, ModelKind};
pub use dense::{Activation, DenseLayer, DenseNetwork};
pub use forest::{DecisionTree, RandomForest};
pub use loader::ModelLoader;
pub use logistic::LogisticRegression;
#[cfg(feature = "onnx")]
pub use onnx::OnnxModel;

/// Binary outcome of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskClass {
    NoDisease = 0,
    Disease = 1,
}

impl RiskClass {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NoDisease => "No Disease",
            Self::Disease => "Disease Detected",
        }
    }
}

impl std::fmt::Display for RiskClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Per-class probabilities, indexed like scikit-learn's `predict_proba` row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassProbabilities {
    pub no_disease: f64,
    pub disease: f64,
}

impl ClassProbabilities {
    pub fn new(no_disease: f64, disease: f64) -> Self {
        Self {
            no_disease,
            disease,
        }
    }

    /// Distribution from the positive-class probability alone.
    pub fn from_positive(disease: f64) -> Self {
        Self::new(1.0 - disease, disease)
    }

    pub fn of(&self, class: RiskClass) -> f64 {
        match class {
            RiskClass::NoDisease => self.no_disease,
            RiskClass::Disease => self.disease,
        }
    }

    /// Most likely class; ties resolve to the first class.
    pub fn argmax(&self) -> RiskClass {
        if self.disease > self.no_disease {
            RiskClass::Disease
        } else {
            RiskClass::NoDisease
        }
    }

    /// Reject values a probability cannot take.
    pub fn validate(&self) -> Result<()> {
        const EPS: f64 = 1e-9;
        for (name, p) in [("no_disease", self.no_disease), ("disease", self.disease)] {
            if !p.is_finite() || p < -EPS || p > 1.0 + EPS {
                return Err(CardioError::Inference(format!(
                    "probability for {name} out of range: {p}"
                )));
            }
        }
        Ok(())
    }
}

/// A binary classifier over the 13-feature vector.
///
/// Mirrors the `predict` / `predict_proba` pair of the training library: `predict`
/// defaults to the argmax of `predict_proba`.
#[cfg_attr(test, mockall::automock)]
pub trait Classifier: Send + Sync {
    fn predict_proba(&self, features: &FeatureVector) -> Result<ClassProbabilities>;

    fn predict(&self, features: &FeatureVector) -> Result<RiskClass> {
        Ok(self.predict_proba(features)?.argmax())
    }
}

/// Descriptor of a loaded artifact, served by `GET /api/model`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub kind: String,
    pub n_features: usize,
    pub feature_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_estimators: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub loaded_at: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

impl ModelInfo {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            n_features: crate::features::FEATURE_COUNT,
            feature_names: crate::features::FEATURE_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            n_estimators: None,
            source: None,
            loaded_at: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

/// A classifier together with what is known about where it came from.
pub struct LoadedModel {
    classifier: Box<dyn Classifier>,
    info: ModelInfo,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel").field("info", &self.info).finish()
    }
}

impl LoadedModel {
    pub fn new(classifier: Box<dyn Classifier>, info: ModelInfo) -> Self {
        Self { classifier, info }
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }
}

/// Model availability, fixed at start-up.
#[derive(Debug, Clone)]
pub enum ModelState {
    Loaded(Arc<LoadedModel>),
    Unloaded { reason: String },
}

impl ModelState {
    pub fn loaded(model: LoadedModel) -> Self {
        Self::Loaded(Arc::new(model))
    }

    pub fn unloaded(reason: impl Into<String>) -> Self {
        Self::Unloaded {
            reason: reason.into(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// The model, or [`CardioError::ModelNotLoaded`] in degraded mode.
    pub fn model(&self) -> Result<&Arc<LoadedModel>> {
        match self {
            Self::Loaded(model) => Ok(model),
            Self::Unloaded { .. } => Err(CardioError::ModelNotLoaded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_first_class_on_tie() {
        assert_eq!(
            ClassProbabilities::new(0.5, 0.5).argmax(),
            RiskClass::NoDisease
        );
        assert_eq!(
            ClassProbabilities::new(0.2, 0.8).argmax(),
            RiskClass::Disease
        );
    }

    #[test]
    fn validate_rejects_out_of_range() {
        assert!(ClassProbabilities::new(0.3, 0.7).validate().is_ok());
        assert!(ClassProbabilities::new(-0.1, 1.1).validate().is_err());
        assert!(ClassProbabilities::new(f64::NAN, 0.5).validate().is_err());
    }

    #[test]
    fn labels_follow_class() {
        assert_eq!(RiskClass::Disease.label(), "Disease Detected");
        assert_eq!(RiskClass::NoDisease.label(), "No Disease");
        assert_eq!(RiskClass::Disease.as_u8(), 1);
        assert_eq!(RiskClass::NoDisease.as_u8(), 0);
    }

    #[test]
    fn default_predict_uses_probabilities() {
        let mut mock = MockClassifier::new();
        mock.expect_predict_proba()
            .returning(|_| Ok(ClassProbabilities::new(0.1, 0.9)));
        // The mock replaces the default body, so route predict through a real impl.
        struct Wrapped(MockClassifier);
        impl Classifier for Wrapped {
            fn predict_proba(&self, features: &FeatureVector) -> Result<ClassProbabilities> {
                self.0.predict_proba(features)
            }
        }
        let features = FeatureVector::from_values([1.0; crate::features::FEATURE_COUNT]).unwrap();
        assert_eq!(Wrapped(mock).predict(&features).unwrap(), RiskClass::Disease);
    }

    #[test]
    fn unloaded_state_reports_model_not_loaded() {
        let state = ModelState::unloaded("missing file");
        assert!(!state.is_loaded());
        assert!(matches!(state.model(), Err(CardioError::ModelNotLoaded)));
    }
}
