//! JSON model artifacts.
//!
//! ```json
//! {
//!   "kind": "random_forest",
//!   "feature_names": ["id", "age", ...],
//!   "metadata": {"trained_at": "..."},
//!   "trees": [ ... ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CardioError, Result};
use crate::features::FEATURE_NAMES;
use crate::ml::{
    Classifier, DenseNetwork, LoadedModel, LogisticRegression, ModelInfo, RandomForest,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelKind {
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
    Dense(DenseNetwork),
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RandomForest(_) => "random_forest",
            Self::LogisticRegression(_) => "logistic_regression",
            Self::Dense(_) => "dense",
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Self::RandomForest(m) => m.validate(),
            Self::LogisticRegression(m) => m.validate(),
            Self::Dense(m) => m.validate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Column names the model was fit on; checked against the serving order.
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,

    /// Optional free-form metadata (versioning, training info, etc).
    #[serde(default)]
    pub metadata: serde_json::Value,

    #[serde(flatten)]
    pub model: ModelKind,
}

impl ModelArtifact {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let artifact: Self = serde_json::from_str(content)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(names) = &self.feature_names {
            if names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
                return Err(CardioError::IncompatibleModel(format!(
                    "feature_names {names:?} do not match serving order {FEATURE_NAMES:?}"
                )));
            }
        }
        self.model
            .validate()
            .map_err(|e| CardioError::IncompatibleModel(format!("{}: {e}", self.model.name())))
    }

    /// Wrap the artifact for serving, recording where it came from.
    pub fn into_loaded(self, source: Option<String>) -> LoadedModel {
        let mut info = ModelInfo::new(self.model.name());
        info.source = source;
        info.metadata = self.metadata;
        let classifier: Box<dyn Classifier> = match self.model {
            ModelKind::RandomForest(m) => {
                info.n_estimators = Some(m.n_estimators());
                Box::new(m)
            }
            ModelKind::LogisticRegression(m) => Box::new(m),
            ModelKind::Dense(m) => Box::new(m),
        };
        LoadedModel::new(classifier, info)
    }
}
