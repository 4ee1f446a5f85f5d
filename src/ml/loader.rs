//! Start-up model loading.
//!
//! Loading never aborts the process: any failure is logged and yields
//! [`ModelState::Unloaded`], so the health check keeps answering while
//! predictions fail fast.

use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::ModelConfig;
use crate::error::{CardioError, Result};
use crate::ml::{LoadedModel, ModelArtifact, ModelState};

#[derive(Debug, Clone)]
pub struct ModelLoader {
    path: PathBuf,
}

impl ModelLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve the configured artifact against the running executable's directory.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let exe = std::env::current_exe()?;
        let base = exe.parent().ok_or_else(|| {
            CardioError::Internal(format!("executable {} has no parent dir", exe.display()))
        })?;
        Ok(Self::new(config.resolve_path(base)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the artifact, propagating the failure.
    pub fn try_load(&self) -> Result<LoadedModel> {
        let source = self.path.display().to_string();
        if !self.path.is_file() {
            return Err(CardioError::ModelLoad {
                path: source,
                reason: "file not found".to_string(),
            });
        }

        let is_onnx = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("onnx"));

        if is_onnx {
            return self.load_onnx(source);
        }

        ModelArtifact::from_file(&self.path)
            .map(|artifact| artifact.into_loaded(Some(source.clone())))
            .map_err(|e| CardioError::ModelLoad {
                path: source,
                reason: e.to_string(),
            })
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(&self, source: String) -> Result<LoadedModel> {
        crate::ml::OnnxModel::load(&self.path)
            .map(|model| model.into_loaded(Some(source.clone())))
            .map_err(|e| CardioError::ModelLoad {
                path: source,
                reason: e.to_string(),
            })
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(&self, source: String) -> Result<LoadedModel> {
        Err(CardioError::ModelLoad {
            path: source,
            reason: "ONNX artifacts require the `onnx` feature".to_string(),
        })
    }

    /// Load the artifact into the process-wide model state.
    pub fn load(&self) -> ModelState {
        match self.try_load() {
            Ok(model) => {
                info!(
                    path = %self.path.display(),
                    kind = %model.info().kind,
                    "Model loaded successfully"
                );
                ModelState::loaded(model)
            }
            Err(e) => {
                error!(path = %self.path.display(), "Error loading model: {}", e);
                ModelState::unloaded(e.to_string())
            }
        }
    }
}
