use thiserror::Error;

use crate::features::FieldError;

/// Main error type for the prediction service
#[derive(Error, Debug)]
pub enum CardioError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Request errors
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    // Model errors
    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("Failed to load model from {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("Incompatible model artifact: {0}")]
    IncompatibleModel(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for CardioError
pub type Result<T> = std::result::Result<T, CardioError>;

impl CardioError {
    /// Whether the failure was caused by the caller's payload rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CardioError::Field(_)
                | CardioError::MalformedRequest(_)
                | CardioError::Validation(_)
                | CardioError::Json(_)
        )
    }
}
