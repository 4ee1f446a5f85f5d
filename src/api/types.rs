use serde::{Deserialize, Serialize};

use crate::services::Prediction;

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// Prediction Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityBreakdown {
    pub no_disease: f64,
    pub disease: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: u8,
    pub result: String,
    /// Probability of the predicted class, in percent.
    pub confidence: f64,
    pub bmi: f64,
    /// Both class probabilities, in percent.
    pub probabilities: ProbabilityBreakdown,
    pub status: String,
}

impl From<Prediction> for PredictionResponse {
    fn from(p: Prediction) -> Self {
        Self {
            prediction: p.class.as_u8(),
            result: p.class.label().to_string(),
            confidence: round2(p.confidence() * 100.0),
            bmi: round2(p.bmi),
            probabilities: ProbabilityBreakdown {
                no_disease: round2(p.probabilities.no_disease * 100.0),
                disease: round2(p.probabilities.disease * 100.0),
            },
            status: "success".to_string(),
        }
    }
}

// ============================================================================
// Health Check Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
