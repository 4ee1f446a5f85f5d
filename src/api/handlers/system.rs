use axum::{extract::State, Json};

use crate::api::{state::AppState, types::HealthResponse};

pub const LIVENESS_MESSAGE: &str = "Cardiovascular Disease Prediction API is running..";

/// GET / -- plain-text liveness string
pub async fn home() -> &'static str {
    LIVENESS_MESSAGE
}

/// GET /api/health -- always 200; reports whether the model loaded
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.predictor.model_loaded(),
    })
}
