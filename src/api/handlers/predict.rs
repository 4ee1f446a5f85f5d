use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};

use crate::api::{error::ApiError, state::AppState, types::PredictionResponse};
use crate::error::CardioError;

/// POST /api/predict
///
/// The body is taken as raw bytes so that bad JSON goes through the same
/// `500 {error}` path as a bad field. A missing or non-JSON content type is
/// rejected the same way, after the model check.
pub async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<Json<PredictionResponse>, ApiError> {
    state.model_state().model()?;
    if !is_json_content_type(&headers) {
        return Err(CardioError::MalformedRequest("expected application/json body".to_string()).into());
    }

    let prediction = state.predictor.predict_bytes(&body)?;
    Ok(Json(prediction.into()))
}

/// `application/json` or any `application/*+json`, parameters ignored.
fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}
