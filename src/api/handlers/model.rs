use axum::{extract::State, Json};

use crate::api::{error::ApiError, state::AppState};
use crate::ml::ModelInfo;

/// GET /api/model -- descriptor of the loaded artifact
pub async fn get_model_info(
    State(state): State<AppState>,
) -> std::result::Result<Json<ModelInfo>, ApiError> {
    let model = state.model_state().model()?;
    Ok(Json(model.info().clone()))
}
