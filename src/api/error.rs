use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::api::types::ErrorResponse;
use crate::error::CardioError;

/// Handler error rendered as `500 {"error": "..."}`.
///
/// Model unavailable, malformed request and inference failure all share
/// this status; only the message differs.
#[derive(Debug)]
pub struct ApiError(pub CardioError);

impl From<CardioError> for ApiError {
    fn from(err: CardioError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.0.to_string();
        if self.0.is_client_error() {
            warn!("Rejected request: {}", message);
        } else {
            error!("Request failed: {}", message);
        }
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error: message }),
        )
            .into_response()
    }
}
