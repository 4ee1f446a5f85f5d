use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::home))
        // System endpoints
        .route("/api/health", get(handlers::health_handler))
        .route("/api/model", get(handlers::get_model_info))
        // Prediction endpoints
        .route("/api/predict", post(handlers::predict))
        // Add state and CORS
        .with_state(state)
        .layer(cors)
}
