use crate::ml::ModelState;
use crate::services::PredictionService;

/// Shared application state for API handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Prediction pipeline over the start-up model
    pub predictor: PredictionService,
}

impl AppState {
    pub fn new(model: ModelState) -> Self {
        Self {
            predictor: PredictionService::new(model),
        }
    }

    pub fn model_state(&self) -> &ModelState {
        self.predictor.model_state()
    }
}
