//! Request-to-prediction pipeline.
//!
//! body → [`PatientRecord`] → BMI → [`FeatureVector`] → classifier → [`Prediction`].

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{CardioError, Result};
use crate::features::{FeatureVector, PatientRecord};
use crate::ml::{ClassProbabilities, ModelState, RiskClass};

/// Outcome of one prediction, before response formatting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub class: RiskClass,
    pub probabilities: ClassProbabilities,
    pub bmi: f64,
}

impl Prediction {
    /// Probability of the predicted class.
    pub fn confidence(&self) -> f64 {
        self.probabilities.of(self.class)
    }
}

/// Runs predictions against the start-up model state.
#[derive(Debug, Clone)]
pub struct PredictionService {
    model: ModelState,
}

impl PredictionService {
    pub fn new(model: ModelState) -> Self {
        Self { model }
    }

    pub fn model_state(&self) -> &ModelState {
        &self.model
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_loaded()
    }

    /// Predict from a raw request body.
    ///
    /// Model availability is checked before the body is parsed.
    pub fn predict_bytes(&self, body: &[u8]) -> Result<Prediction> {
        self.model.model()?;
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| CardioError::MalformedRequest(format!("invalid JSON body: {e}")))?;
        self.predict_json(&value)
    }

    pub fn predict_json(&self, body: &Value) -> Result<Prediction> {
        self.model.model()?;
        let record = PatientRecord::from_json(body)?;
        self.predict_record(&record)
    }

    pub fn predict_record(&self, record: &PatientRecord) -> Result<Prediction> {
        let model = self.model.model()?;
        let bmi = record.bmi();
        let features = FeatureVector::assemble(record, bmi)?;
        debug!(features = ?features.as_slice(), "Prediction request");

        let classifier = model.classifier();
        let class = classifier.predict(&features)?;
        let probabilities = classifier.predict_proba(&features)?;
        probabilities.validate()?;

        info!(
            prediction = class.as_u8(),
            no_disease = probabilities.no_disease,
            disease = probabilities.disease,
            bmi,
            "Prediction: {}",
            class
        );

        Ok(Prediction {
            class,
            probabilities,
            bmi,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{LoadedModel, MockClassifier, ModelInfo};
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "age": 50, "gender": 1, "height": 170, "weight": 70,
            "ap_hi": 120, "ap_lo": 80, "cholesterol": 1, "gluc": 1,
            "smoke": 0, "alco": 0, "active": 1
        })
    }

    fn service_with(mock: MockClassifier) -> PredictionService {
        let model = LoadedModel::new(Box::new(mock), ModelInfo::new("mock"));
        PredictionService::new(ModelState::loaded(model))
    }

    #[test]
    fn predicts_with_stub_model() {
        let mut mock = MockClassifier::new();
        mock.expect_predict()
            .times(1)
            .returning(|_| Ok(RiskClass::Disease));
        mock.expect_predict_proba()
            .times(1)
            .returning(|_| Ok(ClassProbabilities::new(0.3, 0.7)));

        let prediction = service_with(mock).predict_json(&sample()).unwrap();
        assert_eq!(prediction.class, RiskClass::Disease);
        assert!((prediction.confidence() - 0.7).abs() < 1e-12);
        assert!((prediction.bmi - 70.0 / (1.7 * 1.7)).abs() < 1e-12);
    }

    #[test]
    fn feature_vector_reaches_model_in_training_order() {
        let mut mock = MockClassifier::new();
        mock.expect_predict()
            .withf(|f| {
                let bmi = 70.0 / (1.7 * 1.7);
                f.as_slice()[..12]
                    == [9.0, 50.0, 1.0, 170.0, 70.0, 120.0, 80.0, 1.0, 1.0, 0.0, 0.0, 1.0]
                    && (f.bmi() - bmi).abs() < 1e-12
            })
            .returning(|_| Ok(RiskClass::NoDisease));
        mock.expect_predict_proba()
            .returning(|_| Ok(ClassProbabilities::new(0.8, 0.2)));

        let mut body = sample();
        body["id"] = json!(9);
        let prediction = service_with(mock).predict_json(&body).unwrap();
        assert_eq!(prediction.class, RiskClass::NoDisease);
        assert!((prediction.confidence() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn invalid_input_never_reaches_model() {
        let mut mock = MockClassifier::new();
        mock.expect_predict().never();
        mock.expect_predict_proba().never();
        let service = service_with(mock);

        let mut body = sample();
        body.as_object_mut().unwrap().remove("gluc");
        let err = service.predict_json(&body).unwrap_err();
        assert_eq!(err.to_string(), "missing required field 'gluc'");

        let err = service.predict_bytes(b"{not json").unwrap_err();
        assert!(matches!(err, CardioError::MalformedRequest(_)));

        body = sample();
        body["height"] = json!("0");
        let err = service.predict_json(&body).unwrap_err();
        assert!(matches!(err, CardioError::Validation(_)));
    }

    #[test]
    fn model_errors_propagate() {
        let mut mock = MockClassifier::new();
        mock.expect_predict()
            .returning(|_| Err(CardioError::Inference("tree exploded".to_string())));
        mock.expect_predict_proba().never();

        let err = service_with(mock).predict_json(&sample()).unwrap_err();
        assert_eq!(err.to_string(), "Inference failed: tree exploded");
    }

    #[test]
    fn out_of_range_probabilities_are_rejected() {
        let mut mock = MockClassifier::new();
        mock.expect_predict().returning(|_| Ok(RiskClass::Disease));
        mock.expect_predict_proba()
            .returning(|_| Ok(ClassProbabilities::new(-0.5, 1.5)));

        let err = service_with(mock).predict_json(&sample()).unwrap_err();
        assert!(matches!(err, CardioError::Inference(_)));
    }

    #[test]
    fn unloaded_model_fails_before_parsing() {
        let service = PredictionService::new(ModelState::unloaded("missing"));
        assert!(!service.model_loaded());
        let err = service.predict_bytes(b"garbage").unwrap_err();
        assert!(matches!(err, CardioError::ModelNotLoaded));
        assert_eq!(err.to_string(), "Model not loaded");
    }
}
