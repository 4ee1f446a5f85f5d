//! Logistic regression with an optional standard-scaler front end.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::ml::dense::sigmoid;
use crate::ml::{ClassProbabilities, Classifier};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Standard scaler `mean_`, applied before the linear term when present.
    #[serde(default)]
    pub scaler_mean: Option<Vec<f64>>,
    /// Standard scaler `scale_`.
    #[serde(default)]
    pub scaler_scale: Option<Vec<f64>>,
}

impl LogisticRegression {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(format!(
                "coefficients len {} != feature count {FEATURE_COUNT}",
                self.coefficients.len()
            ));
        }
        if self.coefficients.iter().any(|v| !v.is_finite()) || !self.intercept.is_finite() {
            return Err("coefficients and intercept must be finite".to_string());
        }
        match (&self.scaler_mean, &self.scaler_scale) {
            (Some(mean), Some(scale)) => {
                if mean.len() != FEATURE_COUNT || scale.len() != FEATURE_COUNT {
                    return Err(format!(
                        "scaler lengths {}/{} != feature count {FEATURE_COUNT}",
                        mean.len(),
                        scale.len()
                    ));
                }
                if mean.iter().any(|v| !v.is_finite()) {
                    return Err("scaler_mean must be finite".to_string());
                }
                if scale.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                    return Err("scaler_scale must be finite and > 0".to_string());
                }
            }
            (None, None) => {}
            _ => return Err("scaler_mean and scaler_scale must be provided together".to_string()),
        }
        Ok(())
    }

    /// Raw log-odds of the disease class.
    pub fn decision_function(&self, x: &[f64]) -> f64 {
        let scaled = |i: usize| match (&self.scaler_mean, &self.scaler_scale) {
            (Some(mean), Some(scale)) => (x[i] - mean[i]) / scale[i],
            _ => x[i],
        };
        self.coefficients
            .iter()
            .enumerate()
            .fold(self.intercept, |acc, (i, w)| acc + w * scaled(i))
    }
}

impl Classifier for LogisticRegression {
    fn predict_proba(&self, features: &FeatureVector) -> Result<ClassProbabilities> {
        let p = sigmoid(self.decision_function(features.as_slice()));
        let proba = ClassProbabilities::from_positive(p);
        proba.validate()?;
        Ok(proba)
    }
}
