//! Dense neural network classifier (CPU-only).
//!
//! Small MLPs exported to JSON. A single output unit is read as the disease
//! logit (or probability when the last layer already applies a sigmoid); two
//! output units are normalized with softmax.

use serde::{Deserialize, Serialize};

use crate::error::{CardioError, Result};
use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::ml::{ClassProbabilities, Classifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Tanh,
    Sigmoid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Weights shape: [out_dim][in_dim]
    pub weights: Vec<Vec<f64>>,
    /// Bias shape: [out_dim]
    pub bias: Vec<f64>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    fn out_dim(&self) -> usize {
        self.weights.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseNetwork {
    /// Expected input dimension.
    pub input_dim: usize,

    /// Optional z-score normalization.
    #[serde(default)]
    pub input_mean: Option<Vec<f64>>,
    #[serde(default)]
    pub input_std: Option<Vec<f64>>,

    pub layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.input_dim != FEATURE_COUNT {
            return Err(format!(
                "input_dim {} != feature count {FEATURE_COUNT}",
                self.input_dim
            ));
        }
        if self.layers.is_empty() {
            return Err("layers must not be empty".to_string());
        }
        match (&self.input_mean, &self.input_std) {
            (Some(mean), Some(std)) => {
                if mean.len() != self.input_dim || std.len() != self.input_dim {
                    return Err(format!(
                        "input_mean/input_std lengths {}/{} != input_dim {}",
                        mean.len(),
                        std.len(),
                        self.input_dim
                    ));
                }
                if std.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                    return Err("input_std must be finite and > 0".to_string());
                }
            }
            (None, None) => {}
            _ => return Err("input_mean and input_std must be provided together".to_string()),
        }

        let mut expected_in = self.input_dim;
        for (idx, layer) in self.layers.iter().enumerate() {
            if layer.out_dim() == 0 {
                return Err(format!("layer[{idx}] out_dim must be > 0"));
            }
            if layer.bias.len() != layer.out_dim() {
                return Err(format!(
                    "layer[{idx}] bias len {} != out_dim {}",
                    layer.bias.len(),
                    layer.out_dim()
                ));
            }
            for (r, row) in layer.weights.iter().enumerate() {
                if row.len() != expected_in {
                    return Err(format!(
                        "layer[{idx}] weights row {r} len {} != expected in_dim {expected_in}",
                        row.len()
                    ));
                }
                if row.iter().any(|v| !v.is_finite()) {
                    return Err(format!("layer[{idx}] weights contain non-finite values"));
                }
            }
            if layer.bias.iter().any(|v| !v.is_finite()) {
                return Err(format!("layer[{idx}] bias contain non-finite values"));
            }
            expected_in = layer.out_dim();
        }

        if !(1..=2).contains(&self.output_dim()) {
            return Err(format!(
                "classifier output_dim must be 1 or 2, got {}",
                self.output_dim()
            ));
        }
        Ok(())
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map(|l| l.out_dim()).unwrap_or(0)
    }

    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.input_dim {
            return Err(CardioError::Inference(format!(
                "dense input dim mismatch: got {}, expected {}",
                input.len(),
                self.input_dim
            )));
        }

        let mut x: Vec<f64> = input.to_vec();

        if let (Some(mean), Some(std)) = (&self.input_mean, &self.input_std) {
            for (i, v) in x.iter_mut().enumerate() {
                *v = (*v - mean[i]) / std[i].max(1e-12);
            }
        }

        for layer in &self.layers {
            x = layer
                .weights
                .iter()
                .zip(&layer.bias)
                .map(|(row, b)| {
                    let sum = row.iter().zip(&x).fold(*b, |acc, (w, v)| acc + w * v);
                    apply_activation(sum, layer.activation)
                })
                .collect();
        }

        Ok(x)
    }

    fn last_activation(&self) -> Activation {
        self.layers
            .last()
            .map(|l| l.activation)
            .unwrap_or_default()
    }
}

impl Classifier for DenseNetwork {
    fn predict_proba(&self, features: &FeatureVector) -> Result<ClassProbabilities> {
        let out = self.forward(features.as_slice())?;
        let proba = match out.as_slice() {
            [p] if self.last_activation() == Activation::Sigmoid => {
                ClassProbabilities::from_positive(*p)
            }
            [logit] => ClassProbabilities::from_positive(sigmoid(*logit)),
            [a, b] => {
                let m = a.max(*b);
                let (ea, eb) = ((a - m).exp(), (b - m).exp());
                ClassProbabilities::new(ea / (ea + eb), eb / (ea + eb))
            }
            other => {
                return Err(CardioError::Inference(format!(
                    "dense network produced {} outputs",
                    other.len()
                )))
            }
        };
        proba.validate()?;
        Ok(proba)
    }
}

fn apply_activation(x: f64, act: Activation) -> f64 {
    match act {
        Activation::Linear => x,
        Activation::Relu => x.max(0.0),
        Activation::Tanh => x.tanh(),
        Activation::Sigmoid => sigmoid(x),
    }
}

/// Numerically-stable sigmoid.
pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}
