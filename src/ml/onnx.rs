//! ONNX inference wrapper (pure Rust via `tract-onnx`).
//!
//! Serves classifiers converted with `skl2onnx` (use `zipmap=False` so the
//! probabilities come out as a plain `f32` tensor).

use std::path::Path;

use crate::error::{CardioError, Result};
use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::ml::{ClassProbabilities, Classifier, LoadedModel, ModelInfo};

use tract_onnx::prelude::*;

pub struct OnnxModel {
    plan: TypedRunnableModel<TypedModel>,
}

impl std::fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxModel")
            .field("input_shape", &[1, FEATURE_COUNT])
            .finish()
    }
}

impl OnnxModel {
    /// Load an ONNX model specialized to a `[1, 13]` f32 input.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| CardioError::IncompatibleModel(format!("onnx load failed: {e}")))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, FEATURE_COUNT)),
            )
            .map_err(|e| CardioError::IncompatibleModel(format!("onnx input fact failed: {e}")))?;

        let plan = model
            .into_optimized()
            .map_err(|e| CardioError::IncompatibleModel(format!("onnx optimize failed: {e}")))?
            .into_runnable()
            .map_err(|e| CardioError::IncompatibleModel(format!("onnx runnable failed: {e}")))?;

        let model = Self { plan };

        // Dry run so shape problems surface at start-up, not on the first request.
        let zeros = FeatureVector::from_values([0.0; FEATURE_COUNT])?;
        model.predict_proba(&zeros)?;

        Ok(model)
    }

    pub fn into_loaded(self, source: Option<String>) -> LoadedModel {
        let mut info = ModelInfo::new("onnx");
        info.source = source;
        LoadedModel::new(Box::new(self), info)
    }

    fn run(&self, features: &FeatureVector) -> Result<TVec<TValue>> {
        let input: Vec<f32> = features.as_slice().iter().map(|v| *v as f32).collect();
        let tensor = tract_ndarray::Array2::<f32>::from_shape_vec((1, FEATURE_COUNT), input)
            .map_err(|e| CardioError::Inference(format!("onnx input reshape failed: {e}")))?
            .into_tvalue();

        self.plan
            .run(tvec!(tensor))
            .map_err(|e| CardioError::Inference(format!("onnx run failed: {e}")))
    }
}

impl Classifier for OnnxModel {
    fn predict_proba(&self, features: &FeatureVector) -> Result<ClassProbabilities> {
        let outputs = self.run(features)?;
        probabilities_from_outputs(&outputs)
    }
}

/// The first `f32` output holding one or two values is the probability row.
///
/// skl2onnx classifiers emit an `int64` label before the probabilities; that
/// output is skipped.
fn probabilities_from_outputs(outputs: &[TValue]) -> Result<ClassProbabilities> {
    let proba = outputs
        .iter()
        .filter_map(|out| out.to_array_view::<f32>().ok())
        .find_map(|arr| match arr.len() {
            2 => {
                let mut it = arr.iter();
                let (a, b) = (it.next().copied()?, it.next().copied()?);
                Some(ClassProbabilities::new(f64::from(a), f64::from(b)))
            }
            1 => arr
                .iter()
                .next()
                .map(|p| ClassProbabilities::from_positive(f64::from(*p))),
            _ => None,
        })
        .ok_or_else(|| {
            CardioError::Inference("onnx model produced no probability output".to_string())
        })?;
    proba.validate()?;
    Ok(proba)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_label_output_and_reads_probability_row() {
        let outputs = tvec!(
            tensor1(&[1i64]).into_tvalue(),
            tensor2(&[[0.3f32, 0.7]]).into_tvalue()
        );
        let proba = probabilities_from_outputs(&outputs).unwrap();
        assert!((proba.no_disease - 0.3).abs() < 1e-6);
        assert!((proba.disease - 0.7).abs() < 1e-6);
    }

    #[test]
    fn single_value_is_positive_class_probability() {
        let outputs = tvec!(tensor2(&[[0.25f32]]).into_tvalue());
        let proba = probabilities_from_outputs(&outputs).unwrap();
        assert!((proba.disease - 0.25).abs() < 1e-6);
        assert!((proba.no_disease - 0.75).abs() < 1e-6);
    }

    #[test]
    fn wide_or_missing_float_output_is_an_error() {
        let outputs = tvec!(
            tensor1(&[0i64]).into_tvalue(),
            tensor2(&[[0.2f32, 0.3, 0.5]]).into_tvalue()
        );
        assert!(matches!(
            probabilities_from_outputs(&outputs),
            Err(CardioError::Inference(_))
        ));

        let labels_only = tvec!(tensor1(&[1i64]).into_tvalue());
        assert!(probabilities_from_outputs(&labels_only).is_err());
    }

    #[test]
    fn out_of_range_probabilities_are_rejected() {
        let outputs = tvec!(tensor2(&[[1.5f32, -0.5]]).into_tvalue());
        assert!(probabilities_from_outputs(&outputs).is_err());
    }
}
