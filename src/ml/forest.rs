//! Random forest evaluation over exported scikit-learn trees.
//!
//! Each tree uses the `tree_` array layout: parallel `children_left`,
//! `children_right`, `feature`, `threshold` and `value` arrays indexed by node
//! id. Leaves have `children_left == -1`.

use serde::{Deserialize, Serialize};

use crate::error::{CardioError, Result};
use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::ml::{ClassProbabilities, Classifier};

const LEAF: i64 = -1;
const N_CLASSES: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class weights, shape [n_nodes][n_classes].
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn n_nodes(&self) -> usize {
        self.children_left.len()
    }

    /// Structural checks. Children must point forward so traversal always terminates.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let n = self.n_nodes();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        for (name, len) in [
            ("children_right", self.children_right.len()),
            ("feature", self.feature.len()),
            ("threshold", self.threshold.len()),
            ("value", self.value.len()),
        ] {
            if len != n {
                return Err(format!("{name} len {len} != n_nodes {n}"));
            }
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF {
                if right != LEAF {
                    return Err(format!("node {node} has a right child but no left child"));
                }
                let row = &self.value[node];
                if row.len() != N_CLASSES {
                    return Err(format!(
                        "leaf {node} has {} class weights, expected {N_CLASSES}",
                        row.len()
                    ));
                }
                if row.iter().any(|v| !v.is_finite() || *v < 0.0) {
                    return Err(format!("leaf {node} has invalid class weights"));
                }
                if row.iter().sum::<f64>() <= 0.0 {
                    return Err(format!("leaf {node} has zero total weight"));
                }
                continue;
            }

            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {node} has out-of-order child {child}"));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= FEATURE_COUNT {
                return Err(format!("node {node} splits on unknown feature {feature}"));
            }
            if self.threshold[node].is_nan() {
                return Err(format!("node {node} has a NaN threshold"));
            }
        }
        Ok(())
    }

    /// Class distribution of the leaf reached by `x`.
    ///
    /// Inputs are compared as `f32`, the precision the trees were grown on.
    pub fn leaf_distribution(&self, x: &[f64]) -> Result<[f64; N_CLASSES]> {
        let mut node = 0usize;
        loop {
            let left = *self
                .children_left
                .get(node)
                .ok_or_else(|| CardioError::Inference(format!("tree node {node} missing")))?;
            if left == LEAF {
                let row = &self.value[node];
                let total: f64 = row.iter().sum();
                return Ok([row[0] / total, row[1] / total]);
            }
            let feature = self.feature[node] as usize;
            let value = x
                .get(feature)
                .ok_or_else(|| CardioError::Inference(format!("feature {feature} out of range")))?;
            node = if f64::from(*value as f32) <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}

fn default_classes() -> Vec<i64> {
    vec![0, 1]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    /// Class labels in `predict_proba` column order.
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.classes != default_classes() {
            return Err(format!("classes must be [0, 1], got {:?}", self.classes));
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree[{idx}]: {e}"))?;
        }
        Ok(())
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    /// Mean of the per-tree leaf distributions.
    fn predict_proba(&self, features: &FeatureVector) -> Result<ClassProbabilities> {
        let x = features.as_slice();
        let mut sum = [0.0_f64; N_CLASSES];
        for tree in &self.trees {
            let dist = tree.leaf_distribution(x)?;
            sum[0] += dist[0];
            sum[1] += dist[1];
        }
        let n = self.trees.len() as f64;
        let proba = ClassProbabilities::new(sum[0] / n, sum[1] / n);
        proba.validate()?;
        Ok(proba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Split on `feature` at `threshold`: left leaf favours class 0, right leaf class 1.
    fn stump(feature: i64, threshold: f64, left: [f64; 2], right: [f64; 2]) -> DecisionTree {
        DecisionTree {
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![feature, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![vec![50.0, 50.0], left.to_vec(), right.to_vec()],
        }
    }

    fn vector_with(idx: usize, value: f64) -> FeatureVector {
        let mut values = [0.0; FEATURE_COUNT];
        values[idx] = value;
        FeatureVector::from_values(values).unwrap()
    }

    #[test]
    fn stump_goes_left_on_equal_threshold() {
        let tree = stump(5, 129.5, [8.0, 2.0], [1.0, 3.0]);
        tree.validate().unwrap();
        let x = vector_with(5, 129.5);
        assert_eq!(tree.leaf_distribution(x.as_slice()).unwrap(), [0.8, 0.2]);
        let x = vector_with(5, 140.0);
        assert_eq!(tree.leaf_distribution(x.as_slice()).unwrap(), [0.25, 0.75]);
    }

    #[test]
    fn forest_averages_tree_distributions() {
        let forest = RandomForest {
            classes: vec![0, 1],
            trees: vec![
                stump(5, 129.5, [1.0, 0.0], [0.0, 1.0]),
                stump(1, 60.0, [1.0, 0.0], [0.5, 0.5]),
            ],
        };
        forest.validate().unwrap();

        let mut values = [0.0; FEATURE_COUNT];
        values[5] = 150.0;
        values[1] = 50.0;
        let x = FeatureVector::from_values(values).unwrap();
        let p = forest.predict_proba(&x).unwrap();
        assert!((p.disease - 0.5).abs() < 1e-12);
        assert!((p.no_disease - 0.5).abs() < 1e-12);

        values[1] = 70.0;
        let x = FeatureVector::from_values(values).unwrap();
        let p = forest.predict_proba(&x).unwrap();
        assert!((p.disease - 0.75).abs() < 1e-12);
        assert_eq!(forest.predict(&x).unwrap(), crate::ml::RiskClass::Disease);
    }

    #[test]
    fn rejects_backward_children() {
        let mut tree = stump(5, 129.5, [1.0, 0.0], [0.0, 1.0]);
        tree.children_right[0] = 0;
        assert!(tree.validate().is_err());
    }

    #[test]
    fn rejects_unknown_feature_and_bad_classes() {
        let tree = stump(13, 1.0, [1.0, 0.0], [0.0, 1.0]);
        assert!(tree.validate().is_err());

        let forest = RandomForest {
            classes: vec![1, 2],
            trees: vec![stump(0, 1.0, [1.0, 0.0], [0.0, 1.0])],
        };
        assert!(forest.validate().is_err());
    }
}
