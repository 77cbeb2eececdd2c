//! Linear value function V(x) = w·x.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::traits::ValueFunction;
use super::weights::{aligned, WeightFile};
use crate::core::{Result, TrainError};
use crate::features::NUM_FEATURES;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearValue {
    weights: Vec<f64>,
    learning_rate: f64,
}

impl LinearValue {
    /// Zero-initialized weights.
    #[must_use]
    pub fn new(n_features: usize, learning_rate: f64) -> Self {
        Self {
            weights: vec![0.0; n_features],
            learning_rate,
        }
    }

    #[must_use]
    pub fn from_weights(weights: Vec<f64>, learning_rate: f64) -> Self {
        Self {
            weights,
            learning_rate,
        }
    }

    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Load a flat weight array, padding or truncating it to the current
    /// feature count. The value half of a combined linear file is accepted
    /// too; neural files are rejected.
    pub fn load(path: impl AsRef<Path>, learning_rate: f64) -> Result<Self> {
        let path = path.as_ref();
        let weights = match WeightFile::read(path)? {
            WeightFile::Linear(weights) => weights,
            WeightFile::CombinedLinear(combined) => combined.value_weights,
            other => {
                return Err(TrainError::ModelMismatch {
                    path: path.to_path_buf(),
                    expected: "linear",
                    found: other.kind_name(),
                })
            }
        };
        Ok(Self::from_weights(aligned(weights, NUM_FEATURES), learning_rate))
    }

    /// Save as a bare JSON array.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        WeightFile::Linear(self.weights.clone()).write(path)
    }

    fn scaled_add(&mut self, direction: &[f64], scale: f64) {
        for (w, d) in self.weights.iter_mut().zip(direction) {
            *w += scale * d;
        }
    }
}

impl ValueFunction for LinearValue {
    type Trace = Vec<f64>;

    fn input_len(&self) -> usize {
        self.weights.len()
    }

    fn evaluate(&self, features: &[f64]) -> f64 {
        self.weights.iter().zip(features).map(|(w, x)| w * x).sum()
    }

    fn step_toward(&mut self, features: &[f64], target: f64) {
        let scale = self.learning_rate * (target - self.evaluate(features));
        self.scaled_add(features, scale);
    }

    fn zero_trace(&self) -> Vec<f64> {
        vec![0.0; self.weights.len()]
    }

    fn accumulate_gradient(&self, features: &[f64], trace: &mut Vec<f64>, decay: f64) {
        for (i, e) in trace.iter_mut().enumerate() {
            *e = decay * *e + features.get(i).copied().unwrap_or(0.0);
        }
    }

    fn apply_trace(&mut self, trace: &Vec<f64>, td_error: f64) {
        let scale = self.learning_rate * td_error;
        self.scaled_add(trace, scale);
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_aligns_lengths() {
        let model = LinearValue::from_weights(vec![1.0, 2.0, 3.0], 0.1);
        assert_eq!(model.evaluate(&[1.0, 1.0, 1.0]), 6.0);
        // Short input: missing features read as zero.
        assert_eq!(model.evaluate(&[1.0]), 1.0);
        // Long input: extra features ignored.
        assert_eq!(model.evaluate(&[1.0, 1.0, 1.0, 100.0]), 6.0);
    }

    #[test]
    fn test_step_toward() {
        let mut model = LinearValue::new(2, 0.5);
        model.step_toward(&[1.0, 0.0], 1.0);
        assert_eq!(model.weights(), &[0.5, 0.0]);
        model.step_toward(&[1.0, 0.0], 1.0);
        assert_eq!(model.weights(), &[0.75, 0.0]);
    }

    #[test]
    fn test_trace_accumulates_with_decay() {
        let model = LinearValue::new(3, 0.1);
        let mut trace = model.zero_trace();
        model.accumulate_gradient(&[1.0, 2.0], &mut trace, 0.5);
        assert_eq!(trace, vec![1.0, 2.0, 0.0]);
        model.accumulate_gradient(&[1.0, 0.0, 4.0], &mut trace, 0.5);
        assert_eq!(trace, vec![1.5, 1.0, 4.0]);
    }

    #[test]
    fn test_save_load_pads_to_feature_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        let model = LinearValue::from_weights(vec![0.25, -1.5, 3.0], 0.01);
        model.save(&path).unwrap();

        let loaded = LinearValue::load(&path, 0.01).unwrap();
        assert_eq!(loaded.weights().len(), NUM_FEATURES);
        assert_eq!(&loaded.weights()[..3], &[0.25, -1.5, 3.0]);
        assert!(loaded.weights()[3..].iter().all(|&w| w == 0.0));
    }

    #[test]
    fn test_load_truncates_long_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        LinearValue::from_weights(vec![1.0; NUM_FEATURES + 5], 0.01)
            .save(&path)
            .unwrap();
        let loaded = LinearValue::load(&path, 0.01).unwrap();
        assert_eq!(loaded.weights().len(), NUM_FEATURES);
    }
}
