//! Two-layer value network.
//!
//! `h = relu(x·W1 + b1)`, `V = tanh(h·W2 + b2)`. W1 is stored row-major,
//! one row of `hidden_size` weights per input feature.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::traits::ValueFunction;
use super::weights::{NeuralLayers, WeightFile};
use crate::core::{Result, TrainError, TrainRng};

/// Parameters (or gradients, or traces) of a [`NeuralValue`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeuralParams {
    pub w1: Vec<f64>,
    pub b1: Vec<f64>,
    pub w2: Vec<f64>,
    pub b2: f64,
}

impl NeuralParams {
    fn zeros(n_features: usize, hidden_size: usize) -> Self {
        Self {
            w1: vec![0.0; n_features * hidden_size],
            b1: vec![0.0; hidden_size],
            w2: vec![0.0; hidden_size],
            b2: 0.0,
        }
    }

    /// self ← decay·self + other
    fn decay_add(&mut self, other: &NeuralParams, decay: f64) {
        let pairs = self
            .w1
            .iter_mut()
            .zip(&other.w1)
            .chain(self.b1.iter_mut().zip(&other.b1))
            .chain(self.w2.iter_mut().zip(&other.w2));
        for (a, b) in pairs {
            *a = decay * *a + b;
        }
        self.b2 = decay * self.b2 + other.b2;
    }

    /// self ← self + scale·other
    fn scaled_add(&mut self, other: &NeuralParams, scale: f64) {
        let pairs = self
            .w1
            .iter_mut()
            .zip(&other.w1)
            .chain(self.b1.iter_mut().zip(&other.b1))
            .chain(self.w2.iter_mut().zip(&other.w2));
        for (a, b) in pairs {
            *a += scale * b;
        }
        self.b2 += scale * other.b2;
    }
}

/// Activations from one forward pass.
struct Forward {
    pre: Vec<f64>,
    hidden: Vec<f64>,
    value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeuralValue {
    n_features: usize,
    hidden_size: usize,
    params: NeuralParams,
    learning_rate: f64,
}

impl NeuralValue {
    /// Xavier-uniform weights, zero biases.
    pub fn new(n_features: usize, hidden_size: usize, learning_rate: f64, rng: &mut TrainRng) -> Self {
        let limit1 = (6.0 / (n_features + hidden_size) as f64).sqrt();
        let limit2 = (6.0 / (hidden_size + 1) as f64).sqrt();
        let mut params = NeuralParams::zeros(n_features, hidden_size);
        for w in &mut params.w1 {
            *w = rng.uniform(-limit1, limit1);
        }
        for w in &mut params.w2 {
            *w = rng.uniform(-limit2, limit2);
        }
        Self {
            n_features,
            hidden_size,
            params,
            learning_rate,
        }
    }

    /// Build from explicit parameters; shapes must agree.
    pub fn from_params(
        n_features: usize,
        hidden_size: usize,
        params: NeuralParams,
        learning_rate: f64,
    ) -> Result<Self> {
        if params.w1.len() != n_features * hidden_size {
            return Err(TrainError::ShapeMismatch(format!(
                "W1 has {} weights, expected {}x{}",
                params.w1.len(),
                n_features,
                hidden_size
            )));
        }
        if params.b1.len() != hidden_size || params.w2.len() != hidden_size {
            return Err(TrainError::ShapeMismatch(format!(
                "hidden layer sizes disagree (b1 {}, W2 {}, expected {})",
                params.b1.len(),
                params.w2.len(),
                hidden_size
            )));
        }
        Ok(Self {
            n_features,
            hidden_size,
            params,
            learning_rate,
        })
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    #[must_use]
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    #[must_use]
    pub fn params(&self) -> &NeuralParams {
        &self.params
    }

    /// Load a network file. Flat linear arrays are rejected; the value half
    /// of a combined neural file is accepted.
    pub fn load(path: impl AsRef<Path>, learning_rate: f64) -> Result<Self> {
        let path = path.as_ref();
        let layers = match WeightFile::read(path)? {
            WeightFile::Neural(layers) => layers,
            WeightFile::CombinedNeural(combined) => combined.value_layers(),
            other => {
                return Err(TrainError::ModelMismatch {
                    path: path.to_path_buf(),
                    expected: "neural",
                    found: other.kind_name(),
                })
            }
        };
        layers.into_value(path, learning_rate)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        WeightFile::Neural(NeuralLayers::from_value(self)).write(path)
    }

    fn forward(&self, features: &[f64]) -> Forward {
        let h = self.hidden_size;
        let mut pre = self.params.b1.clone();
        for (i, &x) in features.iter().take(self.n_features).enumerate() {
            if x == 0.0 {
                continue;
            }
            let row = &self.params.w1[i * h..(i + 1) * h];
            for (z, w) in pre.iter_mut().zip(row) {
                *z += x * w;
            }
        }
        let hidden: Vec<f64> = pre.iter().map(|&z| z.max(0.0)).collect();
        let out: f64 = hidden
            .iter()
            .zip(&self.params.w2)
            .map(|(a, w)| a * w)
            .sum::<f64>()
            + self.params.b2;
        Forward {
            pre,
            hidden,
            value: out.tanh(),
        }
    }

    /// ∇V(s) with respect to every parameter, plus V(s).
    fn gradient(&self, features: &[f64]) -> (NeuralParams, f64) {
        let Forward { pre, hidden, value } = self.forward(features);
        let h = self.hidden_size;
        let dout = 1.0 - value * value;

        let mut grad = NeuralParams::zeros(self.n_features, h);
        grad.b2 = dout;
        for j in 0..h {
            grad.w2[j] = hidden[j] * dout;
            grad.b1[j] = if pre[j] > 0.0 {
                self.params.w2[j] * dout
            } else {
                0.0
            };
        }
        for (i, &x) in features.iter().take(self.n_features).enumerate() {
            let row = &mut grad.w1[i * h..(i + 1) * h];
            for (g, db) in row.iter_mut().zip(&grad.b1) {
                *g = x * db;
            }
        }
        (grad, value)
    }
}

impl ValueFunction for NeuralValue {
    type Trace = NeuralParams;

    fn input_len(&self) -> usize {
        self.n_features
    }

    fn evaluate(&self, features: &[f64]) -> f64 {
        self.forward(features).value
    }

    fn step_toward(&mut self, features: &[f64], target: f64) {
        let (grad, value) = self.gradient(features);
        let scale = self.learning_rate * (target - value);
        self.params.scaled_add(&grad, scale);
    }

    fn zero_trace(&self) -> NeuralParams {
        NeuralParams::zeros(self.n_features, self.hidden_size)
    }

    fn accumulate_gradient(&self, features: &[f64], trace: &mut NeuralParams, decay: f64) {
        let (grad, _) = self.gradient(features);
        trace.decay_add(&grad, decay);
    }

    fn apply_trace(&mut self, trace: &NeuralParams, td_error: f64) {
        let scale = self.learning_rate * td_error;
        self.params.scaled_add(trace, scale);
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
    }
}
