//! Linear softmax policy distilled from search visit counts.
//!
//! For a decision with candidates a₁..aₖ, candidate i's logit is
//! `w·[state ‖ actionᵢ] + b`. Training minimizes the cross-entropy between
//! the softmax over those logits and the normalized visit fractions.

use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::features::{NUM_ACTION_FEATURES, NUM_FEATURES, POLICY_INPUT_SIZE};
use crate::records::PolicyDecision;
use crate::value::DEFAULT_POLICY_TEMPERATURE;

/// Bound applied to every weight and the bias after each update.
pub const WEIGHT_CLAMP: f64 = 5.0;

/// Added inside the log of the loss to keep it finite.
const LOG_EPSILON: f64 = 1e-8;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyTrainer {
    weights: Vec<f64>,
    bias: f64,
    learning_rate: f64,
    /// Softmax temperature for the engine's search; not used in training.
    temperature: f64,
}

impl PolicyTrainer {
    /// Zero weights over the full policy input.
    #[must_use]
    pub fn new(learning_rate: f64) -> Self {
        Self {
            weights: vec![0.0; POLICY_INPUT_SIZE],
            bias: 0.0,
            learning_rate,
            temperature: DEFAULT_POLICY_TEMPERATURE,
        }
    }

    /// Restore from persisted parameters, padding or truncating the weights.
    #[must_use]
    pub fn from_parts(weights: Vec<f64>, bias: f64, learning_rate: f64, temperature: f64) -> Self {
        Self {
            weights: crate::value::aligned(weights, POLICY_INPUT_SIZE),
            bias,
            learning_rate,
            temperature,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[must_use]
    pub fn bias(&self) -> f64 {
        self.bias
    }

    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
    }

    /// Concatenated input for one candidate: state features in the first
    /// slots, action features after them, each truncated to its block.
    fn input_row(state: &[f64], action: &[f64]) -> [f64; POLICY_INPUT_SIZE] {
        let mut row = [0.0; POLICY_INPUT_SIZE];
        let n_state = state.len().min(NUM_FEATURES);
        let n_action = action.len().min(NUM_ACTION_FEATURES);
        row[..n_state].copy_from_slice(&state[..n_state]);
        row[NUM_FEATURES..NUM_FEATURES + n_action].copy_from_slice(&action[..n_action]);
        row
    }

    fn logit(&self, row: &[f64; POLICY_INPUT_SIZE]) -> f64 {
        self.weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + self.bias
    }

    /// Softmax over the decision's candidates.
    #[must_use]
    pub fn probabilities(&self, decision: &PolicyDecision) -> SmallVec<[f64; 8]> {
        let logits: SmallVec<[f64; 8]> = decision
            .visits
            .iter()
            .map(|v| self.logit(&Self::input_row(&decision.state_features, &v.action_features)))
            .collect();
        softmax(&logits)
    }

    /// One gradient step per decision, in order. Returns the mean
    /// cross-entropy over decisions that had at least one candidate.
    pub fn train_on_decisions(&mut self, decisions: &[PolicyDecision]) -> f64 {
        let mut total_loss = 0.0;
        let mut trained = 0usize;

        for decision in decisions {
            if decision.visits.is_empty() {
                continue;
            }
            let rows: SmallVec<[[f64; POLICY_INPUT_SIZE]; 8]> = decision
                .visits
                .iter()
                .map(|v| Self::input_row(&decision.state_features, &v.action_features))
                .collect();
            let targets = decision.targets();
            let logits: SmallVec<[f64; 8]> = rows.iter().map(|r| self.logit(r)).collect();
            let probs = softmax(&logits);

            total_loss -= targets
                .iter()
                .zip(&probs)
                .map(|(t, p)| t * (p + LOG_EPSILON).ln())
                .sum::<f64>();

            let mut grad_weights = [0.0; POLICY_INPUT_SIZE];
            let mut grad_bias = 0.0;
            for ((row, p), t) in rows.iter().zip(&probs).zip(&targets) {
                let g = p - t;
                grad_bias += g;
                for (gw, x) in grad_weights.iter_mut().zip(row) {
                    *gw += g * x;
                }
            }

            for (w, g) in self.weights.iter_mut().zip(&grad_weights) {
                *w = (*w - self.learning_rate * g).clamp(-WEIGHT_CLAMP, WEIGHT_CLAMP);
            }
            self.bias = (self.bias - self.learning_rate * grad_bias).clamp(-WEIGHT_CLAMP, WEIGHT_CLAMP);
            trained += 1;
        }

        let loss = total_loss / trained.max(1) as f64;
        debug!("policy pass: {trained} decisions, loss {loss:.4}");
        loss
    }
}

/// Numerically stable softmax.
fn softmax(logits: &[f64]) -> SmallVec<[f64; 8]> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: SmallVec<[f64; 8]> = logits.iter().map(|&l| (l - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
