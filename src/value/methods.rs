//! Value-learning algorithms over game logs.
//!
//! Every method trains each side's states as an independent episode, in the
//! order the sides first appear in the log, and never bootstraps across the
//! change of perspective. Incomplete logs are a no-op.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::shaping::ShapingWeights;
use super::traits::ValueFunction;
use crate::core::TrainError;
use crate::records::GameLog;

/// How targets are formed from a game log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainingMethod {
    /// Every state regresses toward the final outcome.
    #[default]
    #[serde(rename = "mc")]
    MonteCarlo,
    /// Final outcome plus a potential-based shaping term.
    #[serde(rename = "mc_shaped")]
    MonteCarloShaped,
    /// One-step bootstrapped targets.
    #[serde(rename = "td0")]
    Td0,
    /// Eligibility-trace TD.
    #[serde(rename = "td_lambda")]
    TdLambda,
}

impl TrainingMethod {
    pub const ALL: [TrainingMethod; 4] = [
        TrainingMethod::MonteCarlo,
        TrainingMethod::MonteCarloShaped,
        TrainingMethod::Td0,
        TrainingMethod::TdLambda,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TrainingMethod::MonteCarlo => "mc",
            TrainingMethod::MonteCarloShaped => "mc_shaped",
            TrainingMethod::Td0 => "td0",
            TrainingMethod::TdLambda => "td_lambda",
        }
    }
}

impl fmt::Display for TrainingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrainingMethod {
    type Err = TrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrainingMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| TrainError::UnknownMethod(s.to_string()))
    }
}

/// Hyperparameters shared by the methods.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainParams {
    /// Discount factor.
    pub gamma: f64,
    /// Trace decay for TD(λ).
    pub lambda: f64,
    /// Potential for the shaped Monte Carlo method.
    pub shaping: ShapingWeights,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            lambda: 0.8,
            shaping: ShapingWeights::default(),
        }
    }
}

impl TrainParams {
    #[must_use]
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    #[must_use]
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    #[must_use]
    pub fn with_shaping(mut self, shaping: ShapingWeights) -> Self {
        self.shaping = shaping;
        self
    }
}

/// Train on one log with the chosen method.
pub fn train_log<V: ValueFunction>(
    model: &mut V,
    log: &GameLog,
    method: TrainingMethod,
    params: &TrainParams,
) {
    match method {
        TrainingMethod::MonteCarlo => monte_carlo(model, log),
        TrainingMethod::MonteCarloShaped => {
            monte_carlo_shaped(model, log, params.gamma, &params.shaping)
        }
        TrainingMethod::Td0 => td0(model, log, params.gamma),
        TrainingMethod::TdLambda => td_lambda(model, log, params.gamma, params.lambda),
    }
}

/// Target for every state is that side's final reward.
pub fn monte_carlo<V: ValueFunction>(model: &mut V, log: &GameLog) {
    for episode in log.episodes() {
        for features in &episode.states {
            model.step_toward(features, episode.reward);
        }
    }
}

/// Target is `r + γ·Φ(s') − Φ(s)`, or `r − Φ(s)` at a side's last state.
pub fn monte_carlo_shaped<V: ValueFunction>(
    model: &mut V,
    log: &GameLog,
    gamma: f64,
    shaping: &ShapingWeights,
) {
    let width = model.input_len();
    for episode in log.episodes() {
        let n = episode.len();
        for (i, features) in episode.states.iter().enumerate() {
            let phi = shaping.potential(features, width);
            let target = if i + 1 < n {
                let phi_next = shaping.potential(episode.states[i + 1], width);
                episode.reward + gamma * phi_next - phi
            } else {
                episode.reward - phi
            };
            model.step_toward(features, target);
        }
    }
}

/// Target is `γ·V(s')`, or the final reward at a side's last state.
pub fn td0<V: ValueFunction>(model: &mut V, log: &GameLog, gamma: f64) {
    for episode in log.episodes() {
        let n = episode.len();
        for (i, features) in episode.states.iter().enumerate() {
            let target = if i + 1 < n {
                gamma * model.evaluate(episode.states[i + 1])
            } else {
                episode.reward
            };
            model.step_toward(features, target);
        }
    }
}

/// TD(λ) with one eligibility trace per side, reset for every log.
pub fn td_lambda<V: ValueFunction>(model: &mut V, log: &GameLog, gamma: f64, lambda: f64) {
    let decay = gamma * lambda;
    for episode in log.episodes() {
        let n = episode.len();
        let mut trace = model.zero_trace();
        for (i, features) in episode.states.iter().enumerate() {
            let value = model.evaluate(features);
            let td_error = if i + 1 < n {
                gamma * model.evaluate(episode.states[i + 1]) - value
            } else {
                episode.reward - value
            };
            model.accumulate_gradient(features, &mut trace, decay);
            model.apply_trace(&trace, td_error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Side;
    use crate::records::ResultRecord;
    use crate::value::LinearValue;

    fn two_state_log(winner: Option<Side>) -> GameLog {
        GameLog::new()
            .with_state(vec![1.0, 0.0, 0.5, 0.0, 1.0], Side::Home)
            .with_state(vec![1.0, 0.0, 0.6, 0.0, 1.0], Side::Home)
            .with_result(ResultRecord {
                home_score: 0,
                away_score: 0,
                winner,
            })
    }

    #[test]
    fn test_method_names() {
        for method in TrainingMethod::ALL {
            assert_eq!(method.as_str().parse::<TrainingMethod>().unwrap(), method);
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
        }
        let err = "sarsa".parse::<TrainingMethod>().unwrap_err();
        assert!(matches!(err, TrainError::UnknownMethod(ref m) if m == "sarsa"));
    }

    #[test]
    fn test_mc_win_raises_shared_weight() {
        let mut model = LinearValue::new(5, 0.1);
        monte_carlo(&mut model, &two_state_log(Some(Side::Home)));
        assert!(model.weights()[0] > 0.0);
    }

    #[test]
    fn test_mc_loss_lowers_shared_weight() {
        let mut model = LinearValue::new(5, 0.1);
        monte_carlo(&mut model, &two_state_log(Some(Side::Away)));
        assert!(model.weights()[0] < 0.0);
    }

    #[test]
    fn test_mc_draw_from_zero_is_noop() {
        let mut model = LinearValue::new(5, 0.1);
        monte_carlo(&mut model, &two_state_log(None));
        assert!(model.weights().iter().all(|&w| w == 0.0));
    }

    #[test]
    fn test_td0_terminal_only_learns_reward() {
        // From zero weights the non-terminal target is γ·0 = 0, so only the
        // last state moves the weights.
        let mut model = LinearValue::new(5, 0.1);
        td0(&mut model, &two_state_log(Some(Side::Home)), 0.99);
        assert!((model.weights()[0] - 0.1).abs() < 1e-12);
        assert!((model.weights()[2] - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_td_lambda_trace_spreads_credit() {
        let mut model = LinearValue::new(5, 0.1);
        td_lambda(&mut model, &two_state_log(Some(Side::Home)), 1.0, 1.0);
        // Terminal error 1.0 applied along trace [2, 0, 1.1, 0, 2].
        assert!((model.weights()[0] - 0.2).abs() < 1e-12);
        assert!((model.weights()[2] - 0.11).abs() < 1e-12);
    }

    #[test]
    fn test_incomplete_log_noop_for_all_methods() {
        let log = GameLog::new().with_state(vec![1.0; 5], Side::Home);
        for method in TrainingMethod::ALL {
            let mut model = LinearValue::new(5, 0.1);
            train_log(&mut model, &log, method, &TrainParams::default());
            assert!(model.weights().iter().all(|&w| w == 0.0), "{method}");
        }
    }
}
