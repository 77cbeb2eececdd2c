//! Exploration-free validation matches against fixed opponents.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::config::TrainingConfig;
use super::simulator::{SimulationRequest, Simulator};

/// Outcome against one benchmark opponent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub opponent: String,
    pub win_rate: f64,
    pub avg_score_diff: f64,
    pub matches: usize,
}

impl BenchmarkResult {
    pub fn new(opponent: impl Into<String>, win_rate: f64, avg_score_diff: f64, matches: usize) -> Self {
        Self {
            opponent: opponent.into(),
            win_rate,
            avg_score_diff,
            matches,
        }
    }

    /// Zero entry recorded when the simulator failed for this opponent.
    pub fn failed(opponent: impl Into<String>) -> Self {
        Self::new(opponent, 0.0, 0.0, 0)
    }
}

/// Results for every benchmarked opponent, in the order played.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub results: Vec<BenchmarkResult>,
}

impl BenchmarkReport {
    pub fn get(&self, opponent: &str) -> Option<&BenchmarkResult> {
        self.results.iter().find(|r| r.opponent == opponent)
    }
}

/// How benchmark matches are played.
#[derive(Clone, Debug, PartialEq)]
pub struct BenchmarkConfig {
    pub opponents: Vec<String>,
    pub matches_per_opponent: u32,
    pub timeout_per_game: Duration,
    /// Drop the greedy opponent from the pool.
    pub skip_greedy: bool,
    pub team_value: Option<u32>,
    pub mcts_iterations: u32,
    /// Only used when `mcts_iterations > 0`.
    pub policy_weights: Option<PathBuf>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            opponents: vec!["random".to_string(), "greedy".to_string()],
            matches_per_opponent: 50,
            timeout_per_game: Duration::from_secs(120),
            skip_greedy: false,
            team_value: None,
            mcts_iterations: 0,
            policy_weights: None,
        }
    }
}

impl BenchmarkConfig {
    /// Benchmark settings implied by a training run.
    pub fn from_training(config: &TrainingConfig) -> Self {
        Self {
            opponents: config.benchmark_opponents.clone(),
            matches_per_opponent: config.benchmark_matches,
            timeout_per_game: config.benchmark_timeout(),
            skip_greedy: config.skip_greedy_benchmark,
            team_value: config.team_value,
            mcts_iterations: config.mcts_iterations,
            policy_weights: config.use_policy().then(|| config.weights_path()),
        }
    }

    pub fn with_opponents<S: Into<String>>(mut self, opponents: impl IntoIterator<Item = S>) -> Self {
        self.opponents = opponents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_matches(mut self, matches: u32) -> Self {
        self.matches_per_opponent = matches;
        self
    }

    pub fn with_skip_greedy(mut self, skip: bool) -> Self {
        self.skip_greedy = skip;
        self
    }

    pub fn with_timeout(mut self, per_game: Duration) -> Self {
        self.timeout_per_game = per_game;
        self
    }

    fn pool(&self) -> impl Iterator<Item = &str> {
        self.opponents
            .iter()
            .map(String::as_str)
            .filter(move |o| !(self.skip_greedy && *o == "greedy"))
    }
}

/// Plays the learning agent greedily against each opponent in the pool.
#[derive(Clone, Debug, Default)]
pub struct BenchmarkEvaluator {
    config: BenchmarkConfig,
}

impl BenchmarkEvaluator {
    pub fn new(config: BenchmarkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Benchmark `weights`. A simulator failure against one opponent is
    /// logged and recorded as a zero result; the rest still run.
    pub fn evaluate<S: Simulator + ?Sized>(&self, simulator: &mut S, weights: &Path, seed: u64) -> BenchmarkReport {
        let home_ai = if self.config.mcts_iterations > 0 {
            "macro_mcts"
        } else {
            "learning"
        };

        let mut report = BenchmarkReport::default();
        for (i, opponent) in self.config.pool().enumerate() {
            let mut request = SimulationRequest::new(home_ai, opponent, self.config.matches_per_opponent)
                .with_weights(weights)
                .with_epsilon(0.0)
                .with_timeout(self.config.timeout_per_game)
                .with_seed(seed.wrapping_add(i as u64));
            request.team_value = self.config.team_value;
            request.mcts_iterations = self.config.mcts_iterations;
            if self.config.mcts_iterations > 0 {
                request.policy_weights = self.config.policy_weights.clone();
            }

            let result = match simulator.simulate(&request) {
                Ok(batch) => BenchmarkResult::new(
                    opponent,
                    batch.home_win_rate(),
                    batch.avg_score_diff(),
                    batch.len(),
                ),
                Err(e) => {
                    warn!("benchmark vs {opponent} failed: {e}");
                    BenchmarkResult::failed(opponent)
                }
            };
            info!(
                "benchmark vs {}: {:.1}% (score diff {:+.2})",
                result.opponent,
                result.win_rate * 100.0,
                result.avg_score_diff
            );
            report.results.push(result);
        }
        report
    }
}

/// One-shot benchmark with the given settings.
pub fn run_benchmark<S: Simulator + ?Sized>(
    simulator: &mut S,
    weights: &Path,
    config: BenchmarkConfig,
    seed: u64,
) -> BenchmarkReport {
    BenchmarkEvaluator::new(config).evaluate(simulator, weights, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SimulatorError;
    use crate::training::simulator::{GameOutcome, SimulationBatch};

    struct Scripted {
        seen: Vec<SimulationRequest>,
    }

    impl Simulator for Scripted {
        fn simulate(&mut self, request: &SimulationRequest) -> Result<SimulationBatch, SimulatorError> {
            self.seen.push(request.clone());
            match request.away_ai.as_str() {
                "random" => Ok(SimulationBatch::new(vec![
                    GameOutcome::new(2, 0),
                    GameOutcome::new(1, 1),
                ])),
                "greedy" => Err(SimulatorError::Failed("crashed".into())),
                _ => Ok(SimulationBatch::new(vec![GameOutcome::new(0, 1)])),
            }
        }
    }

    #[test]
    fn test_failure_recorded_as_zero_and_rest_continue() {
        let mut sim = Scripted { seen: Vec::new() };
        let config = BenchmarkConfig::default()
            .with_opponents(["random", "greedy", "ogre"])
            .with_matches(2);
        let report = run_benchmark(&mut sim, Path::new("w.json"), config, 7);

        assert_eq!(report.results.len(), 3);
        let random = report.get("random").unwrap();
        assert_eq!(random.win_rate, 0.5);
        assert_eq!(random.avg_score_diff, 1.0);
        assert_eq!(random.matches, 2);
        assert_eq!(report.get("greedy").unwrap(), &BenchmarkResult::failed("greedy"));
        assert_eq!(report.get("ogre").unwrap().matches, 1);
    }

    #[test]
    fn test_greedy_play_and_skip() {
        let mut sim = Scripted { seen: Vec::new() };
        let config = BenchmarkConfig::default().with_skip_greedy(true);
        let report = BenchmarkEvaluator::new(config).evaluate(&mut sim, Path::new("w.json"), 0);

        assert_eq!(report.results.len(), 1);
        assert!(report.get("greedy").is_none());
        assert!(sim.seen.iter().all(|r| r.epsilon == 0.0 && r.home_ai == "learning"));
        assert!(sim.seen.iter().all(|r| r.policy_weights.is_none()));
    }
}
