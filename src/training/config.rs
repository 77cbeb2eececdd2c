//! Run configuration for the training orchestrator.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{Result, TrainError};
use crate::value::{ModelKind, ShapingWeights, TrainParams, TrainingMethod};

/// Replay capacity used when search-based play is on but no buffer was asked for.
pub const AUTO_REPLAY_CAPACITY: usize = 10_000;
/// Smallest replay batch used alongside [`AUTO_REPLAY_CAPACITY`].
pub const AUTO_REPLAY_BATCH: usize = 64;

/// One opponent tier of the curriculum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurriculumStage {
    /// Opponent AI name handed to the simulator.
    pub opponent: String,
    /// Play the learning agent against itself instead of `opponent`.
    #[serde(default)]
    pub self_play: bool,
    /// Rolling win rate that clears this stage. `None` never advances.
    #[serde(default)]
    pub win_rate_threshold: Option<f64>,
}

impl CurriculumStage {
    pub fn new(opponent: impl Into<String>, win_rate_threshold: Option<f64>) -> Self {
        Self {
            opponent: opponent.into(),
            self_play: false,
            win_rate_threshold,
        }
    }

    #[must_use]
    pub fn with_self_play(mut self, self_play: bool) -> Self {
        self.self_play = self_play;
        self
    }
}

/// Random, then greedy, then open-ended self-play.
pub fn default_curriculum() -> Vec<CurriculumStage> {
    vec![
        CurriculumStage::new("random", Some(0.65)),
        CurriculumStage::new("greedy", Some(0.55)),
        CurriculumStage::new("learning", None).with_self_play(true),
    ]
}

/// Everything a training run needs to know.
///
/// Relative paths are resolved against `root`, the simulator's working
/// directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: u32,
    pub games_per_epoch: u32,
    /// Away AI when not self-playing and no curriculum is active.
    pub opponent: String,

    pub learning_rate: f64,
    /// Multiplicative learning-rate decay applied once per epoch.
    pub lr_decay: f64,
    pub epsilon_start: f64,
    pub epsilon_end: f64,

    pub method: TrainingMethod,
    #[serde(flatten)]
    pub params: TrainParams,
    pub model: ModelKind,
    pub hidden_size: usize,

    pub root: PathBuf,
    pub weights_file: PathBuf,
    pub log_dir: PathBuf,
    pub metrics_csv: PathBuf,
    /// Defaults to `benchmark_results.csv` beside the metrics file.
    pub benchmark_csv: Option<PathBuf>,

    pub home_race: String,
    /// Games are split across these away races, earliest races taking the
    /// remainder.
    pub away_races: Vec<String>,
    pub team_value: Option<u32>,
    pub self_play: bool,
    /// Frozen weights for the away learning agent.
    pub opponent_weights: Option<PathBuf>,

    /// Search iterations per action. Zero plays the plain learning agent.
    pub mcts_iterations: u32,
    /// Policy learning rate. Policy training needs this and search both.
    pub policy_lr: f64,
    pub policy_temperature: f64,

    /// Zero disables replay unless search-based play turns it on.
    pub replay_buffer_size: usize,
    pub replay_batch_size: usize,

    /// Benchmark every this many epochs. Zero disables benchmarking.
    pub benchmark_interval: u32,
    pub benchmark_matches: u32,
    pub benchmark_opponents: Vec<String>,
    /// Opponent whose result drives snapshots, promotion and rollback.
    pub benchmark_primary: String,
    pub skip_greedy_benchmark: bool,
    /// Per-game benchmark deadline. Falls back to `timeout_secs`.
    pub benchmark_timeout_secs: Option<u64>,
    /// Per-game deadline for training games.
    pub timeout_secs: u64,

    pub curriculum: bool,
    pub curriculum_stages: Vec<CurriculumStage>,
    /// Benchmark drop below best that triggers rollback.
    pub regression_margin: f64,

    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            games_per_epoch: 20,
            opponent: "random".to_string(),
            learning_rate: 0.01,
            lr_decay: 1.0,
            epsilon_start: 0.3,
            epsilon_end: 0.05,
            method: TrainingMethod::MonteCarlo,
            params: TrainParams::default(),
            model: ModelKind::Linear,
            hidden_size: 32,
            root: PathBuf::from("."),
            weights_file: PathBuf::from("weights.json"),
            log_dir: PathBuf::from("training_logs"),
            metrics_csv: PathBuf::from("training_results.csv"),
            benchmark_csv: None,
            home_race: "random".to_string(),
            away_races: vec!["random".to_string()],
            team_value: None,
            self_play: false,
            opponent_weights: None,
            mcts_iterations: 0,
            policy_lr: 0.0,
            policy_temperature: crate::value::DEFAULT_POLICY_TEMPERATURE,
            replay_buffer_size: 0,
            replay_batch_size: 64,
            benchmark_interval: 0,
            benchmark_matches: 20,
            benchmark_opponents: vec!["random".to_string(), "greedy".to_string()],
            benchmark_primary: "random".to_string(),
            skip_greedy_benchmark: false,
            benchmark_timeout_secs: None,
            timeout_secs: 120,
            curriculum: false,
            curriculum_stages: default_curriculum(),
            regression_margin: 0.05,
            seed: 0,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON config. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| TrainError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| TrainError::json(path, e))
    }

    pub fn with_epochs(mut self, epochs: u32) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_games_per_epoch(mut self, games: u32) -> Self {
        self.games_per_epoch = games;
        self
    }

    pub fn with_opponent(mut self, opponent: impl Into<String>) -> Self {
        self.opponent = opponent.into();
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_lr_decay(mut self, decay: f64) -> Self {
        self.lr_decay = decay;
        self
    }

    pub fn with_epsilon(mut self, start: f64, end: f64) -> Self {
        self.epsilon_start = start;
        self.epsilon_end = end;
        self
    }

    pub fn with_method(mut self, method: TrainingMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.params.gamma = gamma;
        self
    }

    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.params.lambda = lambda;
        self
    }

    pub fn with_shaping(mut self, shaping: ShapingWeights) -> Self {
        self.params.shaping = shaping;
        self
    }

    pub fn with_model(mut self, model: ModelKind, hidden_size: usize) -> Self {
        self.model = model;
        self.hidden_size = hidden_size;
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_weights_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.weights_file = path.into();
        self
    }

    pub fn with_away_races<S: Into<String>>(mut self, races: impl IntoIterator<Item = S>) -> Self {
        self.away_races = races.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_self_play(mut self, self_play: bool) -> Self {
        self.self_play = self_play;
        self
    }

    pub fn with_opponent_weights(mut self, path: impl Into<PathBuf>) -> Self {
        self.opponent_weights = Some(path.into());
        self
    }

    pub fn with_mcts(mut self, iterations: u32, policy_lr: f64) -> Self {
        self.mcts_iterations = iterations;
        self.policy_lr = policy_lr;
        self
    }

    pub fn with_replay(mut self, capacity: usize, batch: usize) -> Self {
        self.replay_buffer_size = capacity;
        self.replay_batch_size = batch;
        self
    }

    pub fn with_benchmark(mut self, interval: u32, matches: u32) -> Self {
        self.benchmark_interval = interval;
        self.benchmark_matches = matches;
        self
    }

    pub fn with_skip_greedy_benchmark(mut self, skip: bool) -> Self {
        self.skip_greedy_benchmark = skip;
        self
    }

    pub fn with_curriculum(mut self, enabled: bool) -> Self {
        self.curriculum = enabled;
        self
    }

    pub fn with_curriculum_stages(mut self, stages: Vec<CurriculumStage>) -> Self {
        self.curriculum_stages = stages;
        self
    }

    pub fn with_timeout(mut self, per_game: Duration) -> Self {
        self.timeout_secs = per_game.as_secs();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject settings the run cannot work with.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(TrainError::InvalidConfig(msg.to_string()));
        if self.epochs == 0 {
            return fail("epochs must be at least 1");
        }
        if self.games_per_epoch == 0 {
            return fail("games_per_epoch must be at least 1");
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return fail("learning_rate must be positive");
        }
        if !(self.lr_decay.is_finite() && self.lr_decay > 0.0) {
            return fail("lr_decay must be positive");
        }
        for eps in [self.epsilon_start, self.epsilon_end] {
            if !(0.0..=1.0).contains(&eps) {
                return fail("epsilon must lie in [0, 1]");
            }
        }
        if !(0.0..=1.0).contains(&self.params.gamma) || !(0.0..=1.0).contains(&self.params.lambda) {
            return fail("gamma and lambda must lie in [0, 1]");
        }
        if self.model == ModelKind::Neural && self.hidden_size == 0 {
            return fail("neural model needs a hidden layer");
        }
        if self.away_races.iter().all(|r| r.trim().is_empty()) {
            return fail("at least one away race is required");
        }
        if !self.policy_lr.is_finite() || self.policy_lr < 0.0 {
            return fail("policy_lr must not be negative");
        }
        if self.curriculum && self.curriculum_stages.is_empty() {
            return fail("curriculum needs at least one stage");
        }
        if !self.regression_margin.is_finite() || self.regression_margin < 0.0 {
            return fail("regression_margin must not be negative");
        }
        if self.timeout_secs == 0 {
            return fail("timeout must be at least one second");
        }
        Ok(())
    }

    /// Resolve `path` against the run root unless it is absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn weights_path(&self) -> PathBuf {
        self.resolve(&self.weights_file)
    }

    pub fn log_base(&self) -> PathBuf {
        self.resolve(&self.log_dir)
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.resolve(&self.metrics_csv)
    }

    pub fn benchmark_path(&self) -> PathBuf {
        match &self.benchmark_csv {
            Some(path) => self.resolve(path),
            None => {
                let metrics = self.metrics_path();
                metrics
                    .parent()
                    .map(|dir| dir.join("benchmark_results.csv"))
                    .unwrap_or_else(|| PathBuf::from("benchmark_results.csv"))
            }
        }
    }

    pub fn replay_path(&self) -> PathBuf {
        self.root.join("replay_buffer.bin")
    }

    pub fn opponent_weights_path(&self) -> Option<PathBuf> {
        self.opponent_weights.as_deref().map(|p| self.resolve(p))
    }

    /// Policy distillation needs search statistics to learn from.
    pub fn use_policy(&self) -> bool {
        self.policy_lr > 0.0 && self.mcts_iterations > 0
    }

    /// Replay `(capacity, batch)`, or `None` when replay is off.
    pub fn replay_settings(&self) -> Option<(usize, usize)> {
        if self.replay_buffer_size > 0 {
            Some((self.replay_buffer_size, self.replay_batch_size))
        } else if self.mcts_iterations > 0 {
            Some((AUTO_REPLAY_CAPACITY, self.replay_batch_size.max(AUTO_REPLAY_BATCH)))
        } else {
            None
        }
    }

    /// AI type for the learning side.
    pub fn home_ai(&self) -> &'static str {
        if self.mcts_iterations > 0 {
            "macro_mcts"
        } else {
            "learning"
        }
    }

    pub fn game_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn benchmark_timeout(&self) -> Duration {
        Duration::from_secs(self.benchmark_timeout_secs.unwrap_or(self.timeout_secs))
    }

    /// Away races with blanks dropped.
    pub fn races(&self) -> Vec<&str> {
        self.away_races
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .collect()
    }
}
