//! The epoch loop.
//!
//! Each epoch plays a batch of games through the [`Simulator`], trains the
//! value model on every completed log (plus a replay sample), distills
//! search statistics into the policy, persists weights and metrics, and on
//! benchmark epochs checks for regression. All state the loop carries from
//! one epoch to the next lives on [`TrainingOrchestrator`].

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use super::benchmark::{BenchmarkConfig, BenchmarkEvaluator, BenchmarkReport};
use super::checkpoint::{regressed, Checkpoints};
use super::config::TrainingConfig;
use super::curriculum::Curriculum;
use super::metrics::{append_benchmark, EpochMetrics, MetricsLog};
use super::schedule::{decayed_lr, epsilon_for, split_games};
use super::simulator::{list_files, SimulationBatch, SimulationRequest, Simulator};
use crate::core::{Result, TrainError, TrainRng};
use crate::features::NUM_FEATURES;
use crate::policy::{load_combined, save_combined, PolicyTrainer};
use crate::records::{read_decisions, GameLog};
use crate::replay::ReplayBuffer;
use crate::value::ValueModel;

/// Why a run ended.
#[derive(Clone, Debug, PartialEq)]
pub enum StopReason {
    /// Every configured epoch ran.
    Completed,
    /// A benchmark fell too far below the best checkpoint.
    RegressionRollback {
        epoch: u32,
        win_rate: f64,
        best_win_rate: f64,
        /// Whether the working weights were reverted to the best checkpoint.
        restored: bool,
    },
}

/// What happened in one epoch.
#[derive(Clone, Debug, PartialEq)]
pub struct EpochReport {
    pub epoch: u32,
    pub epsilon: f64,
    pub learning_rate: f64,
    /// Away AI the learning agent faced.
    pub opponent: String,
    pub games: usize,
    pub win_rate: f64,
    pub avg_score_diff: f64,
    /// Completed logs the value model trained on.
    pub logs_trained: usize,
    /// Replay transitions trained on after the fresh logs.
    pub replay_trained: usize,
    pub policy_decisions: usize,
    pub policy_loss: Option<f64>,
    pub benchmark: Option<BenchmarkReport>,
}

/// Outcome of a whole run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub epochs_completed: u32,
    pub stop_reason: StopReason,
    /// Final curriculum stage, when the curriculum is on.
    pub curriculum_stage: Option<usize>,
    pub best_benchmark_win_rate: f64,
    pub epochs: Vec<EpochReport>,
}

/// Owns the models and every piece of cross-epoch state.
pub struct TrainingOrchestrator<S: Simulator> {
    config: TrainingConfig,
    simulator: S,
    value: ValueModel,
    policy: Option<PolicyTrainer>,
    replay: Option<ReplayBuffer>,
    replay_batch: usize,
    curriculum: Option<Curriculum>,
    checkpoints: Checkpoints,
    benchmark: BenchmarkEvaluator,
    metrics: MetricsLog,
    /// Game and benchmark seeds.
    seed_rng: TrainRng,
    replay_rng: TrainRng,
}

impl<S: Simulator> TrainingOrchestrator<S> {
    /// Set up a run: load or create the models, reload any replay
    /// snapshot, and start a fresh metrics file. A fresh model is written to
    /// the weights path so the simulator always has something to load.
    pub fn new(config: TrainingConfig, simulator: S) -> Result<Self> {
        config.validate()?;
        let mut root = TrainRng::new(config.seed);
        let mut init_rng = root.fork();
        let seed_rng = root.fork();
        let replay_rng = root.fork();
        let weights_path = config.weights_path();
        let existing = weights_path.exists();

        let (value, policy) = if config.use_policy() {
            if existing {
                let (value, policy) =
                    load_combined(&weights_path, config.learning_rate, config.policy_lr)?;
                (value, Some(policy))
            } else {
                let value = fresh_value(&config, &mut init_rng);
                let policy = PolicyTrainer::new(config.policy_lr)
                    .with_temperature(config.policy_temperature);
                (value, Some(policy))
            }
        } else if existing {
            (ValueModel::load(&weights_path, config.learning_rate)?, None)
        } else {
            (fresh_value(&config, &mut init_rng), None)
        };

        let (replay, replay_batch) = match config.replay_settings() {
            Some((capacity, batch)) => {
                let mut buffer = ReplayBuffer::new(capacity);
                let path = config.replay_path();
                if path.exists() {
                    buffer.load(&path)?;
                    info!(
                        "replay buffer: loaded {} transitions, capacity {capacity}",
                        buffer.len()
                    );
                } else {
                    info!("replay buffer: new, capacity {capacity}, batch {batch}");
                }
                (Some(buffer), batch)
            }
            None => (None, 0),
        };

        let curriculum = if config.curriculum {
            let curriculum = Curriculum::new(config.curriculum_stages.clone()).ok_or_else(|| {
                TrainError::InvalidConfig("curriculum needs at least one stage".into())
            })?;
            info!(
                "curriculum: starting at stage 0 ({})",
                curriculum.current().opponent
            );
            Some(curriculum)
        } else {
            None
        };

        let metrics = MetricsLog::create(config.metrics_path())?;
        let checkpoints = Checkpoints::new(&weights_path);
        let benchmark = BenchmarkEvaluator::new(BenchmarkConfig::from_training(&config));

        let orchestrator = Self {
            config,
            simulator,
            value,
            policy,
            replay,
            replay_batch,
            curriculum,
            checkpoints,
            benchmark,
            metrics,
            seed_rng,
            replay_rng,
        };
        if !existing {
            orchestrator.save_weights()?;
        }
        orchestrator.log_banner();
        Ok(orchestrator)
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn value(&self) -> &ValueModel {
        &self.value
    }

    pub fn policy(&self) -> Option<&PolicyTrainer> {
        self.policy.as_ref()
    }

    pub fn replay(&self) -> Option<&ReplayBuffer> {
        self.replay.as_ref()
    }

    pub fn curriculum(&self) -> Option<&Curriculum> {
        self.curriculum.as_ref()
    }

    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    pub fn simulator_mut(&mut self) -> &mut S {
        &mut self.simulator
    }

    pub fn into_simulator(self) -> S {
        self.simulator
    }

    /// Run every epoch, or until a regression rollback stops the run.
    /// A simulator failure ends the run with an error.
    pub fn run(&mut self) -> Result<RunSummary> {
        let mut epochs = Vec::new();
        let mut stop_reason = StopReason::Completed;

        for epoch in 1..=self.config.epochs {
            let (report, stop) = self.run_epoch(epoch)?;
            epochs.push(report);
            if let Some(stop) = stop {
                stop_reason = stop;
                break;
            }
        }

        let summary = RunSummary {
            epochs_completed: epochs.len() as u32,
            stop_reason,
            curriculum_stage: self.curriculum.as_ref().map(Curriculum::stage_index),
            best_benchmark_win_rate: self.checkpoints.best_win_rate(),
            epochs,
        };
        info!(
            "training finished after {} epochs ({:?})",
            summary.epochs_completed, summary.stop_reason
        );
        Ok(summary)
    }

    /// One pass of the loop. Returns a stop reason when the run must end
    /// after this epoch.
    pub fn run_epoch(&mut self, epoch: u32) -> Result<(EpochReport, Option<StopReason>)> {
        let epsilon = epsilon_for(
            epoch,
            self.config.epochs,
            self.config.epsilon_start,
            self.config.epsilon_end,
        );
        let learning_rate = decayed_lr(self.config.learning_rate, self.config.lr_decay, epoch);
        self.value.set_learning_rate(learning_rate);
        if let Some(policy) = &mut self.policy {
            policy.set_learning_rate(decayed_lr(self.config.policy_lr, self.config.lr_decay, epoch));
        }

        let epoch_dir = epoch_log_dir(&self.config, epoch);
        if epoch_dir.exists() {
            fs::remove_dir_all(&epoch_dir).map_err(|e| TrainError::io(&epoch_dir, e))?;
        }
        fs::create_dir_all(&epoch_dir).map_err(|e| TrainError::io(&epoch_dir, e))?;

        let (opponent, self_play) = self.matchup();
        let batch = self.play_games(&epoch_dir, epsilon, &opponent, self_play)?;

        let logs_trained = self.train_value(&epoch_dir)?;
        let replay_trained = self.train_replay()?;
        let (policy_decisions, policy_loss) = self.train_policy(&epoch_dir)?;
        self.save_weights()?;

        let win_rate = batch.home_win_rate();
        let avg_score_diff = batch.avg_score_diff();
        self.metrics.append(&EpochMetrics {
            epoch,
            win_rate,
            avg_score_diff,
            epsilon,
        })?;

        let mut line = format!(
            "epoch {epoch}/{}: win_rate={:.1}%, avg_score_diff={avg_score_diff:+.2}, epsilon={epsilon:.3}",
            self.config.epochs,
            win_rate * 100.0
        );
        if let Some(loss) = policy_loss {
            line.push_str(&format!(" | policy: {policy_decisions} decisions, loss={loss:.3}"));
        }
        info!("{line}");
        debug!("scores: {}", batch.score_line());

        let mut stop = None;
        let mut benchmark = None;
        if self.config.benchmark_interval > 0 && epoch % self.config.benchmark_interval == 0 {
            let (report, reason) = self.benchmark_epoch(epoch)?;
            benchmark = Some(report);
            stop = reason;
        }

        if stop.is_none() {
            if let Some(curriculum) = &mut self.curriculum {
                curriculum.record(win_rate);
            }
        }

        let report = EpochReport {
            epoch,
            epsilon,
            learning_rate,
            opponent,
            games: batch.len(),
            win_rate,
            avg_score_diff,
            logs_trained,
            replay_trained,
            policy_decisions,
            policy_loss,
            benchmark,
        };
        Ok((report, stop))
    }

    /// Away AI name and whether this epoch is self-play.
    fn matchup(&self) -> (String, bool) {
        match &self.curriculum {
            Some(curriculum) => {
                let stage = curriculum.current();
                (stage.opponent.clone(), stage.self_play)
            }
            None => (self.config.opponent.clone(), self.config.self_play),
        }
    }

    fn play_games(
        &mut self,
        epoch_dir: &Path,
        epsilon: f64,
        opponent: &str,
        self_play: bool,
    ) -> Result<SimulationBatch> {
        let weights = self.config.weights_path();
        let home_ai = self.config.home_ai();
        let away_ai = if self_play { home_ai } else { opponent };
        let away_weights = self.config.opponent_weights_path();
        let policy_weights = self.config.use_policy().then(|| weights.clone());

        let races = self.config.races();
        let counts = split_games(self.config.games_per_epoch, races.len());
        let mut batch = SimulationBatch::default();
        let mut offset = 0usize;

        for (race, games) in races.into_iter().zip(counts) {
            if games == 0 {
                continue;
            }
            let mut request = SimulationRequest::new(home_ai, away_ai, games)
                .with_weights(&weights)
                .with_epsilon(epsilon)
                .with_log_dir(epoch_dir)
                .with_races(self.config.home_race.as_str(), race)
                .with_timeout(self.config.game_timeout())
                .with_game_offset(offset)
                .with_seed(self.seed_rng.next_seed());
            request.away_epsilon = away_weights.as_ref().map(|_| 0.0);
            request.away_weights = away_weights.clone();
            request.team_value = self.config.team_value;
            request.mcts_iterations = self.config.mcts_iterations;
            request.policy_weights = policy_weights.clone();

            let played = self.simulator.simulate(&request).map_err(|e| {
                error!("simulation against {away_ai} ({race}) failed: {e}");
                TrainError::from(e)
            })?;
            debug!("{race}: {} games played", played.len());
            batch.merge(played);
            offset += games as usize;
        }
        Ok(batch)
    }

    fn train_value(&mut self, epoch_dir: &Path) -> Result<usize> {
        let mut trained = 0;
        for path in list_files(epoch_dir, "game_", "jsonl")? {
            let log = GameLog::read(&path)?;
            if !log.is_complete() {
                debug!("skipping incomplete game log {}", path.display());
                continue;
            }
            if let Some(replay) = &mut self.replay {
                replay.add_game(&log);
            }
            self.value.train(&log, self.config.method, &self.config.params);
            trained += 1;
        }
        Ok(trained)
    }

    fn train_replay(&mut self) -> Result<usize> {
        let Some(replay) = &self.replay else {
            return Ok(0);
        };
        if replay.is_empty() {
            return Ok(0);
        }
        let sample = replay.sample(self.replay_batch, &mut self.replay_rng);
        for transition in &sample {
            self.value
                .train(&transition.to_game_log(), self.config.method, &self.config.params);
        }
        replay.save(self.config.replay_path())?;
        Ok(sample.len())
    }

    fn train_policy(&mut self, epoch_dir: &Path) -> Result<(usize, Option<f64>)> {
        let Some(policy) = &mut self.policy else {
            return Ok((0, None));
        };
        let mut decisions = Vec::new();
        for path in list_files(epoch_dir, "decisions_", "json")? {
            decisions.extend(read_decisions(&path)?);
        }
        if decisions.is_empty() {
            return Ok((0, None));
        }
        let loss = policy.train_on_decisions(&decisions);
        Ok((decisions.len(), Some(loss)))
    }

    fn save_weights(&self) -> Result<()> {
        let path = self.config.weights_path();
        match &self.policy {
            Some(policy) => save_combined(&self.value, policy, &path),
            None => self.value.save(&path),
        }
    }

    /// Reload the in-memory models from the working weights file.
    fn reload_weights(&mut self) -> Result<()> {
        let path = self.config.weights_path();
        let lr = self.value.learning_rate();
        match self.policy.as_ref().map(PolicyTrainer::learning_rate) {
            Some(policy_lr) => {
                let (value, policy) = load_combined(&path, lr, policy_lr)?;
                self.value = value;
                self.policy = Some(policy);
            }
            None => self.value = ValueModel::load(&path, lr)?,
        }
        Ok(())
    }

    fn benchmark_epoch(&mut self, epoch: u32) -> Result<(BenchmarkReport, Option<StopReason>)> {
        let weights = self.config.weights_path();
        let seed = self.seed_rng.next_seed();
        let report = self.benchmark.evaluate(&mut self.simulator, &weights, seed);
        append_benchmark(self.config.benchmark_path(), epoch, &report.results)?;

        let Some(primary) = report.get(&self.config.benchmark_primary) else {
            return Ok((report, None));
        };
        let (win_rate, score_diff) = (primary.win_rate, primary.avg_score_diff);

        self.checkpoints.snapshot(epoch, win_rate, score_diff)?;
        let best = self.checkpoints.best_win_rate();
        if win_rate > best {
            self.checkpoints.promote(epoch, win_rate)?;
        }

        if !regressed(best, win_rate, self.config.regression_margin) {
            return Ok((report, None));
        }
        warn!(
            "over-specialization detected: {:.1}% < {:.1}% - {:.0}%",
            win_rate * 100.0,
            best * 100.0,
            self.config.regression_margin * 100.0
        );
        let restored = self.checkpoints.restore_best()?;
        if restored {
            self.reload_weights()?;
            info!("reverted weights to best ({:.1}%)", best * 100.0);
        }
        info!("stopping early to prevent further degradation");
        let stop = StopReason::RegressionRollback {
            epoch,
            win_rate,
            best_win_rate: best,
            restored,
        };
        Ok((report, Some(stop)))
    }

    fn log_banner(&self) {
        let c = &self.config;
        let opponent = if c.self_play {
            "learning (self-play)"
        } else {
            c.opponent.as_str()
        };
        info!(
            "training: {} epochs x {} games = {} games",
            c.epochs,
            c.games_per_epoch,
            u64::from(c.epochs) * u64::from(c.games_per_epoch)
        );
        info!(
            "model: {}, opponent: {opponent}, lr: {}, epsilon: {:.2} -> {:.2}",
            self.value.kind(),
            c.learning_rate,
            c.epsilon_start,
            c.epsilon_end
        );
        info!(
            "method: {} (gamma={}, lambda={}), races: {} vs {}",
            c.method,
            c.params.gamma,
            c.params.lambda,
            c.home_race,
            c.away_races.join(",")
        );
        if c.mcts_iterations > 0 {
            info!("search: {} iterations per action", c.mcts_iterations);
        }
        if let Some(policy) = &self.policy {
            info!("policy training: lr={}", policy.learning_rate());
        }
        if let Some(path) = c.opponent_weights_path() {
            info!("opponent weights: {}", path.display());
        }
        if c.benchmark_interval > 0 {
            info!(
                "benchmark: every {} epochs, {} matches",
                c.benchmark_interval, c.benchmark_matches
            );
        }
    }
}

fn fresh_value(config: &TrainingConfig, rng: &mut TrainRng) -> ValueModel {
    ValueModel::create(
        config.model,
        NUM_FEATURES,
        config.hidden_size,
        config.learning_rate,
        rng,
    )
}

/// Directory an epoch's games write their side-channel files to. Cleared
/// at the start of that epoch.
pub fn epoch_log_dir(config: &TrainingConfig, epoch: u32) -> PathBuf {
    config.log_base().join(format!("epoch_{epoch:03}"))
}
