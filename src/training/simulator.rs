//! Boundary to the external match simulator.
//!
//! The simulator is a black box: one [`SimulationRequest`] in, one
//! [`SimulationBatch`] out, plus side-channel files in the request's log
//! directory. Game logs are named by [`game_log_name`] and search decisions
//! by [`decisions_name`], both numbered from the request's `game_offset`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{Result as TrainResult, Side, SimulatorError, TrainError};

/// Parameters for one batch of matches.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationRequest {
    pub home_ai: String,
    pub away_ai: String,
    pub matches: u32,
    /// Weights for the home learning agent (and the away one under self-play).
    pub weights: PathBuf,
    pub epsilon: f64,
    /// Where the simulator writes game logs and decision files.
    pub log_dir: Option<PathBuf>,
    pub home_race: String,
    pub away_race: String,
    pub away_weights: Option<PathBuf>,
    pub away_epsilon: Option<f64>,
    pub team_value: Option<u32>,
    pub mcts_iterations: u32,
    pub policy_weights: Option<PathBuf>,
    /// Index of the first game in this batch, for side-channel file names.
    pub game_offset: usize,
    /// Deadline per game. The batch deadline is this times `matches`.
    pub timeout_per_game: Duration,
    pub seed: u64,
}

impl SimulationRequest {
    pub fn new(home_ai: impl Into<String>, away_ai: impl Into<String>, matches: u32) -> Self {
        Self {
            home_ai: home_ai.into(),
            away_ai: away_ai.into(),
            matches,
            weights: PathBuf::new(),
            epsilon: 0.0,
            log_dir: None,
            home_race: "random".to_string(),
            away_race: "random".to_string(),
            away_weights: None,
            away_epsilon: None,
            team_value: None,
            mcts_iterations: 0,
            policy_weights: None,
            game_offset: 0,
            timeout_per_game: Duration::from_secs(120),
            seed: 0,
        }
    }

    pub fn with_weights(mut self, weights: impl Into<PathBuf>) -> Self {
        self.weights = weights.into();
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn with_races(mut self, home: impl Into<String>, away: impl Into<String>) -> Self {
        self.home_race = home.into();
        self.away_race = away.into();
        self
    }

    pub fn with_timeout(mut self, per_game: Duration) -> Self {
        self.timeout_per_game = per_game;
        self
    }

    pub fn with_game_offset(mut self, offset: usize) -> Self {
        self.game_offset = offset;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Deadline for the whole batch.
    pub fn batch_deadline(&self) -> Duration {
        self.timeout_per_game.saturating_mul(self.matches)
    }
}

/// Final score of one match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub home_score: i32,
    pub away_score: i32,
}

impl GameOutcome {
    pub fn new(home_score: i32, away_score: i32) -> Self {
        Self {
            home_score,
            away_score,
        }
    }

    pub fn winner(&self) -> Option<Side> {
        match self.home_score.cmp(&self.away_score) {
            std::cmp::Ordering::Greater => Some(Side::Home),
            std::cmp::Ordering::Less => Some(Side::Away),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Home minus away.
    pub fn score_diff(&self) -> i32 {
        self.home_score - self.away_score
    }
}

/// Outcomes of one or more simulated batches, in play order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationBatch {
    pub outcomes: Vec<GameOutcome>,
}

impl SimulationBatch {
    pub fn new(outcomes: Vec<GameOutcome>) -> Self {
        Self { outcomes }
    }

    /// Append another batch's outcomes.
    pub fn merge(&mut self, other: SimulationBatch) {
        self.outcomes.extend(other.outcomes);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    fn count(&self, side: Option<Side>) -> usize {
        self.outcomes.iter().filter(|o| o.winner() == side).count()
    }

    pub fn home_wins(&self) -> usize {
        self.count(Some(Side::Home))
    }

    pub fn away_wins(&self) -> usize {
        self.count(Some(Side::Away))
    }

    pub fn draws(&self) -> usize {
        self.count(None)
    }

    fn rate(&self, n: usize) -> f64 {
        if self.outcomes.is_empty() {
            0.0
        } else {
            n as f64 / self.outcomes.len() as f64
        }
    }

    /// The learning agent always plays home.
    pub fn home_win_rate(&self) -> f64 {
        self.rate(self.home_wins())
    }

    pub fn away_win_rate(&self) -> f64 {
        self.rate(self.away_wins())
    }

    pub fn draw_rate(&self) -> f64 {
        self.rate(self.draws())
    }

    /// Mean home-minus-away score, 0 for an empty batch.
    pub fn avg_score_diff(&self) -> f64 {
        let total: i64 = self.outcomes.iter().map(|o| i64::from(o.score_diff())).sum();
        total as f64 / self.outcomes.len().max(1) as f64
    }

    /// `home-away` per game, joined with commas.
    pub fn score_line(&self) -> String {
        self.outcomes
            .iter()
            .map(|o| format!("{}-{}", o.home_score, o.away_score))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Runs matches between AI agents.
pub trait Simulator {
    /// Play `request.matches` games. Exceeding the batch deadline must
    /// return [`SimulatorError::Timeout`].
    fn simulate(&mut self, request: &SimulationRequest) -> Result<SimulationBatch, SimulatorError>;
}

impl<S: Simulator + ?Sized> Simulator for &mut S {
    fn simulate(&mut self, request: &SimulationRequest) -> Result<SimulationBatch, SimulatorError> {
        (**self).simulate(request)
    }
}

impl<S: Simulator + ?Sized> Simulator for Box<S> {
    fn simulate(&mut self, request: &SimulationRequest) -> Result<SimulationBatch, SimulatorError> {
        (**self).simulate(request)
    }
}

/// File name of the `index`th game log in a batch directory.
pub fn game_log_name(index: usize) -> String {
    format!("game_{index:04}.jsonl")
}

/// File name of the `index`th game's search decisions.
pub fn decisions_name(index: usize) -> String {
    format!("decisions_{index:04}.json")
}

/// Files in `dir` named `{prefix}*.{extension}`, sorted by name.
pub fn list_files(dir: &Path, prefix: &str, extension: &str) -> TrainResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| TrainError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| TrainError::io(dir, e))?.path();
        let wanted = path.extension().is_some_and(|e| e == extension)
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix));
        if wanted && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_stats() {
        let batch = SimulationBatch::new(vec![
            GameOutcome::new(2, 1),
            GameOutcome::new(0, 0),
            GameOutcome::new(1, 3),
            GameOutcome::new(1, 0),
        ]);
        assert_eq!(batch.home_wins(), 2);
        assert_eq!(batch.away_wins(), 1);
        assert_eq!(batch.draws(), 1);
        assert_eq!(batch.home_win_rate(), 0.5);
        assert_eq!(batch.avg_score_diff(), 0.0);
        assert_eq!(batch.score_line(), "2-1, 0-0, 1-3, 1-0");
    }

    #[test]
    fn test_empty_batch_rates_are_zero() {
        let batch = SimulationBatch::default();
        assert_eq!(batch.home_win_rate(), 0.0);
        assert_eq!(batch.avg_score_diff(), 0.0);
    }

    #[test]
    fn test_merge_keeps_order() {
        let mut a = SimulationBatch::new(vec![GameOutcome::new(1, 0)]);
        a.merge(SimulationBatch::new(vec![GameOutcome::new(0, 2)]));
        assert_eq!(a.outcomes[1].winner(), Some(Side::Away));
    }

    #[test]
    fn test_side_channel_names() {
        assert_eq!(game_log_name(7), "game_0007.jsonl");
        assert_eq!(decisions_name(12), "decisions_0012.json");
    }

    #[test]
    fn test_list_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["game_0002.jsonl", "game_0001.jsonl", "decisions_0001.json", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("game_0003.jsonl")).unwrap();

        let games = list_files(dir.path(), "game_", "jsonl").unwrap();
        let names: Vec<_> = games.iter().map(|p| p.file_name().unwrap().to_owned()).collect();
        assert_eq!(names, vec!["game_0001.jsonl", "game_0002.jsonl"]);
        assert_eq!(list_files(dir.path(), "decisions_", "json").unwrap().len(), 1);
        assert!(list_files(&dir.path().join("missing"), "", "jsonl").is_err());
    }

    #[test]
    fn test_batch_deadline_scales_with_matches() {
        let req = SimulationRequest::new("learning", "random", 4).with_timeout(Duration::from_secs(10));
        assert_eq!(req.batch_deadline(), Duration::from_secs(40));
    }
}
