//! Per-game logs as written by the external engine.
//!
//! A log file is newline-delimited JSON. Each line is either a state record
//! (`{"type":"state","features":[...],"perspective":"home"}`) or the terminal
//! result record (`{"type":"result","home_score":..,"away_score":..,"winner":..}`).
//! A log without a result record is an unfinished game and every consumer
//! treats it as empty.

use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::core::{Result, Side, TrainError};

/// One encoded state, tagged with the side it was encoded for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub features: Vec<f64>,
    #[serde(default)]
    pub perspective: Side,
}

impl StateRecord {
    pub fn new(features: impl Into<Vec<f64>>, perspective: Side) -> Self {
        Self {
            features: features.into(),
            perspective,
        }
    }
}

/// Final score of a completed game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(default)]
    pub home_score: i32,
    #[serde(default)]
    pub away_score: i32,
    /// `None` for a draw.
    #[serde(default)]
    pub winner: Option<Side>,
}

impl ResultRecord {
    /// Result with the winner decided by the scores.
    #[must_use]
    pub fn from_scores(home_score: i32, away_score: i32) -> Self {
        let winner = match home_score.cmp(&away_score) {
            std::cmp::Ordering::Greater => Some(Side::Home),
            std::cmp::Ordering::Less => Some(Side::Away),
            std::cmp::Ordering::Equal => None,
        };
        Self {
            home_score,
            away_score,
            winner,
        }
    }

    /// Terminal reward seen from `side`: +1 win, -1 loss, 0 draw.
    #[must_use]
    pub fn reward_for(&self, side: Side) -> f64 {
        match self.winner {
            None => 0.0,
            Some(w) if w == side => 1.0,
            Some(_) => -1.0,
        }
    }
}

/// A single line of a log file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogRecord {
    State(StateRecord),
    Result(ResultRecord),
    /// Record types this crate does not consume.
    #[serde(other)]
    Other,
}

/// The states seen by one side during a game, in order, plus that side's
/// terminal reward.
#[derive(Clone, Debug, PartialEq)]
pub struct Episode<'a> {
    pub perspective: Side,
    pub reward: f64,
    pub states: Vec<&'a [f64]>,
}

impl Episode<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// A parsed game log.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GameLog {
    /// State records in file order, both perspectives interleaved.
    pub states: Vec<StateRecord>,
    /// The last result record in the file, if any.
    pub result: Option<ResultRecord>,
}

impl GameLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style state append.
    #[must_use]
    pub fn with_state(mut self, features: impl Into<Vec<f64>>, perspective: Side) -> Self {
        self.states.push(StateRecord::new(features, perspective));
        self
    }

    /// Builder-style result.
    #[must_use]
    pub fn with_result(mut self, result: ResultRecord) -> Self {
        self.result = Some(result);
        self
    }

    pub fn push_state(&mut self, record: StateRecord) {
        self.states.push(record);
    }

    /// True once the game has a result record.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// Parse newline-delimited JSON. Blank lines are ignored; lines that are
    /// not valid records are logged and skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut log = GameLog::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<LogRecord>(line) {
                Ok(LogRecord::State(state)) => log.states.push(state),
                Ok(LogRecord::Result(result)) => log.result = Some(result),
                Ok(LogRecord::Other) => {}
                Err(e) => warn!("skipping malformed log line {}: {}", lineno + 1, e),
            }
        }
        log
    }

    /// Read and parse a log file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| TrainError::io(path, e))?;
        let log = Self::parse(&text);
        debug!(
            "read {} states from {} (complete: {})",
            log.states.len(),
            path.display(),
            log.is_complete()
        );
        Ok(log)
    }

    /// Serialize as newline-delimited JSON, result record last.
    pub fn to_jsonl(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        let records = self
            .states
            .iter()
            .cloned()
            .map(LogRecord::State)
            .chain(self.result.map(LogRecord::Result));
        for record in records {
            out.push_str(&serde_json::to_string(&record)?);
            out.push('\n');
        }
        Ok(out)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = self.to_jsonl().map_err(|e| TrainError::json(path, e))?;
        fs::write(path, text).map_err(|e| TrainError::io(path, e))
    }

    /// States grouped by perspective, sides ordered by first appearance.
    ///
    /// Empty for an incomplete log: without a result there is no reward to
    /// learn from.
    #[must_use]
    pub fn episodes(&self) -> Vec<Episode<'_>> {
        let Some(result) = self.result else {
            return Vec::new();
        };

        let mut episodes: Vec<Episode<'_>> = Vec::with_capacity(2);
        for record in &self.states {
            let features = record.features.as_slice();
            match episodes
                .iter_mut()
                .find(|e| e.perspective == record.perspective)
            {
                Some(episode) => episode.states.push(features),
                None => episodes.push(Episode {
                    perspective: record.perspective,
                    reward: result.reward_for(record.perspective),
                    states: vec![features],
                }),
            }
        }
        episodes
    }
}
