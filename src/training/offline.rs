//! Training from accumulated logs and standalone evaluation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::simulator::{list_files, SimulationRequest, Simulator};
use crate::core::{Result, TrainError};
use crate::features::NUM_FEATURES;
use crate::records::GameLog;
use crate::value::{train_log, LinearValue, TrainParams, TrainingMethod};

/// Directory processed logs are moved into.
pub const ARCHIVE_DIR: &str = "archived";

/// What an offline pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OfflineSummary {
    /// Log files found.
    pub files: usize,
    /// Logs that had at least one record and were trained on.
    pub trained: usize,
    /// Files moved into the archive directory.
    pub archived: usize,
}

/// Options for [`train_from_logs`].
#[derive(Clone, Debug, PartialEq)]
pub struct OfflineOptions {
    pub method: TrainingMethod,
    pub learning_rate: f64,
    pub params: TrainParams,
    /// Move processed logs into `archived/` once something was trained.
    pub archive: bool,
}

impl Default for OfflineOptions {
    fn default() -> Self {
        Self {
            method: TrainingMethod::TdLambda,
            learning_rate: 0.01,
            params: TrainParams::default(),
            archive: false,
        }
    }
}

impl OfflineOptions {
    pub fn with_method(mut self, method: TrainingMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_params(mut self, params: TrainParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_archive(mut self, archive: bool) -> Self {
        self.archive = archive;
        self
    }
}

/// Train a linear value model on every `*.jsonl` log in `logs_dir`, in name
/// order, starting from `weights` if it exists. The result is saved back to
/// `weights`. A neural weight file is rejected.
pub fn train_from_logs(logs_dir: &Path, weights: &Path, options: &OfflineOptions) -> Result<OfflineSummary> {
    if !logs_dir.is_dir() {
        warn!("logs directory not found: {}", logs_dir.display());
        return Ok(OfflineSummary::default());
    }
    let files = list_files(logs_dir, "", "jsonl")?;
    if files.is_empty() {
        warn!("no .jsonl files found in {}", logs_dir.display());
        return Ok(OfflineSummary::default());
    }

    let mut model = if weights.exists() {
        info!("loaded existing weights from {}", weights.display());
        LinearValue::load(weights, options.learning_rate)?
    } else {
        LinearValue::new(NUM_FEATURES, options.learning_rate)
    };
    info!(
        "training on {} game logs using {}",
        files.len(),
        options.method
    );

    let mut summary = OfflineSummary {
        files: files.len(),
        ..OfflineSummary::default()
    };
    for path in &files {
        let log = GameLog::read(path)?;
        if log.states.is_empty() && log.result.is_none() {
            continue;
        }
        train_log(&mut model, &log, options.method, &options.params);
        summary.trained += 1;
    }

    model.save(weights)?;
    info!(
        "trained on {} games, saved weights to {}",
        summary.trained,
        weights.display()
    );

    if options.archive && summary.trained > 0 {
        summary.archived = archive(logs_dir, &files)?;
        info!("archived {} log files", summary.archived);
    }
    Ok(summary)
}

fn archive(logs_dir: &Path, files: &[PathBuf]) -> Result<usize> {
    let dir = logs_dir.join(ARCHIVE_DIR);
    fs::create_dir_all(&dir).map_err(|e| TrainError::io(&dir, e))?;
    let mut moved = 0;
    for path in files {
        let Some(name) = path.file_name() else {
            continue;
        };
        let target = dir.join(name);
        fs::rename(path, &target).map_err(|e| TrainError::io(&target, e))?;
        moved += 1;
    }
    Ok(moved)
}

/// Record of a standalone evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationStats {
    pub win_rate: f64,
    pub draw_rate: f64,
    pub loss_rate: f64,
    /// Mean learning-agent score over the requested matches.
    pub avg_score: f64,
    pub avg_opp_score: f64,
    pub matches: u32,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
}

/// Play `matches` exploration-free games of the learning agent against
/// `opponent`.
pub fn evaluate_agent<S: Simulator + ?Sized>(
    simulator: &mut S,
    weights: &Path,
    opponent: &str,
    matches: u32,
    timeout_per_game: Duration,
) -> Result<EvaluationStats> {
    let request = SimulationRequest::new("learning", opponent, matches)
        .with_weights(weights)
        .with_epsilon(0.0)
        .with_timeout(timeout_per_game);
    let batch = simulator.simulate(&request)?;

    let denom = f64::from(matches.max(1));
    let home: i64 = batch.outcomes.iter().map(|o| i64::from(o.home_score)).sum();
    let away: i64 = batch.outcomes.iter().map(|o| i64::from(o.away_score)).sum();

    let stats = EvaluationStats {
        win_rate: batch.home_win_rate(),
        draw_rate: batch.draw_rate(),
        loss_rate: batch.away_win_rate(),
        avg_score: home as f64 / denom,
        avg_opp_score: away as f64 / denom,
        matches,
        wins: batch.home_wins(),
        draws: batch.draws(),
        losses: batch.away_wins(),
    };
    info!(
        "evaluation vs {opponent}: {}W / {}D / {}L, avg score {:.2} - {:.2}",
        stats.wins, stats.draws, stats.losses, stats.avg_score, stats.avg_opp_score
    );
    Ok(stats)
}
