//! Benchmark snapshots, the best checkpoint, and regression rollback.
//!
//! Snapshots and the best checkpoint live beside the working weights file.
//! The best benchmark score is kept in a sidecar so it survives restarts
//! without touching the weight file format.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::core::{Result, TrainError};

pub const BEST_WEIGHTS_NAME: &str = "weights_best.json";
pub const BEST_META_NAME: &str = "weights_best.meta.json";

/// Benchmark record of the best checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BestMeta {
    pub benchmark_win_rate: f64,
    pub benchmark_epoch: u32,
}

/// `weights_snap_e{epoch}_{win%}_{±diff}.json`
pub fn snapshot_name(epoch: u32, win_rate: f64, score_diff: f64) -> String {
    format!(
        "weights_snap_e{epoch}_{:.0}%_{score_diff:+.1}.json",
        win_rate * 100.0
    )
}

/// True when `current` fell more than `margin` below a nonzero `best`.
pub fn regressed(best: f64, current: f64, margin: f64) -> bool {
    best > 0.0 && current < best - margin
}

/// Checkpoint files around one working weights file.
#[derive(Clone, Debug)]
pub struct Checkpoints {
    weights: PathBuf,
    dir: PathBuf,
}

impl Checkpoints {
    pub fn new(weights: impl Into<PathBuf>) -> Self {
        let weights = weights.into();
        let dir = weights
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self { weights, dir }
    }

    pub fn best_path(&self) -> PathBuf {
        self.dir.join(BEST_WEIGHTS_NAME)
    }

    pub fn meta_path(&self) -> PathBuf {
        self.dir.join(BEST_META_NAME)
    }

    fn working_is_best(&self) -> bool {
        match (fs::canonicalize(&self.weights), fs::canonicalize(self.best_path())) {
            (Ok(a), Ok(b)) => a == b,
            _ => self.weights == self.best_path(),
        }
    }

    /// Recorded best, or `None` if there is none or it cannot be read.
    pub fn best_meta(&self) -> Option<BestMeta> {
        let path = self.meta_path();
        let text = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&text) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!("ignoring unreadable {}: {e}", path.display());
                None
            }
        }
    }

    /// Best benchmark win rate so far, 0 when none is recorded.
    pub fn best_win_rate(&self) -> f64 {
        self.best_meta().map_or(0.0, |m| m.benchmark_win_rate)
    }

    /// Copy the working weights to a named snapshot.
    pub fn snapshot(&self, epoch: u32, win_rate: f64, score_diff: f64) -> Result<PathBuf> {
        let path = self.dir.join(snapshot_name(epoch, win_rate, score_diff));
        fs::copy(&self.weights, &path).map_err(|e| TrainError::io(&path, e))?;
        info!("snapshot: {}", path.display());
        Ok(path)
    }

    /// Make the working weights the best checkpoint.
    pub fn promote(&self, epoch: u32, win_rate: f64) -> Result<()> {
        let best = self.best_path();
        if !self.working_is_best() {
            fs::copy(&self.weights, &best).map_err(|e| TrainError::io(&best, e))?;
        }
        let meta = BestMeta {
            benchmark_win_rate: win_rate,
            benchmark_epoch: epoch,
        };
        let path = self.meta_path();
        let text = serde_json::to_string_pretty(&meta).map_err(|e| TrainError::json(&path, e))?;
        fs::write(&path, text).map_err(|e| TrainError::io(&path, e))?;
        info!(
            "new best: {:.1}% at epoch {epoch}, saved to {}",
            win_rate * 100.0,
            best.display()
        );
        Ok(())
    }

    /// Overwrite the working weights with the best checkpoint. Returns
    /// `false` when there was nothing to restore from.
    pub fn restore_best(&self) -> Result<bool> {
        let best = self.best_path();
        if self.working_is_best() || !best.exists() {
            warn!("no separate best checkpoint to revert to");
            return Ok(false);
        }
        fs::copy(&best, &self.weights).map_err(|e| TrainError::io(&self.weights, e))?;
        Ok(true)
    }
}
