//! Error types shared by every trainer and the orchestrator.
//!
//! Only genuinely fatal conditions live here. Malformed log lines, incomplete
//! games, length mismatches and per-opponent benchmark failures are handled
//! in place and never surface as a `TrainError`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure reported by the external match simulator.
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// A batch exceeded its deadline.
    #[error("simulation timed out after {after:?}")]
    Timeout { after: Duration },

    /// The simulator ran but did not produce a usable batch.
    #[error("simulation failed: {0}")]
    Failed(String),
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("replay snapshot codec error: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("metrics CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A weight file holds a different model family than the consumer expects.
    #[error("weight file '{path}' holds {found} weights, expected {expected}")]
    ModelMismatch {
        path: PathBuf,
        expected: &'static str,
        found: &'static str,
    },

    /// A weight file parsed but its arrays have inconsistent shapes.
    #[error("malformed weights in '{path}': {reason}")]
    MalformedWeights { path: PathBuf, reason: String },

    /// Network parameters whose lengths do not fit the declared layer sizes.
    #[error("network shapes disagree: {0}")]
    ShapeMismatch(String),

    #[error("unknown training method '{0}'")]
    UnknownMethod(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Simulator(#[from] SimulatorError),
}

impl TrainError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TrainError::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a JSON error with the path it happened on.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        TrainError::Json {
            path: path.into(),
            source,
        }
    }

    /// True when the run must stop because the simulator missed its deadline.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, TrainError::Simulator(SimulatorError::Timeout { .. }))
    }
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, TrainError>;
