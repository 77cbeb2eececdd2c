//! # pitch-learn
//!
//! Value and policy training core for a two-team tactical football
//! simulator. The simulator itself lives outside this crate; it plays games,
//! writes per-turn feature logs, and reports scores. This crate turns those
//! logs into better weights.
//!
//! ## Design Principles
//!
//! 1. **Perspective-relative**: Every feature vector and every learned value
//!    is from one side's point of view. Home and away trajectories train as
//!    independent episodes.
//!
//! 2. **Tolerant ingestion**: Malformed log lines, incomplete games and
//!    resized weight files are skipped or coerced, never fatal. Only
//!    configuration mismatches and simulator timeouts stop a run.
//!
//! 3. **Explicit run state**: The orchestrator owns the models, replay
//!    buffer, curriculum and checkpoint bookkeeping. Nothing is global.
//!
//! ## Modules
//!
//! - `core`: Errors, sides, deterministic RNG, raw game snapshots
//! - `features`: Snapshot → 70-feature encoding
//! - `records`: Game logs and search decision records
//! - `value`: Linear and neural value functions, MC/TD training methods
//! - `policy`: Softmax policy distilled from search visit counts
//! - `replay`: FIFO experience replay with atomic snapshots
//! - `training`: Epoch loop, benchmarking, curriculum, offline tools

pub mod core;
pub mod features;
pub mod policy;
pub mod records;
pub mod replay;
pub mod training;
pub mod value;

// Re-export commonly used types
pub use crate::core::{
    GameSnapshot, PlayerSnapshot, Result, Side, SideMap, SimulatorError, TrainError, TrainRng,
};

pub use crate::features::{encode, FeatureEncoder, FeatureVector, NUM_FEATURES};

pub use crate::records::{GameLog, PolicyDecision, ResultRecord, StateRecord};

pub use crate::value::{
    LinearValue, ModelKind, NeuralValue, ShapingWeights, TrainParams, TrainingMethod, ValueModel,
    WeightFile,
};

pub use crate::policy::{load_combined, save_combined, PolicyTrainer};

pub use crate::replay::{ReplayBuffer, Transition};

pub use crate::training::{
    evaluate_agent, run_benchmark, train_from_logs, BenchmarkEvaluator, RunSummary, Simulator,
    StopReason, TrainingConfig, TrainingOrchestrator,
};
