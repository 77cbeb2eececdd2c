//! The training loop and everything around it.
//!
//! ## Overview
//!
//! - **TrainingConfig**: Run settings, loadable from JSON
//! - **Simulator**: Boundary to the external match engine
//! - **TrainingOrchestrator**: Epoch loop over simulate, train, persist, benchmark
//! - **BenchmarkEvaluator**: Exploration-free matches against an opponent pool
//! - **Curriculum**: Opponent progression on a rolling win rate
//! - **Checkpoints**: Benchmark snapshots, best checkpoint, rollback
//! - **train_from_logs** / **evaluate_agent**: Offline training and evaluation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pitch_learn::training::{TrainingConfig, TrainingOrchestrator};
//!
//! let config = TrainingConfig::from_file("run.json")?
//!     .with_epochs(20)
//!     .with_benchmark(5, 40);
//!
//! let mut orchestrator = TrainingOrchestrator::new(config, engine)?;
//! let summary = orchestrator.run()?;
//! println!("{:?} after {} epochs", summary.stop_reason, summary.epochs_completed);
//! ```

pub mod benchmark;
pub mod checkpoint;
pub mod config;
pub mod curriculum;
pub mod metrics;
pub mod offline;
pub mod orchestrator;
pub mod schedule;
pub mod simulator;

pub use benchmark::{run_benchmark, BenchmarkConfig, BenchmarkEvaluator, BenchmarkReport, BenchmarkResult};
pub use checkpoint::{
    regressed, snapshot_name, BestMeta, Checkpoints, BEST_META_NAME, BEST_WEIGHTS_NAME,
};
pub use config::{default_curriculum, CurriculumStage, TrainingConfig};
pub use curriculum::{Curriculum, CURRICULUM_WINDOW};
pub use metrics::{append_benchmark, read_benchmark, BenchmarkRow, EpochMetrics, MetricsLog};
pub use offline::{evaluate_agent, train_from_logs, EvaluationStats, OfflineOptions, OfflineSummary};
pub use orchestrator::{epoch_log_dir, EpochReport, RunSummary, StopReason, TrainingOrchestrator};
pub use schedule::{decayed_lr, epsilon_for, split_games};
pub use simulator::{
    decisions_name, game_log_name, list_files, GameOutcome, SimulationBatch, SimulationRequest,
    Simulator,
};
