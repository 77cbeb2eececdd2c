//! Core types: sides, game-state snapshots, errors, RNG.
//!
//! Everything here is independent of any particular model or training
//! method. The feature encoder reads snapshots, the trainers and the
//! orchestrator share the error and RNG types.

pub mod error;
pub mod rng;
pub mod side;
pub mod snapshot;

pub use error::{Result, SimulatorError, TrainError};
pub use rng::TrainRng;
pub use side::{Side, SideMap};
pub use snapshot::{
    BallSnapshot, GameSnapshot, PlayerSnapshot, PlayerStats, PlayerStatus, Position,
    TeamSnapshot, Weather,
};
