//! Experience replay.
//!
//! - [`Transition`]: One step of one side's episode
//! - [`ReplayBuffer`]: Capacity-bounded FIFO with uniform sampling and
//!   atomic snapshots

pub mod buffer;

pub use buffer::{transitions, ReplayBuffer, Transition};
