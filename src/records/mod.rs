//! Records produced by the external engine and consumed by the trainers.
//!
//! ## Key Types
//!
//! - [`GameLog`]: One game's state records plus its terminal result
//! - [`Episode`]: The states one side saw, with that side's reward
//! - [`PolicyDecision`]: Search visit distribution at one action choice

pub mod decision;
pub mod game_log;

pub use decision::{read_decisions, write_decisions, ActionVisit, PolicyDecision};
pub use game_log::{Episode, GameLog, LogRecord, ResultRecord, StateRecord};
