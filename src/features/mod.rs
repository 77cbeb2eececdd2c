//! Feature extraction for value and policy models.
//!
//! This module turns raw game snapshots into the fixed-length numeric
//! vectors the models learn from.
//!
//! ## Key Types
//!
//! - [`FeatureEncoder`]: Snapshot + perspective → 70 features
//! - [`layout`]: Named indices for every feature slot
//!
//! ## Perspective
//!
//! Every feature is computed from one side's point of view. "My" features
//! describe the perspective side, "opponent" features the other side, and
//! positional features are measured toward the perspective side's target
//! end zone. Encoding the same state from the other side swaps each
//! mirrored pair in [`layout::MIRRORED_PAIRS`].

pub mod encoder;
pub mod layout;
pub mod pitch;
mod strategic;

pub use encoder::{encode, FeatureEncoder, FeatureVector};
pub use layout::{NUM_ACTION_FEATURES, NUM_FEATURES, POLICY_INPUT_SIZE};
