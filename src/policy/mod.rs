//! Policy distillation from search visit distributions.
//!
//! ## Key Types
//!
//! - [`PolicyTrainer`]: Linear softmax policy over state ‖ action features
//! - [`save_combined`] / [`load_combined`]: Value + policy in one file

pub mod combined;
pub mod trainer;

pub use combined::{combined_file, load_combined, save_combined};
pub use trainer::{PolicyTrainer, WEIGHT_CLAMP};
