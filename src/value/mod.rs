//! State-value learning.
//!
//! This module provides the value functions the engine evaluates positions
//! with, the algorithms that fit them to game logs, and their file formats.
//!
//! ## Key Types
//!
//! - [`ValueFunction`]: The interface every algorithm is written against
//! - [`LinearValue`], [`NeuralValue`]: The two model families
//! - [`ValueModel`]: Runtime choice between them, driven by the file's type tag
//! - [`TrainingMethod`]: `mc`, `mc_shaped`, `td0`, `td_lambda`
//! - [`WeightFile`]: Every persisted weight layout
//!
//! ## Usage
//!
//! ```
//! use pitch_learn::core::Side;
//! use pitch_learn::records::{GameLog, ResultRecord};
//! use pitch_learn::value::{LinearValue, TrainParams, TrainingMethod, ValueFunction};
//!
//! let log = GameLog::new()
//!     .with_state(vec![1.0, 0.0, 0.5], Side::Home)
//!     .with_state(vec![1.0, 0.0, 0.6], Side::Home)
//!     .with_result(ResultRecord::from_scores(1, 0));
//!
//! let mut model = LinearValue::new(3, 0.1);
//! pitch_learn::value::train_log(&mut model, &log, TrainingMethod::MonteCarlo, &TrainParams::default());
//! assert!(model.evaluate(&[1.0, 0.0, 0.5]) > 0.0);
//! ```

pub mod linear;
pub mod methods;
pub mod model;
pub mod neural;
pub mod shaping;
pub mod traits;
pub mod weights;

pub use linear::LinearValue;
pub use methods::{
    monte_carlo, monte_carlo_shaped, td0, td_lambda, train_log, TrainParams, TrainingMethod,
};
pub use model::{ModelKind, ValueModel};
pub use neural::{NeuralParams, NeuralValue};
pub use shaping::ShapingWeights;
pub use traits::ValueFunction;
pub use weights::{
    aligned, CombinedLinear, CombinedNeural, NeuralLayers, WeightFile,
    DEFAULT_POLICY_TEMPERATURE,
};
