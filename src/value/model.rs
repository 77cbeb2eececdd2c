//! Value model selected at runtime from configuration or file content.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::linear::LinearValue;
use super::methods::{train_log, TrainParams, TrainingMethod};
use super::neural::NeuralValue;
use super::traits::ValueFunction;
use super::weights::{aligned, WeightFile};
use crate::core::{Result, TrainError, TrainRng};
use crate::features::NUM_FEATURES;
use crate::records::GameLog;

/// Model family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    #[default]
    Linear,
    Neural,
}

impl ModelKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ModelKind::Linear => "linear",
            ModelKind::Neural => "neural",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = TrainError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "linear" => Ok(ModelKind::Linear),
            "neural" => Ok(ModelKind::Neural),
            other => Err(TrainError::InvalidConfig(format!(
                "unknown model type '{other}'"
            ))),
        }
    }
}

/// Either value-function variant behind one interface.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueModel {
    Linear(LinearValue),
    Neural(NeuralValue),
}

impl ValueModel {
    /// Fresh model: zero weights for linear, Xavier init for neural.
    pub fn create(
        kind: ModelKind,
        n_features: usize,
        hidden_size: usize,
        learning_rate: f64,
        rng: &mut TrainRng,
    ) -> Self {
        match kind {
            ModelKind::Linear => ValueModel::Linear(LinearValue::new(n_features, learning_rate)),
            ModelKind::Neural => ValueModel::Neural(NeuralValue::new(
                n_features,
                hidden_size,
                learning_rate,
                rng,
            )),
        }
    }

    /// Load whatever value function the file holds. Combined files yield
    /// their value half.
    pub fn load(path: impl AsRef<Path>, learning_rate: f64) -> Result<Self> {
        let path = path.as_ref();
        let file = WeightFile::read(path)?;
        Self::from_file(file, path, learning_rate)
    }

    pub(crate) fn from_file(file: WeightFile, path: &Path, learning_rate: f64) -> Result<Self> {
        Ok(match file {
            WeightFile::Linear(weights) => ValueModel::Linear(LinearValue::from_weights(
                aligned(weights, NUM_FEATURES),
                learning_rate,
            )),
            WeightFile::CombinedLinear(c) => ValueModel::Linear(LinearValue::from_weights(
                aligned(c.value_weights, NUM_FEATURES),
                learning_rate,
            )),
            WeightFile::Neural(layers) => {
                ValueModel::Neural(layers.into_value(path, learning_rate)?)
            }
            WeightFile::CombinedNeural(c) => ValueModel::Neural(
                c.value_layers().into_value(path, learning_rate)?,
            ),
        })
    }

    /// Value-only save in the model's own format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        match self {
            ValueModel::Linear(m) => m.save(path),
            ValueModel::Neural(m) => m.save(path),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ModelKind {
        match self {
            ValueModel::Linear(_) => ModelKind::Linear,
            ValueModel::Neural(_) => ModelKind::Neural,
        }
    }

    #[must_use]
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        match self {
            ValueModel::Linear(m) => m.evaluate(features),
            ValueModel::Neural(m) => m.evaluate(features),
        }
    }

    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        match self {
            ValueModel::Linear(m) => m.learning_rate(),
            ValueModel::Neural(m) => m.learning_rate(),
        }
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        match self {
            ValueModel::Linear(m) => m.set_learning_rate(learning_rate),
            ValueModel::Neural(m) => m.set_learning_rate(learning_rate),
        }
    }

    /// Train on one log.
    pub fn train(&mut self, log: &GameLog, method: TrainingMethod, params: &TrainParams) {
        match self {
            ValueModel::Linear(m) => train_log(m, log, method, params),
            ValueModel::Neural(m) => train_log(m, log, method, params),
        }
    }
}
