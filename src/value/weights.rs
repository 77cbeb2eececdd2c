//! On-disk weight formats.
//!
//! Three shapes share one file name and are told apart by content:
//!
//! - a bare JSON array: linear value weights
//! - `{"type":"neural", ...}`: a two-layer value network
//! - `{"type":"alphazero_linear" | "alphazero_neural", ...}`: value weights
//!   plus a linear policy head and its inference temperature
//!
//! The consuming engine reads these files directly, so field names and
//! nesting are fixed.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::neural::{NeuralParams, NeuralValue};
use crate::core::{Result, TrainError};

/// Policy softmax temperature used when a file does not specify one.
pub const DEFAULT_POLICY_TEMPERATURE: f64 = 0.3;

fn default_temperature() -> f64 {
    DEFAULT_POLICY_TEMPERATURE
}

/// Pad with zeros or truncate to exactly `len` entries.
#[must_use]
pub fn aligned(mut values: Vec<f64>, len: usize) -> Vec<f64> {
    values.resize(len, 0.0);
    values
}

/// Network layers in the nested-array layout of the file format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeuralLayers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_features: Option<usize>,
    #[serde(rename = "W1")]
    pub w1: Vec<Vec<f64>>,
    pub b1: Vec<f64>,
    #[serde(rename = "W2")]
    pub w2: Vec<Vec<f64>>,
    pub b2: Vec<f64>,
}

impl NeuralLayers {
    #[must_use]
    pub fn from_value(net: &NeuralValue) -> Self {
        let h = net.hidden_size();
        let p = net.params();
        Self {
            hidden_size: Some(h),
            n_features: Some(net.n_features()),
            w1: if h == 0 {
                vec![Vec::new(); net.n_features()]
            } else {
                p.w1.chunks(h).map(<[f64]>::to_vec).collect()
            },
            b1: p.b1.clone(),
            w2: p.w2.iter().map(|&w| vec![w]).collect(),
            b2: vec![p.b2],
        }
    }

    /// Rebuild a network read from `path`. Shapes come from the arrays
    /// themselves; the declared sizes must agree with them when present.
    pub fn into_value(self, path: &Path, learning_rate: f64) -> Result<NeuralValue> {
        let malformed = |reason: String| TrainError::MalformedWeights {
            path: path.to_path_buf(),
            reason,
        };
        let n_features = self.w1.len();
        let hidden_size = self.b1.len();
        if self.n_features.is_some_and(|n| n != n_features) {
            return Err(malformed(format!(
                "n_features is {:?} but W1 has {} rows",
                self.n_features, n_features
            )));
        }
        if self.hidden_size.is_some_and(|h| h != hidden_size) {
            return Err(malformed(format!(
                "hidden_size is {:?} but b1 has {} entries",
                self.hidden_size, hidden_size
            )));
        }
        if let Some(row) = self.w1.iter().position(|r| r.len() != hidden_size) {
            return Err(malformed(format!(
                "W1 row {row} does not have {hidden_size} columns"
            )));
        }
        if self.w2.len() != hidden_size {
            return Err(malformed(format!(
                "W2 has {} rows, expected {hidden_size}",
                self.w2.len()
            )));
        }
        let mut w2 = Vec::with_capacity(self.w2.len());
        for row in &self.w2 {
            match row.as_slice() {
                [w] => w2.push(*w),
                _ => return Err(malformed("W2 must be a column of single-element rows".into())),
            }
        }
        let [b2] = self.b2.as_slice() else {
            return Err(malformed("b2 must hold exactly one value".into()));
        };

        let params = NeuralParams {
            w1: self.w1.into_iter().flatten().collect(),
            b1: self.b1,
            w2,
            b2: *b2,
        };
        NeuralValue::from_params(n_features, hidden_size, params, learning_rate)
    }
}

/// Combined file with a linear value function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombinedLinear {
    pub value_weights: Vec<f64>,
    #[serde(default)]
    pub policy_weights: Option<Vec<f64>>,
    #[serde(default)]
    pub policy_bias: f64,
    #[serde(default = "default_temperature")]
    pub policy_temperature: f64,
}

/// Combined file with a neural value function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombinedNeural {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_features: Option<usize>,
    #[serde(rename = "value_W1")]
    pub value_w1: Vec<Vec<f64>>,
    pub value_b1: Vec<f64>,
    #[serde(rename = "value_W2")]
    pub value_w2: Vec<Vec<f64>>,
    pub value_b2: Vec<f64>,
    #[serde(default)]
    pub policy_weights: Option<Vec<f64>>,
    #[serde(default)]
    pub policy_bias: f64,
    #[serde(default = "default_temperature")]
    pub policy_temperature: f64,
}

impl CombinedNeural {
    /// The value network half as a stand-alone layer set.
    #[must_use]
    pub fn value_layers(&self) -> NeuralLayers {
        NeuralLayers {
            hidden_size: self.hidden_size,
            n_features: self.n_features,
            w1: self.value_w1.clone(),
            b1: self.value_b1.clone(),
            w2: self.value_w2.clone(),
            b2: self.value_b2.clone(),
        }
    }
}

/// Object-shaped files, discriminated by their `type` field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Tagged {
    Neural(NeuralLayers),
    AlphazeroLinear(CombinedLinear),
    AlphazeroNeural(CombinedNeural),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum Raw {
    Flat(Vec<f64>),
    Tagged(Tagged),
}

/// Any weight file this crate reads or writes.
#[derive(Clone, Debug, PartialEq)]
pub enum WeightFile {
    Linear(Vec<f64>),
    Neural(NeuralLayers),
    CombinedLinear(CombinedLinear),
    CombinedNeural(CombinedNeural),
}

impl WeightFile {
    /// The persisted type tag (`linear` for bare arrays).
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            WeightFile::Linear(_) => "linear",
            WeightFile::Neural(_) => "neural",
            WeightFile::CombinedLinear(_) => "alphazero_linear",
            WeightFile::CombinedNeural(_) => "alphazero_neural",
        }
    }

    /// True for the value+policy formats.
    #[must_use]
    pub fn is_combined(&self) -> bool {
        matches!(
            self,
            WeightFile::CombinedLinear(_) | WeightFile::CombinedNeural(_)
        )
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        Ok(match serde_json::from_str::<Raw>(text)? {
            Raw::Flat(weights) => WeightFile::Linear(weights),
            Raw::Tagged(Tagged::Neural(layers)) => WeightFile::Neural(layers),
            Raw::Tagged(Tagged::AlphazeroLinear(c)) => WeightFile::CombinedLinear(c),
            Raw::Tagged(Tagged::AlphazeroNeural(c)) => WeightFile::CombinedNeural(c),
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let raw = match self.clone() {
            WeightFile::Linear(weights) => Raw::Flat(weights),
            WeightFile::Neural(layers) => Raw::Tagged(Tagged::Neural(layers)),
            WeightFile::CombinedLinear(c) => Raw::Tagged(Tagged::AlphazeroLinear(c)),
            WeightFile::CombinedNeural(c) => Raw::Tagged(Tagged::AlphazeroNeural(c)),
        };
        serde_json::to_string(&raw)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| TrainError::io(path, e))?;
        Self::from_json(&text).map_err(|e| TrainError::json(path, e))
    }

    /// Write the file, creating parent directories as needed.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TrainError::io(parent, e))?;
        }
        let text = self.to_json().map_err(|e| TrainError::json(path, e))?;
        fs::write(path, text).map_err(|e| TrainError::io(path, e))
    }
}
