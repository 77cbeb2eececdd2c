//! Value and policy weights persisted together in one file.

use std::path::Path;

use super::trainer::PolicyTrainer;
use crate::core::Result;
use crate::value::{CombinedLinear, CombinedNeural, NeuralLayers, ValueModel, WeightFile};

/// Build the combined file for a value model and policy.
#[must_use]
pub fn combined_file(value: &ValueModel, policy: &PolicyTrainer) -> WeightFile {
    let policy_weights = Some(policy.weights().to_vec());
    match value {
        ValueModel::Linear(m) => WeightFile::CombinedLinear(CombinedLinear {
            value_weights: m.weights().to_vec(),
            policy_weights,
            policy_bias: policy.bias(),
            policy_temperature: policy.temperature(),
        }),
        ValueModel::Neural(m) => {
            let layers = NeuralLayers::from_value(m);
            WeightFile::CombinedNeural(CombinedNeural {
                hidden_size: layers.hidden_size,
                n_features: layers.n_features,
                value_w1: layers.w1,
                value_b1: layers.b1,
                value_w2: layers.w2,
                value_b2: layers.b2,
                policy_weights,
                policy_bias: policy.bias(),
                policy_temperature: policy.temperature(),
            })
        }
    }
}

pub fn save_combined(
    value: &ValueModel,
    policy: &PolicyTrainer,
    path: impl AsRef<Path>,
) -> Result<()> {
    combined_file(value, policy).write(path)
}

/// Load a value model and policy. A value-only file yields a fresh policy.
pub fn load_combined(
    path: impl AsRef<Path>,
    value_lr: f64,
    policy_lr: f64,
) -> Result<(ValueModel, PolicyTrainer)> {
    let path = path.as_ref();
    let file = WeightFile::read(path)?;

    let policy_parts = match &file {
        WeightFile::CombinedLinear(c) => Some((c.policy_weights.clone(), c.policy_bias, c.policy_temperature)),
        WeightFile::CombinedNeural(c) => Some((c.policy_weights.clone(), c.policy_bias, c.policy_temperature)),
        WeightFile::Linear(_) | WeightFile::Neural(_) => None,
    };
    let policy = match policy_parts {
        Some((Some(weights), bias, temperature)) => {
            PolicyTrainer::from_parts(weights, bias, policy_lr, temperature)
        }
        _ => PolicyTrainer::new(policy_lr),
    };

    let value = ValueModel::from_file(file, path, value_lr)?;
    Ok((value, policy))
}
