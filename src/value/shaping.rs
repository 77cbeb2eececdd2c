//! Potential-based reward shaping.

use serde::{Deserialize, Serialize};

use crate::features::layout::{
    CARRIER_CAN_SCORE, CARRIER_DIST_TO_TD, CARRIER_NEAR_ENDZONE, I_HAVE_BALL, MY_CASUALTIES,
    MY_SCORE, OPP_CASUALTIES, OPP_SCORE, STALL_INCENTIVE,
};

/// A linear potential Φ(s) = Σ weight · features[index].
///
/// Pairs whose index falls outside the feature vector are ignored rather
/// than rejected, so one configuration works across feature-set versions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapingWeights {
    pairs: Vec<(usize, f64)>,
}

impl ShapingWeights {
    pub fn new(pairs: impl Into<Vec<(usize, f64)>>) -> Self {
        Self {
            pairs: pairs.into(),
        }
    }

    /// No shaping: Φ(s) = 0 everywhere.
    #[must_use]
    pub fn none() -> Self {
        Self { pairs: Vec::new() }
    }

    #[must_use]
    pub fn pairs(&self) -> &[(usize, f64)] {
        &self.pairs
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Φ(features) over the first `width` slots; missing slots read as zero.
    #[must_use]
    pub fn potential(&self, features: &[f64], width: usize) -> f64 {
        self.pairs
            .iter()
            .filter(|(idx, _)| *idx < width)
            .map(|&(idx, w)| w * features.get(idx).copied().unwrap_or(0.0))
            .sum()
    }
}

impl Default for ShapingWeights {
    /// Score lead, possession, carrier progress, casualties, stalling and
    /// scoring reach.
    fn default() -> Self {
        Self::new(vec![
            (MY_SCORE, 3.0),
            (OPP_SCORE, -3.0),
            (I_HAVE_BALL, 0.5),
            (CARRIER_DIST_TO_TD, -1.5),
            (MY_CASUALTIES, -0.3),
            (OPP_CASUALTIES, 0.3),
            (CARRIER_NEAR_ENDZONE, 0.5),
            (STALL_INCENTIVE, 2.5),
            (CARRIER_CAN_SCORE, 0.1),
        ])
    }
}
