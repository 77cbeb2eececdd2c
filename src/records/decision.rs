//! Search-visit distillation records.
//!
//! When the engine plays with search enabled it writes, per game, a JSON
//! array of decisions. Each decision carries the encoded state, and for
//! every candidate action that search considered, the action's features and
//! the share of search visits it received.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{Result, Side, TrainError};

/// One candidate action and its share of search visits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionVisit {
    pub action_features: Vec<f64>,
    pub visit_fraction: f64,
}

/// One search-based action choice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub state_features: Vec<f64>,
    #[serde(default)]
    pub perspective: Side,
    /// SmallVec optimizes for the usual handful of candidates.
    #[serde(default)]
    pub visits: SmallVec<[ActionVisit; 8]>,
}

impl PolicyDecision {
    pub fn new(state_features: impl Into<Vec<f64>>, perspective: Side) -> Self {
        Self {
            state_features: state_features.into(),
            perspective,
            visits: SmallVec::new(),
        }
    }

    /// Builder-style candidate append.
    #[must_use]
    pub fn with_visit(mut self, action_features: impl Into<Vec<f64>>, visit_fraction: f64) -> Self {
        self.visits.push(ActionVisit {
            action_features: action_features.into(),
            visit_fraction,
        });
        self
    }

    /// Visit fractions rescaled to sum to 1. Left untouched when they sum
    /// to zero or less.
    #[must_use]
    pub fn targets(&self) -> SmallVec<[f64; 8]> {
        let mut targets: SmallVec<[f64; 8]> =
            self.visits.iter().map(|v| v.visit_fraction).collect();
        let total: f64 = targets.iter().sum();
        if total > 0.0 {
            for t in &mut targets {
                *t /= total;
            }
        }
        targets
    }

    /// Rescale stored visit fractions in place; see [`targets`](Self::targets).
    pub fn normalize(&mut self) {
        let targets = self.targets();
        for (visit, t) in self.visits.iter_mut().zip(targets) {
            visit.visit_fraction = t;
        }
    }
}

/// Read a decision file, normalizing every decision's visit fractions.
pub fn read_decisions(path: impl AsRef<Path>) -> Result<Vec<PolicyDecision>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| TrainError::io(path, e))?;
    let mut decisions: Vec<PolicyDecision> =
        serde_json::from_str(&text).map_err(|e| TrainError::json(path, e))?;
    for decision in &mut decisions {
        decision.normalize();
    }
    Ok(decisions)
}

pub fn write_decisions(path: impl AsRef<Path>, decisions: &[PolicyDecision]) -> Result<()> {
    let path = path.as_ref();
    let text = serde_json::to_string(decisions).map_err(|e| TrainError::json(path, e))?;
    fs::write(path, text).map_err(|e| TrainError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_normalized() {
        let decision = PolicyDecision::new(vec![0.0; 3], Side::Home)
            .with_visit(vec![1.0], 2.0)
            .with_visit(vec![0.0], 6.0);
        let targets = decision.targets();
        assert!((targets[0] - 0.25).abs() < 1e-12);
        assert!((targets[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_zero_visits_left_alone() {
        let mut decision = PolicyDecision::new(vec![], Side::Away)
            .with_visit(vec![], 0.0)
            .with_visit(vec![], 0.0);
        decision.normalize();
        assert!(decision.visits.iter().all(|v| v.visit_fraction == 0.0));
    }

    #[test]
    fn test_decode_engine_format() {
        let json = r#"[{"state_features":[1.0,2.0],"perspective":"away",
            "visits":[{"action_features":[0.1],"visit_fraction":0.4},
                      {"action_features":[0.2],"visit_fraction":0.4}]}]"#;
        let decisions: Vec<PolicyDecision> = serde_json::from_str(json).unwrap();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].perspective, Side::Away);
        assert_eq!(decisions[0].visits.len(), 2);
    }

    #[test]
    fn test_read_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decisions_0001.json");
        let decisions = vec![PolicyDecision::new(vec![0.5], Side::Home)
            .with_visit(vec![1.0], 1.0)
            .with_visit(vec![2.0], 3.0)];
        write_decisions(&path, &decisions).unwrap();

        let loaded = read_decisions(&path).unwrap();
        assert!((loaded[0].visits[0].visit_fraction - 0.25).abs() < 1e-12);
        assert!((loaded[0].visits[1].visit_fraction - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_decisions("/nonexistent/decisions.json").unwrap_err();
        assert!(matches!(err, TrainError::Io { .. }));
    }
}
