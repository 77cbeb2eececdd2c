//! Opponent curriculum driven by a rolling win rate.

use std::collections::VecDeque;

use log::info;

use super::config::CurriculumStage;

/// Epoch win rates averaged before a stage may be cleared.
pub const CURRICULUM_WINDOW: usize = 3;

/// Tracks the active stage and the recent win rates against it.
#[derive(Clone, Debug)]
pub struct Curriculum {
    stages: Vec<CurriculumStage>,
    stage: usize,
    recent: VecDeque<f64>,
}

impl Curriculum {
    /// Start at the first stage. Returns `None` for an empty stage list.
    pub fn new(stages: Vec<CurriculumStage>) -> Option<Self> {
        if stages.is_empty() {
            return None;
        }
        Some(Self {
            stages,
            stage: 0,
            recent: VecDeque::with_capacity(CURRICULUM_WINDOW),
        })
    }

    pub fn stage_index(&self) -> usize {
        self.stage
    }

    pub fn current(&self) -> &CurriculumStage {
        &self.stages[self.stage]
    }

    pub fn is_final(&self) -> bool {
        self.stage + 1 == self.stages.len()
    }

    /// Mean of the window once it is full.
    pub fn rolling_average(&self) -> Option<f64> {
        (self.recent.len() == CURRICULUM_WINDOW)
            .then(|| self.recent.iter().sum::<f64>() / CURRICULUM_WINDOW as f64)
    }

    /// Record one epoch's win rate. Returns the new stage if this cleared
    /// the current one.
    pub fn record(&mut self, win_rate: f64) -> Option<&CurriculumStage> {
        if self.recent.len() == CURRICULUM_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(win_rate);

        let threshold = self.current().win_rate_threshold?;
        let average = self.rolling_average()?;
        if average < threshold || self.is_final() {
            return None;
        }

        self.stage += 1;
        self.recent.clear();
        let next = &self.stages[self.stage];
        info!(
            "curriculum: advancing to stage {} ({})",
            self.stage, next.opponent
        );
        Some(next)
    }
}
