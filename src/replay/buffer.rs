//! Experience replay over single-step transitions.
//!
//! Transitions are cut from game logs one side at a time, so a transition
//! never links a home state to an away state. The buffer is a FIFO ring:
//! once full, the oldest transition is dropped for every new one.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::{Result, Side, TrainError, TrainRng};
use crate::records::{GameLog, ResultRecord};

/// One step of one side's episode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub features: Vec<f64>,
    /// That side's final reward: +1, -1 or 0.
    pub reward: f64,
    /// The side's next state; equal to `features` when terminal.
    pub next_features: Vec<f64>,
    pub perspective: Side,
    pub is_terminal: bool,
}

impl Transition {
    /// A minimal log that replays this transition through any trainer:
    /// one state (or two when not terminal) and a result whose winner
    /// reproduces the stored reward.
    #[must_use]
    pub fn to_game_log(&self) -> GameLog {
        let mut log = GameLog::new().with_state(self.features.clone(), self.perspective);
        if !self.is_terminal {
            log = log.with_state(self.next_features.clone(), self.perspective);
        }
        let winner = if self.reward > 0.0 {
            Some(self.perspective)
        } else if self.reward < 0.0 {
            Some(self.perspective.opponent())
        } else {
            None
        };
        log.with_result(ResultRecord {
            home_score: i32::from(self.reward > 0.0),
            away_score: i32::from(self.reward < 0.0),
            winner,
        })
    }
}

/// Cut a completed log into transitions. Incomplete logs yield none.
#[must_use]
pub fn transitions(log: &GameLog) -> Vec<Transition> {
    let mut out = Vec::with_capacity(log.states.len());
    for episode in log.episodes() {
        let n = episode.len();
        for (i, features) in episode.states.iter().enumerate() {
            let is_terminal = i + 1 == n;
            let next = if is_terminal {
                features
            } else {
                &episode.states[i + 1]
            };
            out.push(Transition {
                features: features.to_vec(),
                reward: episode.reward,
                next_features: next.to_vec(),
                perspective: episode.perspective,
                is_terminal,
            });
        }
    }
    out
}

/// Capacity-bounded FIFO of transitions.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    transitions: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(capacity.min(1 << 16)),
            capacity,
        }
    }

    /// Add one transition, evicting the oldest if full.
    pub fn push(&mut self, transition: Transition) {
        if self.capacity == 0 {
            return;
        }
        if self.transitions.len() >= self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Add every transition of a completed game. Returns how many were cut
    /// from the log.
    pub fn add_game(&mut self, log: &GameLog) -> usize {
        let cut = transitions(log);
        let count = cut.len();
        for t in cut {
            self.push(t);
        }
        count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    pub fn clear(&mut self) {
        self.transitions.clear();
    }

    /// `min(k, len)` distinct transitions chosen uniformly at random.
    pub fn sample(&self, k: usize, rng: &mut TrainRng) -> Vec<&Transition> {
        rng.sample_indices(self.transitions.len(), k)
            .into_iter()
            .map(|i| &self.transitions[i])
            .collect()
    }

    /// Write the full contents to `path`. The file is replaced atomically:
    /// a reader sees either the old snapshot or the new one.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TrainError::io(parent, e))?;
        }
        let tmp = path.with_extension("tmp");
        {
            let file = File::create(&tmp).map_err(|e| TrainError::io(&tmp, e))?;
            let mut writer = BufWriter::new(file);
            bincode::serialize_into(&mut writer, &self.transitions)?;
            writer.flush().map_err(|e| TrainError::io(&tmp, e))?;
        }
        fs::rename(&tmp, path).map_err(|e| TrainError::io(path, e))?;
        debug!("saved {} transitions to {}", self.len(), path.display());
        Ok(())
    }

    /// Replace the contents with a saved snapshot, keeping only the newest
    /// `capacity` transitions.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TrainError::io(path, e))?;
        let saved: Vec<Transition> = bincode::deserialize_from(BufReader::new(file))?;
        let skip = saved.len().saturating_sub(self.capacity);
        self.transitions = saved.into_iter().skip(skip).collect();
        Ok(())
    }
}

impl Default for ReplayBuffer {
    fn default() -> Self {
        Self::new(50_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(winner: Option<Side>, states_per_side: usize) -> GameLog {
        let mut log = GameLog::new();
        for i in 0..states_per_side {
            log = log
                .with_state(vec![i as f64, 1.0], Side::Home)
                .with_state(vec![i as f64, -1.0], Side::Away);
        }
        log.with_result(ResultRecord {
            home_score: 0,
            away_score: 0,
            winner,
        })
    }

    #[test]
    fn test_transitions_per_side() {
        let cut = transitions(&game(Some(Side::Home), 3));
        assert_eq!(cut.len(), 6);

        let home: Vec<_> = cut.iter().filter(|t| t.perspective == Side::Home).collect();
        assert_eq!(home.len(), 3);
        assert!(home.iter().all(|t| t.reward == 1.0));
        assert_eq!(home[0].next_features, vec![1.0, 1.0]);
        assert!(!home[0].is_terminal);
        assert!(home[2].is_terminal);
        assert_eq!(home[2].next_features, home[2].features);

        let away: Vec<_> = cut.iter().filter(|t| t.perspective == Side::Away).collect();
        assert!(away.iter().all(|t| t.reward == -1.0));
    }

    #[test]
    fn test_capacity_is_never_exceeded() {
        let mut buffer = ReplayBuffer::new(5);
        for _ in 0..4 {
            buffer.add_game(&game(None, 2));
            assert!(buffer.len() <= 5);
        }
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn test_fifo_eviction() {
        let mut buffer = ReplayBuffer::new(2);
        for i in 0..3 {
            buffer.push(Transition {
                features: vec![i as f64],
                reward: 0.0,
                next_features: vec![i as f64],
                perspective: Side::Home,
                is_terminal: true,
            });
        }
        let kept: Vec<f64> = buffer.iter().map(|t| t.features[0]).collect();
        assert_eq!(kept, vec![1.0, 2.0]);
    }

    #[test]
    fn test_sample_larger_than_buffer() {
        let mut buffer = ReplayBuffer::new(100);
        buffer.add_game(&game(Some(Side::Away), 2));
        let mut rng = TrainRng::new(1);
        assert_eq!(buffer.sample(50, &mut rng).len(), buffer.len());
        assert_eq!(buffer.sample(3, &mut rng).len(), 3);
        assert!(ReplayBuffer::new(10).sample(4, &mut rng).is_empty());
    }

    #[test]
    fn test_sample_without_replacement() {
        let mut buffer = ReplayBuffer::new(100);
        buffer.add_game(&game(None, 10));
        let mut rng = TrainRng::new(9);
        let sample = buffer.sample(20, &mut rng);
        for (i, a) in sample.iter().enumerate() {
            for b in &sample[i + 1..] {
                assert!(!std::ptr::eq(*a, *b));
            }
        }
    }

    #[test]
    fn test_incomplete_game_adds_nothing() {
        let mut buffer = ReplayBuffer::new(10);
        let log = GameLog::new().with_state(vec![1.0], Side::Home);
        assert_eq!(buffer.add_game(&log), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_zero_capacity_holds_nothing() {
        let mut buffer = ReplayBuffer::new(0);
        buffer.add_game(&game(None, 2));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_snapshot_round_trip_and_shrink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replay_buffer.bin");

        let mut buffer = ReplayBuffer::new(10);
        buffer.add_game(&game(Some(Side::Home), 3));
        buffer.save(&path).unwrap();
        assert!(!path.with_extension("tmp").exists());

        let mut same = ReplayBuffer::new(10);
        same.load(&path).unwrap();
        assert_eq!(same.iter().collect::<Vec<_>>(), buffer.iter().collect::<Vec<_>>());

        let mut smaller = ReplayBuffer::new(2);
        smaller.load(&path).unwrap();
        assert_eq!(smaller.len(), 2);
        let newest: Vec<_> = buffer.iter().skip(4).collect();
        assert_eq!(smaller.iter().collect::<Vec<_>>(), newest);
    }

    #[test]
    fn test_mini_log_reproduces_reward() {
        let cut = transitions(&game(Some(Side::Away), 2));
        for t in &cut {
            let log = t.to_game_log();
            assert_eq!(log.states.len(), if t.is_terminal { 1 } else { 2 });
            let result = log.result.unwrap();
            assert_eq!(result.reward_for(t.perspective), t.reward);
        }
        let draw = transitions(&game(None, 1));
        assert!(!draw.is_empty());
        assert!(draw.iter().all(|t| t.reward == 0.0));
        assert!(draw.iter().all(|t| t.to_game_log().result.unwrap().winner.is_none()));
    }
}
