//! Team sides and per-side data storage.
//!
//! ## Side
//!
//! The simulator always plays two teams, `home` and `away`. Every feature
//! vector and every learned value is expressed from one side's perspective.
//!
//! ## SideMap
//!
//! Fixed two-slot storage indexed by `Side`, used wherever the original data
//! is naturally "one of these per team".

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use super::error::TrainError;

/// One of the two teams on the pitch.
///
/// Serialized as the lowercase strings `"home"` / `"away"` used by every
/// log and snapshot format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Home,
    Away,
}

impl Side {
    /// Both sides, home first.
    pub const ALL: [Side; 2] = [Side::Home, Side::Away];

    /// The other team.
    #[must_use]
    pub const fn opponent(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }

    /// Slot index (home = 0, away = 1).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Side::Home => 0,
            Side::Away => 1,
        }
    }

    /// Wire name of this side.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = TrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(Side::Home),
            "away" => Ok(Side::Away),
            other => Err(TrainError::InvalidConfig(format!("unknown side '{other}'"))),
        }
    }
}

/// Per-side data storage with O(1) access.
///
/// ```
/// use pitch_learn::core::{Side, SideMap};
///
/// let mut rerolls: SideMap<u32> = SideMap::with_value(3);
/// rerolls[Side::Away] = 1;
/// assert_eq!(rerolls[Side::Home], 3);
/// assert_eq!(rerolls[Side::Away], 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideMap<T> {
    data: [T; 2],
}

impl<T> SideMap<T> {
    /// Create a map with values from a factory function.
    pub fn new(mut factory: impl FnMut(Side) -> T) -> Self {
        Self {
            data: [factory(Side::Home), factory(Side::Away)],
        }
    }

    /// Create a map with both entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            data: [value.clone(), value],
        }
    }

    /// Iterate over `(side, value)` pairs, home first.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        Side::ALL.into_iter().zip(self.data.iter())
    }

    /// Transform every entry.
    pub fn map<U>(&self, mut f: impl FnMut(Side, &T) -> U) -> SideMap<U> {
        SideMap::new(|side| f(side, &self.data[side.index()]))
    }
}

impl<T> Index<Side> for SideMap<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        &self.data[side.index()]
    }
}

impl<T> IndexMut<Side> for SideMap<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        &mut self.data[side.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent_is_involution() {
        for side in Side::ALL {
            assert_ne!(side, side.opponent());
            assert_eq!(side, side.opponent().opponent());
        }
    }

    #[test]
    fn test_side_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Home).unwrap(), "\"home\"");
        let away: Side = serde_json::from_str("\"away\"").unwrap();
        assert_eq!(away, Side::Away);
        assert!(serde_json::from_str::<Side>("\"HOME\"").is_err());
    }

    #[test]
    fn test_side_from_str() {
        assert_eq!("home".parse::<Side>().unwrap(), Side::Home);
        assert_eq!("away".parse::<Side>().unwrap(), Side::Away);
        assert!("draw".parse::<Side>().is_err());
    }

    #[test]
    fn test_side_map_indexing() {
        let mut map = SideMap::new(|side| side.index() * 10);
        assert_eq!(map[Side::Home], 0);
        assert_eq!(map[Side::Away], 10);

        map[Side::Home] = 5;
        let pairs: Vec<_> = map.iter().map(|(s, v)| (s, *v)).collect();
        assert_eq!(pairs, vec![(Side::Home, 5), (Side::Away, 10)]);
    }

    #[test]
    fn test_side_map_map() {
        let map = SideMap::with_value(2.0_f64);
        let doubled = map.map(|_, v| v * 2.0);
        assert_eq!(doubled[Side::Away], 4.0);
    }
}
