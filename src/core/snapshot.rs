//! Raw game-state snapshots as emitted by the external engine.
//!
//! The engine serializes its state as camelCase JSON. Every field the
//! encoder reads has a default so partially populated snapshots (hand-built
//! fixtures, older engine versions) still decode.

use serde::{Deserialize, Serialize};

use super::side::{Side, SideMap};

/// A pitch square. The pitch is 26 columns (x) by 15 rows (y).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// King-move distance; adjacent squares are at distance 1.
    #[must_use]
    pub fn chebyshev(self, other: Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

fn default_movement() -> i32 {
    6
}
fn default_strength() -> i32 {
    3
}
fn default_agility() -> i32 {
    3
}
fn default_armour() -> i32 {
    8
}
fn default_turn() -> i32 {
    1
}
fn default_half() -> i32 {
    1
}

/// Player characteristics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(default = "default_movement")]
    pub movement: i32,
    #[serde(default = "default_strength")]
    pub strength: i32,
    #[serde(default = "default_agility")]
    pub agility: i32,
    #[serde(default = "default_armour")]
    pub armour: i32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            movement: default_movement(),
            strength: default_strength(),
            agility: default_agility(),
            armour: default_armour(),
        }
    }
}

/// Player condition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    #[default]
    Standing,
    Prone,
    Stunned,
    Ko,
    Injured,
    Dead,
    /// Reserves, sent off, and anything else the engine reports.
    #[serde(other)]
    Other,
}

impl PlayerStatus {
    /// Standing, prone or stunned: the player occupies a square.
    #[must_use]
    pub const fn is_on_pitch(self) -> bool {
        matches!(
            self,
            PlayerStatus::Standing | PlayerStatus::Prone | PlayerStatus::Stunned
        )
    }

    #[must_use]
    pub const fn is_down(self) -> bool {
        matches!(self, PlayerStatus::Prone | PlayerStatus::Stunned)
    }

    /// Injured or dead; both count as casualties.
    #[must_use]
    pub const fn is_casualty(self) -> bool {
        matches!(self, PlayerStatus::Injured | PlayerStatus::Dead)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Nice,
    PouringRain,
    Blizzard,
    #[serde(other)]
    Other,
}

/// One player in the match.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub team_side: Option<Side>,
    #[serde(default)]
    pub state: PlayerStatus,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub stats: PlayerStats,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl PlayerSnapshot {
    #[must_use]
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s == skill)
    }

    #[must_use]
    pub fn is_on(&self, side: Side) -> bool {
        self.team_side == Some(side)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallSnapshot {
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub is_held: bool,
    #[serde(default)]
    pub carrier_id: Option<i64>,
}

/// Per-team scoreboard and turn state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSnapshot {
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub rerolls: i32,
    #[serde(default = "default_turn")]
    pub turn_number: i32,
    #[serde(default)]
    pub blitz_used_this_turn: bool,
    #[serde(default)]
    pub pass_used_this_turn: bool,
}

impl Default for TeamSnapshot {
    fn default() -> Self {
        Self {
            score: 0,
            rerolls: 0,
            turn_number: default_turn(),
            blitz_used_this_turn: false,
            pass_used_this_turn: false,
        }
    }
}

/// Complete match state at one turn boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    #[serde(default = "default_half")]
    pub half: i32,
    #[serde(default)]
    pub active_team: Option<Side>,
    #[serde(default)]
    pub kicking_team: Option<Side>,
    #[serde(default)]
    pub weather: Weather,
    #[serde(default)]
    pub home_team: TeamSnapshot,
    #[serde(default)]
    pub away_team: TeamSnapshot,
    #[serde(default)]
    pub players: Vec<PlayerSnapshot>,
    #[serde(default)]
    pub ball: BallSnapshot,
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            half: default_half(),
            active_team: None,
            kicking_team: None,
            weather: Weather::default(),
            home_team: TeamSnapshot::default(),
            away_team: TeamSnapshot::default(),
            players: Vec::new(),
            ball: BallSnapshot::default(),
        }
    }
}

impl GameSnapshot {
    #[must_use]
    pub fn team(&self, side: Side) -> &TeamSnapshot {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    /// Both teams as a side map.
    #[must_use]
    pub fn teams(&self) -> SideMap<&TeamSnapshot> {
        SideMap::new(|side| self.team(side))
    }

    /// First player with the given id.
    #[must_use]
    pub fn player(&self, id: i64) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| p.id == id)
    }
}
