//! Snapshot → feature vector encoding.
//!
//! Transforms a raw `GameSnapshot` into the fixed 70-value vector that the
//! value and policy models consume. Encoding is pure: the same snapshot and
//! perspective always produce the same vector, bit for bit. The production
//! engine runs its own copy of this encoder, so every formula here is a
//! parity contract (see `tests/feature_tests.rs` for the golden fixtures).

use rustc_hash::FxHashMap;

use crate::core::{GameSnapshot, PlayerSnapshot, PlayerStatus, Position, Side, SideMap, Weather};

use super::layout::*;
use super::pitch::{self, distance_to_endzone, forward_x, in_own_half, on_sideline, ratio};
use super::strategic;

/// A fully encoded state.
pub type FeatureVector = [f64; NUM_FEATURES];

/// Encodes snapshots from either side's point of view.
///
/// Stateless; exists so callers can hold an encoder where a trait object or
/// generic parameter is expected.
#[derive(Clone, Copy, Debug, Default)]
pub struct FeatureEncoder;

impl FeatureEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Encode `state` as seen by `perspective`.
    #[must_use]
    pub fn encode(&self, state: &GameSnapshot, perspective: Side) -> FeatureVector {
        encode(state, perspective)
    }

    /// Number of values produced per state.
    #[must_use]
    pub const fn output_len(&self) -> usize {
        NUM_FEATURES
    }
}

/// Players of one team, bucketed the way the features need them.
pub(crate) struct TeamView<'a> {
    /// Standing players, with or without a square.
    pub standing_total: usize,
    pub ko: usize,
    pub casualties: usize,
    /// Standing players that occupy a square.
    pub standing: Vec<&'a PlayerSnapshot>,
    /// Standing, prone or stunned players that occupy a square.
    pub on_pitch: Vec<&'a PlayerSnapshot>,
    /// Every player listed for the team, including reserves.
    pub roster: Vec<&'a PlayerSnapshot>,
}

impl<'a> TeamView<'a> {
    fn collect(state: &'a GameSnapshot, side: Side) -> Self {
        let mut view = TeamView {
            standing_total: 0,
            ko: 0,
            casualties: 0,
            standing: Vec::new(),
            on_pitch: Vec::new(),
            roster: Vec::new(),
        };

        for player in state.players.iter().filter(|p| p.is_on(side)) {
            view.roster.push(player);
            match player.state {
                PlayerStatus::Standing => view.standing_total += 1,
                PlayerStatus::Ko => view.ko += 1,
                s if s.is_casualty() => view.casualties += 1,
                _ => {}
            }
            if player.position.is_some() {
                if player.state == PlayerStatus::Standing {
                    view.standing.push(player);
                }
                if player.state.is_on_pitch() {
                    view.on_pitch.push(player);
                }
            }
        }

        view
    }

    /// Average of `stat` over standing players, divided by `scale`.
    fn average(&self, scale: f64, stat: impl Fn(&PlayerSnapshot) -> f64) -> f64 {
        if self.standing.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.standing.iter().map(|p| stat(*p)).sum();
        (sum / self.standing.len() as f64) / scale
    }

    fn skill_density(&self, skill: &str) -> f64 {
        let count = self.standing.iter().filter(|p| p.has_skill(skill)).count();
        ratio(count, self.standing.len())
    }

    fn sideline_fraction(&self) -> f64 {
        let count = self
            .standing
            .iter()
            .filter(|p| p.position.is_some_and(on_sideline))
            .count();
        ratio(count, self.standing.len())
    }

    /// Standing players adjacent to at least one standing player of `other`.
    fn engaged_with(&self, other: &TeamView<'_>) -> usize {
        self.standing
            .iter()
            .filter(|p| {
                let pos = square(p);
                other.standing.iter().any(|o| square(o).chebyshev(pos) == 1)
            })
            .count()
    }
}

/// Square of a player already known to be on the pitch.
pub(crate) fn square(player: &PlayerSnapshot) -> Position {
    player.position.unwrap_or(Position::new(-99, -99))
}

/// Who holds the ball, relative to the viewer.
pub(crate) struct Possession<'a> {
    pub mine: bool,
    pub theirs: bool,
    pub on_ground: bool,
    pub carrier: Option<&'a PlayerSnapshot>,
    pub dist_to_td: f64,
    pub in_my_half: bool,
}

impl<'a> Possession<'a> {
    fn resolve(
        state: &'a GameSnapshot,
        players: &FxHashMap<i64, &'a PlayerSnapshot>,
        perspective: Side,
    ) -> Self {
        let ball = &state.ball;
        let mut possession = Possession {
            mine: false,
            theirs: false,
            on_ground: false,
            carrier: None,
            dist_to_td: 0.5,
            in_my_half: false,
        };

        match (ball.is_held, ball.carrier_id) {
            (true, Some(id)) => {
                if let Some(&carrier) = players.get(&id) {
                    possession.carrier = Some(carrier);
                    if carrier.is_on(perspective) {
                        possession.mine = true;
                    } else {
                        possession.theirs = true;
                    }
                    if let Some(pos) = carrier.position {
                        possession.dist_to_td =
                            f64::from(distance_to_endzone(pos.x, perspective)) / pitch::LENGTH;
                        possession.in_my_half = in_own_half(pos.x, perspective);
                    }
                }
            }
            _ => {
                if let Some(pos) = ball.position {
                    possession.on_ground = true;
                    possession.in_my_half = in_own_half(pos.x, perspective);
                }
            }
        }

        possession
    }

    /// Square of the viewer's own ball carrier.
    pub fn my_carrier_square(&self) -> Option<Position> {
        if self.mine {
            self.carrier.and_then(|c| c.position)
        } else {
            None
        }
    }

    /// Square of the opposing ball carrier.
    pub fn their_carrier_square(&self) -> Option<Position> {
        if self.theirs {
            self.carrier.and_then(|c| c.position)
        } else {
            None
        }
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Encode `state` as seen by `perspective`.
#[must_use]
pub fn encode(state: &GameSnapshot, perspective: Side) -> FeatureVector {
    let opp = perspective.opponent();
    let me = state.team(perspective);
    let them = state.team(opp);

    let mut players: FxHashMap<i64, &PlayerSnapshot> = FxHashMap::default();
    for player in &state.players {
        players.entry(player.id).or_insert(player);
    }

    let views = SideMap::new(|side| TeamView::collect(state, side));
    let mine = &views[perspective];
    let theirs = &views[opp];
    let ball = Possession::resolve(state, &players, perspective);
    let my_carrier = ball.my_carrier_square();

    let mut f = [0.0; NUM_FEATURES];

    // Scoreboard and turn progress
    let score_diff = me.score - them.score;
    let turn = me.turn_number;
    f[SCORE_DIFF] = (f64::from(score_diff) / 6.0).clamp(-1.0, 1.0);
    f[MY_SCORE] = (f64::from(me.score) / 4.0).min(1.0);
    f[OPP_SCORE] = (f64::from(them.score) / 4.0).min(1.0);
    f[TURN_PROGRESS] = (f64::from(turn + (state.half - 1) * 8) / 16.0).min(1.0);
    f[MY_STANDING] = mine.standing_total as f64 / pitch::SQUAD;
    f[OPP_STANDING] = theirs.standing_total as f64 / pitch::SQUAD;
    f[MY_KO] = mine.ko as f64 / pitch::SQUAD;
    f[OPP_KO] = theirs.ko as f64 / pitch::SQUAD;
    f[MY_CASUALTIES] = mine.casualties as f64 / pitch::SQUAD;
    f[OPP_CASUALTIES] = theirs.casualties as f64 / pitch::SQUAD;
    f[MY_REROLLS] = (f64::from(me.rerolls) / 4.0).min(1.0);
    f[OPP_REROLLS] = (f64::from(them.rerolls) / 4.0).min(1.0);

    // Possession
    f[I_HAVE_BALL] = flag(ball.mine);
    f[OPP_HAS_BALL] = flag(ball.theirs);
    f[BALL_ON_GROUND] = flag(ball.on_ground);
    f[CARRIER_DIST_TO_TD] = ball.dist_to_td;
    f[BALL_IN_MY_HALF] = flag(ball.in_my_half);

    // Composition. Both teams' columns are measured from the viewer's end.
    let forward = |p: &PlayerSnapshot| f64::from(forward_x(square(p).x, perspective));
    f[MY_AVG_X] = mine.average(pitch::LENGTH, forward);
    f[OPP_AVG_X] = theirs.average(pitch::LENGTH, forward);
    f[MY_AVG_STRENGTH] = mine.average(5.0, |p| f64::from(p.stats.strength));
    f[OPP_AVG_STRENGTH] = theirs.average(5.0, |p| f64::from(p.stats.strength));
    f[MY_AVG_ARMOUR] = mine.average(10.0, |p| f64::from(p.stats.armour));
    f[OPP_AVG_ARMOUR] = theirs.average(10.0, |p| f64::from(p.stats.armour));
    f[MY_AVG_AGILITY] = mine.average(5.0, |p| f64::from(p.stats.agility));
    f[OPP_AVG_AGILITY] = theirs.average(5.0, |p| f64::from(p.stats.agility));

    // Cage: own on-pitch players adjacent to the carrier.
    let cage_count = match (my_carrier, ball.carrier) {
        (Some(cpos), Some(carrier)) => mine
            .on_pitch
            .iter()
            .filter(|p| p.id != carrier.id && square(p).chebyshev(cpos) == 1)
            .count(),
        _ => 0,
    };
    f[MY_CAGE_COUNT] = (cage_count as f64 / 4.0).min(1.0);

    // Turn context
    f[IS_RECEIVING] = flag(state.kicking_team.is_some_and(|k| k != perspective));
    f[IS_MY_TURN] = flag(state.active_team == Some(perspective));
    f[WEATHER_NICE] = flag(state.weather == Weather::Nice);
    f[WEATHER_RAIN] = flag(state.weather == Weather::PouringRain);
    f[WEATHER_BLIZZARD] = flag(state.weather == Weather::Blizzard);
    f[MY_BLITZ_AVAILABLE] = flag(!me.blitz_used_this_turn);
    f[MY_PASS_AVAILABLE] = flag(!me.pass_used_this_turn);

    f[BIAS] = 1.0;

    // Field-position risk
    let turns_remaining = f64::from((9 - turn).max(0)) / 8.0;
    let advantage_with_ball = if score_diff >= 0 && ball.mine {
        (f64::from(score_diff + 1) / 4.0).min(1.0)
    } else {
        0.0
    };
    let near_endzone = my_carrier.is_some_and(|c| distance_to_endzone(c.x, perspective) <= 3);
    f[MY_SIDELINE_FRACTION] = mine.sideline_fraction();
    f[OPP_SIDELINE_FRACTION] = theirs.sideline_fraction();
    f[TURNS_REMAINING] = turns_remaining;
    f[SCORE_ADVANTAGE_WITH_BALL] = advantage_with_ball;
    f[CARRIER_NEAR_ENDZONE] = flag(near_endzone);
    f[STALL_INCENTIVE] = advantage_with_ball * turns_remaining * flag(near_endzone);

    // Engagement
    let carrier_tz = my_carrier.map_or(0, |cpos| {
        theirs
            .standing
            .iter()
            .filter(|o| square(o).chebyshev(cpos) == 1)
            .count()
    });
    let can_reach = |pos: Option<Position>, side: Side| {
        match (pos, ball.carrier) {
            (Some(p), Some(carrier)) => carrier.stats.movement >= distance_to_endzone(p.x, side),
            _ => false,
        }
    };
    let my_engaged = mine.engaged_with(theirs);
    let opp_engaged = theirs.engaged_with(mine);
    let down = |v: &TeamView<'_>| v.on_pitch.iter().filter(|p| p.state.is_down()).count();

    f[CARRIER_TZ_COUNT] = (carrier_tz as f64 / 4.0).min(1.0);
    f[SCORING_THREAT] = flag(can_reach(my_carrier, perspective));
    f[OPP_SCORING_THREAT] = flag(can_reach(ball.their_carrier_square(), opp));
    f[MY_ENGAGED_FRACTION] = ratio(my_engaged, mine.standing.len());
    f[OPP_ENGAGED_FRACTION] = ratio(opp_engaged, theirs.standing.len());
    f[MY_DOWN] = down(mine) as f64 / pitch::SQUAD;
    f[OPP_DOWN] = down(theirs) as f64 / pitch::SQUAD;
    f[MY_FREE_PLAYERS] = (mine.standing.len() - my_engaged) as f64 / pitch::SQUAD;

    // Skill density among standing players
    f[MY_BLOCK_DENSITY] = mine.skill_density("Block");
    f[OPP_BLOCK_DENSITY] = theirs.skill_density("Block");
    f[MY_DODGE_DENSITY] = mine.skill_density("Dodge");
    f[OPP_DODGE_DENSITY] = theirs.skill_density("Dodge");
    f[MY_GUARD_DENSITY] = mine.skill_density("Guard");
    f[MY_MIGHTY_BLOW_DENSITY] = mine.skill_density("Mighty Blow");
    f[MY_CLAW_DENSITY] = mine.skill_density("Claw");
    let regenerating = mine
        .roster
        .iter()
        .filter(|p| p.has_skill("Regeneration"))
        .count();
    f[MY_REGENERATION_DENSITY] = ratio(regenerating, mine.roster.len());

    strategic::encode_into(
        &mut f,
        &strategic::Context {
            state,
            mine,
            theirs,
            ball: &ball,
            perspective,
            cage_count,
        },
    );

    f
}
