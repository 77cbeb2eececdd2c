//! Strategic pattern features (indices 56..=69).
//!
//! These look at spatial relationships between players rather than simple
//! counts: cage shape, block odds, screening, exposure to a one-turn score.

use crate::core::{GameSnapshot, PlayerSnapshot, Position, Side};

use super::encoder::{square, FeatureVector, Possession, TeamView};
use super::layout::*;
use super::pitch::{distance_to_endzone, forward_x, in_bounds, on_sideline, ratio};

/// Range of a pass measured in squares.
const PASS_RANGE: i32 = 10;
/// Extra squares a player can try to reach by going for it.
const GO_FOR_IT: i32 = 2;
/// Teammates closer than this do not leave a player isolated.
const ISOLATION_RADIUS: i32 = 3;
/// Distance reported when a team has nobody near a loose ball.
const NOBODY_CLOSE: i32 = 99;

/// Everything the strategic block needs from the main encoder pass.
pub(crate) struct Context<'a> {
    pub state: &'a GameSnapshot,
    pub mine: &'a TeamView<'a>,
    pub theirs: &'a TeamView<'a>,
    pub ball: &'a Possession<'a>,
    pub perspective: Side,
    /// Raw (unscaled) number of own players adjacent to our carrier.
    pub cage_count: usize,
}

fn adjacent(a: &PlayerSnapshot, b: &PlayerSnapshot) -> bool {
    square(a).chebyshev(square(b)) == 1
}

fn movement(player: &PlayerSnapshot) -> i32 {
    player.stats.movement
}

/// Diagonal squares around `center` occupied by one of `team`.
fn diagonal_cover(center: Position, team: &[&PlayerSnapshot]) -> usize {
    [(-1, -1), (1, -1), (-1, 1), (1, 1)]
        .into_iter()
        .map(|(dx, dy)| (center.x + dx, center.y + dy))
        .filter(|&(x, y)| in_bounds(x, y))
        .filter(|&(x, y)| team.iter().any(|p| square(p) == Position::new(x, y)))
        .count()
}

/// Assists `team` can give against `target`, excluding `blocker`.
///
/// A helper standing in the tackle zone of anyone on `other` except
/// `target` cannot assist, unless it has Guard.
fn assists(
    team: &[&PlayerSnapshot],
    blocker: &PlayerSnapshot,
    target: &PlayerSnapshot,
    other: &[&PlayerSnapshot],
) -> i32 {
    let mut count = 0;
    for helper in team.iter().filter(|h| h.id != blocker.id) {
        if !adjacent(helper, target) {
            continue;
        }
        let marked = !helper.has_skill("Guard")
            && other
                .iter()
                .filter(|chk| chk.id != target.id)
                .any(|chk| adjacent(helper, chk));
        if !marked {
            count += 1;
        }
    }
    count
}

/// Own standing players whose block on the first adjacent opponent has the
/// strength advantage after assists.
fn favorable_blocks(mine: &[&PlayerSnapshot], theirs: &[&PlayerSnapshot]) -> usize {
    let mut favorable = 0;
    for attacker in mine {
        // Only the first adjacent opponent is considered.
        let Some(defender) = theirs.iter().find(|op| adjacent(attacker, op)) else {
            continue;
        };
        let attack = attacker.stats.strength + assists(mine, attacker, defender, theirs);
        let defence = defender.stats.strength + assists(theirs, defender, attacker, mine);
        if attack > defence {
            favorable += 1;
        }
    }
    favorable
}

/// Fill indices 56..=69 of `f`.
pub(crate) fn encode_into(f: &mut FeatureVector, ctx: &Context<'_>) {
    let perspective = ctx.perspective;
    let opp = perspective.opponent();
    let mine = ctx.mine.standing.as_slice();
    let theirs = ctx.theirs.standing.as_slice();

    // A carrier id of 0 is treated as no carrier here.
    let carrier = ctx
        .ball
        .carrier
        .filter(|_| ctx.state.ball.carrier_id != Some(0));
    let carrier_square = carrier.and_then(|c| c.position);
    let my_carrier = carrier_square.filter(|_| ctx.ball.mine);
    let their_carrier = carrier_square.filter(|_| ctx.ball.theirs);

    let cage_diagonal = my_carrier.map_or(0, |c| diagonal_cover(c, mine));
    let opp_cage_diagonal = their_carrier.map_or(0, |c| diagonal_cover(c, theirs));

    let cage_overload = if ctx.ball.mine {
        ((ctx.cage_count as f64 - 4.0) / 4.0).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let mut carrier_can_score = 0.0;
    let mut pass_threats = 0usize;
    if let (Some(cpos), Some(c)) = (my_carrier, carrier) {
        if movement(c) + GO_FOR_IT >= distance_to_endzone(cpos.x, perspective) {
            carrier_can_score = 1.0;
        }
        pass_threats = mine
            .iter()
            .filter(|p| p.id != c.id)
            .filter(|p| square(p).chebyshev(cpos) <= PASS_RANGE)
            .filter(|p| movement(p) + GO_FOR_IT >= distance_to_endzone(square(p).x, perspective))
            .count();
    }

    let frenzied: Vec<_> = mine.iter().filter(|p| p.has_skill("Frenzy")).collect();
    let frenzy_traps = frenzied
        .iter()
        .filter(|p| theirs.iter().filter(|op| adjacent(p, op)).count() >= 2)
        .count();

    let screen = their_carrier.map_or(0, |c| {
        mine.iter()
            .filter(|p| match perspective {
                Side::Home => square(p).x < c.x,
                Side::Away => square(p).x > c.x,
            })
            .count()
    });

    let carrier_blitzable = my_carrier.is_some_and(|c| {
        theirs
            .iter()
            .any(|op| square(op).chebyshev(c) <= movement(op))
    });

    let surfable = theirs
        .iter()
        .filter(|op| on_sideline(square(op)))
        .filter(|op| {
            mine.iter()
                .any(|p| square(p).chebyshev(square(op)) <= movement(p))
        })
        .count();

    let favorable = favorable_blocks(mine, theirs);

    let one_turn_vulnerable = theirs.iter().any(|op| {
        movement(op) + GO_FOR_IT >= distance_to_endzone(square(op).x, opp)
            && !mine.iter().any(|p| adjacent(p, op))
    });

    let loose_ball = match ctx.state.ball.position {
        Some(ball) if ctx.ball.on_ground => {
            let closest = |team: &[&PlayerSnapshot]| {
                team.iter()
                    .map(|p| square(p).chebyshev(ball))
                    .min()
                    .unwrap_or(NOBODY_CLOSE)
            };
            (f64::from(closest(theirs) - closest(mine) + 5) / 10.0).clamp(0.0, 1.0)
        }
        _ => 0.5,
    };

    // Own players deeper than the deepest opponent, both measured from our end.
    let deep_safeties = theirs
        .iter()
        .map(|op| forward_x(square(op).x, perspective))
        .min()
        .map_or(0, |deepest| {
            mine.iter()
                .filter(|p| forward_x(square(p).x, perspective) < deepest)
                .count()
        });

    let isolated = mine
        .iter()
        .filter(|p| {
            !mine
                .iter()
                .filter(|other| other.id != p.id)
                .any(|other| square(other).chebyshev(square(p)) <= ISOLATION_RADIUS)
        })
        .count();

    f[CAGE_DIAGONAL_QUALITY] = cage_diagonal as f64 / 4.0;
    f[CAGE_OVERLOAD_RISK] = cage_overload;
    f[OPP_CAGE_DIAGONAL_QUALITY] = opp_cage_diagonal as f64 / 4.0;
    f[CARRIER_CAN_SCORE] = carrier_can_score;
    f[PASS_SCORING_THREAT] = (pass_threats as f64 / 3.0).min(1.0);
    f[FRENZY_TRAP_RISK] = ratio(frenzy_traps, frenzied.len());
    f[SCREEN_BETWEEN_BALL] = if ctx.ball.theirs {
        (screen as f64 / 5.0).min(1.0)
    } else {
        0.0
    };
    f[CARRIER_BLITZABLE] = if ctx.ball.mine && carrier_blitzable {
        1.0
    } else {
        0.0
    };
    f[SURFABLE_OPPONENTS] = (surfable as f64 / 3.0).min(1.0);
    f[FAVORABLE_BLOCKS] = ratio(favorable, mine.len()).min(1.0);
    f[ONE_TURN_TD_VULNERABILITY] = if one_turn_vulnerable { 1.0 } else { 0.0 };
    f[LOOSE_BALL_PROXIMITY] = loose_ball;
    f[DEEP_SAFETY_COUNT] = (deep_safeties as f64 / 3.0).min(1.0);
    f[ISOLATION_COUNT] = ratio(isolated, mine.len());
}
