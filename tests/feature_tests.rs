//! Integration tests for the feature encoder.
//!
//! The golden fixtures were produced by the engine's own encoder; this crate
//! must reproduce them.

use proptest::prelude::*;
use serde::Deserialize;

use pitch_learn::core::{
    BallSnapshot, GameSnapshot, PlayerSnapshot, PlayerStats, PlayerStatus, Position, Side,
    TeamSnapshot, Weather,
};
use pitch_learn::features::layout::{self, MIRRORED_PAIRS};
use pitch_learn::features::{encode, FeatureEncoder, NUM_FEATURES};

const TOLERANCE: f64 = 1e-9;

#[derive(Deserialize)]
struct GoldenCase {
    name: String,
    perspective: Side,
    state: GameSnapshot,
    features: Vec<f64>,
}

fn golden_cases() -> Vec<GoldenCase> {
    let text = include_str!("fixtures/golden_features.json");
    serde_json::from_str(text).unwrap()
}

fn case<'a>(cases: &'a [GoldenCase], name: &str) -> &'a GoldenCase {
    cases.iter().find(|c| c.name == name).unwrap()
}

// =============================================================================
// Golden Parity
// =============================================================================

#[test]
fn test_golden_fixtures_match() {
    let cases = golden_cases();
    assert!(!cases.is_empty());

    for case in &cases {
        let encoded = encode(&case.state, case.perspective);
        assert_eq!(case.features.len(), NUM_FEATURES, "{}", case.name);
        for (i, (got, want)) in encoded.iter().zip(&case.features).enumerate() {
            assert!(
                (got - want).abs() < TOLERANCE,
                "{} feature {i}: got {got}, want {want}",
                case.name
            );
        }
    }
}

#[test]
fn test_encoder_struct_matches_free_function() {
    let encoder = FeatureEncoder::new();
    assert_eq!(encoder.output_len(), NUM_FEATURES);
    for case in golden_cases() {
        assert_eq!(
            encoder.encode(&case.state, case.perspective),
            encode(&case.state, case.perspective)
        );
    }
}

// =============================================================================
// Perspective Symmetry
// =============================================================================

#[test]
fn test_mirrored_pairs_swap_with_perspective() {
    let cases = golden_cases();
    for home in cases.iter().filter(|c| c.name.ends_with("_home") && c.perspective == Side::Home) {
        let stem = home.name.strip_suffix("_home").unwrap();
        let away = case(&cases, &format!("{stem}_away"));

        let h = encode(&home.state, Side::Home);
        let a = encode(&away.state, Side::Away);
        for (mine, theirs) in MIRRORED_PAIRS {
            assert!((h[mine] - a[theirs]).abs() < TOLERANCE, "{stem}: {mine}/{theirs}");
            assert!((h[theirs] - a[mine]).abs() < TOLERANCE, "{stem}: {theirs}/{mine}");
        }
        assert!((h[layout::SCORE_DIFF] + a[layout::SCORE_DIFF]).abs() < TOLERANCE);
        assert_eq!(h[layout::BIAS], a[layout::BIAS]);
    }
}

#[test]
fn test_forward_position_flips_with_perspective() {
    // Home's average x seen by home, plus home's average x seen by away as
    // the opponent, spans the pitch.
    let cases = golden_cases();
    for home in cases.iter().filter(|c| c.name.ends_with("_home") && c.perspective == Side::Home) {
        let stem = home.name.strip_suffix("_home").unwrap();
        let away = case(&cases, &format!("{stem}_away"));
        let h = encode(&home.state, Side::Home);
        let a = encode(&away.state, Side::Away);
        assert!(
            (h[layout::MY_AVG_X] + a[layout::OPP_AVG_X] - 25.0 / 26.0).abs() < 1e-9,
            "{stem}"
        );
    }
}

// =============================================================================
// Structural Invariants
// =============================================================================

#[test]
fn test_empty_snapshot_from_json() {
    let state: GameSnapshot = serde_json::from_str("{}").unwrap();
    for side in [Side::Home, Side::Away] {
        let f = encode(&state, side);
        assert_eq!(f[layout::BIAS], 1.0);
        assert!(f.iter().all(|v| v.is_finite()));
    }
}

#[test]
fn test_unknown_states_and_weather_tolerated() {
    let json = r#"{
        "weather": "sweltering_heat",
        "players": [
            {"id": 1, "teamSide": "home", "state": "reserve"},
            {"id": 2, "teamSide": "away", "state": "standing", "position": {"x": 3, "y": 7}}
        ],
        "ball": {"position": {"x": 3, "y": 7}, "isHeld": true, "carrierId": 2}
    }"#;
    let state: GameSnapshot = serde_json::from_str(json).unwrap();
    assert_eq!(state.weather, Weather::Other);
    assert_eq!(state.players[0].state, PlayerStatus::Other);

    let f = encode(&state, Side::Home);
    assert_eq!(f[layout::OPP_HAS_BALL], 1.0);
    assert_eq!(f[layout::WEATHER_NICE], 0.0);
    assert_eq!(f[layout::WEATHER_RAIN], 0.0);
    assert_eq!(f[layout::WEATHER_BLIZZARD], 0.0);
}

const STATUSES: [PlayerStatus; 7] = [
    PlayerStatus::Standing,
    PlayerStatus::Prone,
    PlayerStatus::Stunned,
    PlayerStatus::Ko,
    PlayerStatus::Injured,
    PlayerStatus::Dead,
    PlayerStatus::Other,
];

const SKILLS: [&str; 8] = [
    "Block",
    "Dodge",
    "Guard",
    "Mighty Blow",
    "Claw",
    "Regeneration",
    "Frenzy",
    "Sure Hands",
];

fn player_strategy() -> impl Strategy<Value = PlayerSnapshot> {
    (
        any::<bool>(),
        0..STATUSES.len(),
        0..26i32,
        0..15i32,
        (1..10i32, 1..7i32, 1..6i32, 5..11i32),
        prop::collection::vec(0..SKILLS.len(), 0..3),
    )
        .prop_map(|(home, status, x, y, (ma, st, ag, av), skills)| {
            let state = STATUSES[status];
            PlayerSnapshot {
                id: 0,
                team_side: Some(if home { Side::Home } else { Side::Away }),
                state,
                position: state.is_on_pitch().then_some(Position::new(x, y)),
                stats: PlayerStats {
                    movement: ma,
                    strength: st,
                    agility: ag,
                    armour: av,
                },
                skills: skills.into_iter().map(|i| SKILLS[i].to_string()).collect(),
            }
        })
}

fn snapshot_strategy() -> impl Strategy<Value = GameSnapshot> {
    (
        prop::collection::vec(player_strategy(), 0..22),
        1..3i32,
        (0..5i32, 0..5i32, 0..4i32, 0..4i32, 1..9i32),
        any::<bool>(),
        any::<prop::sample::Index>(),
        0..3usize,
    )
        .prop_map(|(mut players, half, (hs, aws, hr, ar, turn), home_active, carrier, weather)| {
            for (i, p) in players.iter_mut().enumerate() {
                p.id = i as i64 + 1;
            }
            let standing: Vec<&PlayerSnapshot> = players
                .iter()
                .filter(|p| p.state == PlayerStatus::Standing)
                .collect();
            let ball = if standing.is_empty() {
                BallSnapshot {
                    position: Some(Position::new(13, 7)),
                    is_held: false,
                    carrier_id: None,
                }
            } else {
                let holder = standing[carrier.index(standing.len())];
                BallSnapshot {
                    position: holder.position,
                    is_held: true,
                    carrier_id: Some(holder.id),
                }
            };
            let team = |score, rerolls| TeamSnapshot {
                score,
                rerolls,
                turn_number: turn,
                blitz_used_this_turn: false,
                pass_used_this_turn: false,
            };
            GameSnapshot {
                half,
                active_team: Some(if home_active { Side::Home } else { Side::Away }),
                kicking_team: Some(Side::Away),
                weather: [Weather::Nice, Weather::PouringRain, Weather::Blizzard][weather],
                home_team: team(hs, hr),
                away_team: team(aws, ar),
                players,
                ball,
            }
        })
}

proptest! {
    #[test]
    fn prop_bias_and_finite(state in snapshot_strategy()) {
        for side in [Side::Home, Side::Away] {
            let f = encode(&state, side);
            prop_assert_eq!(f.len(), NUM_FEATURES);
            prop_assert_eq!(f[layout::BIAS], 1.0);
            prop_assert!(f.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn prop_perspective_swaps_mirrored_pairs(state in snapshot_strategy()) {
        let h = encode(&state, Side::Home);
        let a = encode(&state, Side::Away);
        for (mine, theirs) in MIRRORED_PAIRS {
            prop_assert!((h[mine] - a[theirs]).abs() < TOLERANCE);
        }
        prop_assert!((h[layout::SCORE_DIFF] + a[layout::SCORE_DIFF]).abs() < TOLERANCE);
    }

    #[test]
    fn prop_possession_is_exclusive(state in snapshot_strategy()) {
        let f = encode(&state, Side::Home);
        let flags = f[layout::I_HAVE_BALL] + f[layout::OPP_HAS_BALL] + f[layout::BALL_ON_GROUND];
        prop_assert!(flags <= 1.0);
    }
}
