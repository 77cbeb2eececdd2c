//! Feature vector layout.
//!
//! Indices are part of the persisted weight format: a weight file trained
//! against this layout is only meaningful if every index keeps its meaning.
//! New features are appended, never inserted.

/// Length of every state feature vector.
pub const NUM_FEATURES: usize = 70;

/// Length of the per-candidate action feature vector fed to the policy.
pub const NUM_ACTION_FEATURES: usize = 15;

/// Policy input: state features followed by action features.
pub const POLICY_INPUT_SIZE: usize = NUM_FEATURES + NUM_ACTION_FEATURES;

// Scoreboard and turn progress
pub const SCORE_DIFF: usize = 0;
pub const MY_SCORE: usize = 1;
pub const OPP_SCORE: usize = 2;
pub const TURN_PROGRESS: usize = 3;
pub const MY_STANDING: usize = 4;
pub const OPP_STANDING: usize = 5;
pub const MY_KO: usize = 6;
pub const OPP_KO: usize = 7;
pub const MY_CASUALTIES: usize = 8;
pub const OPP_CASUALTIES: usize = 9;
pub const MY_REROLLS: usize = 10;
pub const OPP_REROLLS: usize = 11;

// Ball possession
pub const I_HAVE_BALL: usize = 12;
pub const OPP_HAS_BALL: usize = 13;
pub const BALL_ON_GROUND: usize = 14;
pub const CARRIER_DIST_TO_TD: usize = 15;
pub const BALL_IN_MY_HALF: usize = 16;

// Team composition
pub const MY_AVG_X: usize = 17;
pub const OPP_AVG_X: usize = 18;
pub const MY_AVG_STRENGTH: usize = 19;
pub const OPP_AVG_STRENGTH: usize = 20;
pub const MY_CAGE_COUNT: usize = 21;

// Turn context
pub const IS_RECEIVING: usize = 22;
pub const IS_MY_TURN: usize = 23;
pub const WEATHER_NICE: usize = 24;
pub const WEATHER_RAIN: usize = 25;
pub const WEATHER_BLIZZARD: usize = 26;
pub const MY_BLITZ_AVAILABLE: usize = 27;
pub const MY_PASS_AVAILABLE: usize = 28;

/// Constant 1.0 in every encoded vector.
pub const BIAS: usize = 29;

// Field-position risk
pub const MY_SIDELINE_FRACTION: usize = 30;
pub const OPP_SIDELINE_FRACTION: usize = 31;
pub const TURNS_REMAINING: usize = 32;
pub const SCORE_ADVANTAGE_WITH_BALL: usize = 33;
pub const CARRIER_NEAR_ENDZONE: usize = 34;
pub const STALL_INCENTIVE: usize = 35;
pub const MY_AVG_ARMOUR: usize = 36;
pub const OPP_AVG_ARMOUR: usize = 37;
pub const MY_AVG_AGILITY: usize = 38;
pub const OPP_AVG_AGILITY: usize = 39;

// Engagement and skill density
pub const CARRIER_TZ_COUNT: usize = 40;
pub const SCORING_THREAT: usize = 41;
pub const OPP_SCORING_THREAT: usize = 42;
pub const MY_ENGAGED_FRACTION: usize = 43;
pub const OPP_ENGAGED_FRACTION: usize = 44;
pub const MY_DOWN: usize = 45;
pub const OPP_DOWN: usize = 46;
pub const MY_FREE_PLAYERS: usize = 47;
pub const MY_BLOCK_DENSITY: usize = 48;
pub const OPP_BLOCK_DENSITY: usize = 49;
pub const MY_DODGE_DENSITY: usize = 50;
pub const OPP_DODGE_DENSITY: usize = 51;
pub const MY_GUARD_DENSITY: usize = 52;
pub const MY_MIGHTY_BLOW_DENSITY: usize = 53;
pub const MY_CLAW_DENSITY: usize = 54;
pub const MY_REGENERATION_DENSITY: usize = 55;

// Strategic patterns
pub const CAGE_DIAGONAL_QUALITY: usize = 56;
pub const CAGE_OVERLOAD_RISK: usize = 57;
pub const OPP_CAGE_DIAGONAL_QUALITY: usize = 58;
pub const CARRIER_CAN_SCORE: usize = 59;
pub const PASS_SCORING_THREAT: usize = 60;
pub const FRENZY_TRAP_RISK: usize = 61;
pub const SCREEN_BETWEEN_BALL: usize = 62;
pub const CARRIER_BLITZABLE: usize = 63;
pub const SURFABLE_OPPONENTS: usize = 64;
pub const FAVORABLE_BLOCKS: usize = 65;
pub const ONE_TURN_TD_VULNERABILITY: usize = 66;
pub const LOOSE_BALL_PROXIMITY: usize = 67;
pub const DEEP_SAFETY_COUNT: usize = 68;
pub const ISOLATION_COUNT: usize = 69;

/// Pairs of indices whose meaning swaps when the perspective flips.
pub const MIRRORED_PAIRS: [(usize, usize); 15] = [
    (MY_SCORE, OPP_SCORE),
    (MY_STANDING, OPP_STANDING),
    (MY_KO, OPP_KO),
    (MY_CASUALTIES, OPP_CASUALTIES),
    (MY_REROLLS, OPP_REROLLS),
    (I_HAVE_BALL, OPP_HAS_BALL),
    (MY_AVG_STRENGTH, OPP_AVG_STRENGTH),
    (MY_SIDELINE_FRACTION, OPP_SIDELINE_FRACTION),
    (MY_AVG_ARMOUR, OPP_AVG_ARMOUR),
    (MY_AVG_AGILITY, OPP_AVG_AGILITY),
    (SCORING_THREAT, OPP_SCORING_THREAT),
    (MY_ENGAGED_FRACTION, OPP_ENGAGED_FRACTION),
    (MY_DOWN, OPP_DOWN),
    (MY_BLOCK_DENSITY, OPP_BLOCK_DENSITY),
    (MY_DODGE_DENSITY, OPP_DODGE_DENSITY),
];
