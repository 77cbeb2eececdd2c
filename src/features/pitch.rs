//! Pitch geometry relative to a viewing side.
//!
//! Home attacks toward x = 25, away attacks toward x = 0. Every helper here
//! folds that difference away so "forward" always means toward the
//! opponent's end zone.

use crate::core::{Position, Side};

/// Highest column index.
pub const MAX_X: i32 = 25;
/// Highest row index.
pub const MAX_Y: i32 = 14;
/// Pitch length used to normalize distances.
pub const LENGTH: f64 = 26.0;
/// Full squad size used to normalize player counts.
pub const SQUAD: f64 = 11.0;

/// Column measured from the viewer's own end zone.
#[must_use]
pub fn forward_x(x: i32, side: Side) -> i32 {
    match side {
        Side::Home => x,
        Side::Away => MAX_X - x,
    }
}

/// Squares left to the end zone `side` is attacking.
#[must_use]
pub fn distance_to_endzone(x: i32, side: Side) -> i32 {
    match side {
        Side::Home => MAX_X - x,
        Side::Away => x,
    }
}

#[must_use]
pub fn in_own_half(x: i32, side: Side) -> bool {
    match side {
        Side::Home => x <= 12,
        Side::Away => x >= 13,
    }
}

#[must_use]
pub fn on_sideline(pos: Position) -> bool {
    pos.y == 0 || pos.y == MAX_Y
}

#[must_use]
pub fn in_bounds(x: i32, y: i32) -> bool {
    (0..=MAX_X).contains(&x) && (0..=MAX_Y).contains(&y)
}

/// `numerator / denominator`, or 0.0 when the denominator is zero.
#[must_use]
pub fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_is_mirrored() {
        assert_eq!(forward_x(3, Side::Home), 3);
        assert_eq!(forward_x(3, Side::Away), 22);
        for x in 0..=MAX_X {
            assert_eq!(
                distance_to_endzone(x, Side::Home),
                distance_to_endzone(MAX_X - x, Side::Away)
            );
        }
    }

    #[test]
    fn test_halves_partition_the_pitch() {
        for x in 0..=MAX_X {
            assert_ne!(in_own_half(x, Side::Home), in_own_half(x, Side::Away));
        }
    }

    #[test]
    fn test_ratio_zero_denominator() {
        assert_eq!(ratio(3, 0), 0.0);
        assert_eq!(ratio(1, 4), 0.25);
    }

    #[test]
    fn test_bounds() {
        assert!(in_bounds(0, 0));
        assert!(in_bounds(25, 14));
        assert!(!in_bounds(-1, 3));
        assert!(!in_bounds(26, 3));
        assert!(!in_bounds(4, 15));
    }
}
