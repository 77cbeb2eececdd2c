//! Per-epoch schedules: exploration, learning rate, and race split.

/// Exploration rate for `epoch` (1-based), interpolated linearly from
/// `start` at epoch 1 to `end` at the final epoch. A single-epoch run stays
/// at `start`.
pub fn epsilon_for(epoch: u32, epochs: u32, start: f64, end: f64) -> f64 {
    if epochs <= 1 {
        return start;
    }
    if epoch >= epochs {
        return end;
    }
    let t = f64::from(epoch.saturating_sub(1)) / f64::from(epochs - 1);
    start + (end - start) * t
}

/// `base · decay^(epoch-1)`.
pub fn decayed_lr(base: f64, decay: f64, epoch: u32) -> f64 {
    let exponent = i32::try_from(epoch.saturating_sub(1)).unwrap_or(i32::MAX);
    base * decay.powi(exponent)
}

/// Split `games` across `races` as evenly as possible. The first
/// `games % races` races take one extra game.
pub fn split_games(games: u32, races: usize) -> Vec<u32> {
    if races == 0 {
        return Vec::new();
    }
    let n = u32::try_from(races).unwrap_or(u32::MAX);
    let base = games / n;
    let remainder = games % n;
    (0..n).map(|i| base + u32::from(i < remainder)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsilon_endpoints() {
        assert_eq!(epsilon_for(1, 10, 0.3, 0.05), 0.3);
        assert_eq!(epsilon_for(10, 10, 0.3, 0.05), 0.05);
        assert_eq!(epsilon_for(3, 3, 0.4, 0.0), 0.0);
        let mid = epsilon_for(2, 3, 0.4, 0.0);
        assert!((mid - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_single_epoch_is_flat() {
        assert_eq!(epsilon_for(1, 1, 0.3, 0.05), 0.3);
    }

    #[test]
    fn test_lr_decay() {
        assert_eq!(decayed_lr(0.01, 0.5, 1), 0.01);
        assert!((decayed_lr(0.01, 0.5, 3) - 0.0025).abs() < 1e-15);
        assert_eq!(decayed_lr(0.02, 1.0, 40), 0.02);
    }

    #[test]
    fn test_split_remainder_goes_first() {
        assert_eq!(split_games(10, 3), vec![4, 3, 3]);
        assert_eq!(split_games(2, 4), vec![1, 1, 0, 0]);
        assert_eq!(split_games(9, 1), vec![9]);
        assert!(split_games(5, 0).is_empty());
    }
}
