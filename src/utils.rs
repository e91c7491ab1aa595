//! Numeric helpers: fixed-precision rounding and tie-aware argmax.

use rand::Rng;

use crate::TIEBREAK_EPS;

/// Decimal places kept on every generated reward.
pub const REWARD_DECIMALS: u32 = 4;

/// Decimal places kept on the expectation snapshot replicated over the batch phase.
pub const BATCH_EXPECTATION_DECIMALS: u32 = 2;

/// Decimal places kept on per-round expectation snapshots.
pub const ROUND_EXPECTATION_DECIMALS: u32 = 4;

/// Round `x` half away from zero to `decimals` places.
///
/// Non-finite inputs are returned unchanged. The result is idempotent:
/// `round_to(round_to(x, d), d) == round_to(x, d)`.
///
/// ```rust
/// use armsim::round_to;
///
/// assert_eq!(round_to(10.123_456, 4), 10.1235);
/// assert_eq!(round_to(-0.005, 2), -0.01);
/// ```
#[must_use]
pub fn round_to(x: f64, decimals: u32) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let scale = 10f64.powi(decimals as i32);
    let scaled = x * scale;
    if !scaled.is_finite() {
        // Already integral at this magnitude.
        return x;
    }
    scaled.round() / scale
}

/// Index of the largest score, breaking near-ties uniformly at random.
///
/// Scores within [`TIEBREAK_EPS`] of the maximum are treated as tied.
/// NaN scores never win. Returns `None` only for an empty slice.
pub fn argmax_random_tiebreak<R: Rng + ?Sized>(scores: &[f64], rng: &mut R) -> Option<usize> {
    let best = scores
        .iter()
        .copied()
        .filter(|s| !s.is_nan())
        .fold(f64::NEG_INFINITY, f64::max);
    let tied: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s == best || (s - best).abs() <= TIEBREAK_EPS)
        .map(|(i, _)| i)
        .collect();
    match tied.len() {
        0 => (!scores.is_empty()).then_some(0),
        1 => Some(tied[0]),
        n => Some(tied[rng.random_range(0..n)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn round_to_keeps_requested_precision() {
        assert_eq!(round_to(1.234_56, 4), 1.2346);
        assert_eq!(round_to(1.234_56, 2), 1.23);
        assert_eq!(round_to(7.0, 4), 7.0);
    }

    #[test]
    fn round_to_passes_non_finite_through() {
        assert!(round_to(f64::NAN, 4).is_nan());
        assert_eq!(round_to(f64::INFINITY, 2), f64::INFINITY);
    }

    #[test]
    fn round_to_does_not_overflow_huge_values() {
        assert_eq!(round_to(1e305, 4), 1e305);
        assert_eq!(round_to(-f64::MAX, 4), -f64::MAX);
    }

    #[test]
    fn argmax_picks_unique_maximum() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(argmax_random_tiebreak(&[0.1, 0.9, 0.3], &mut rng), Some(1));
    }

    #[test]
    fn argmax_empty_is_none() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(argmax_random_tiebreak(&[], &mut rng), None);
    }

    #[test]
    fn argmax_ignores_nan() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(argmax_random_tiebreak(&[f64::NAN, 0.2], &mut rng), Some(1));
        assert_eq!(argmax_random_tiebreak(&[f64::NAN], &mut rng), Some(0));
    }

    #[test]
    fn argmax_tiebreak_visits_every_tied_index() {
        let mut rng = StdRng::seed_from_u64(7);
        let scores = [1.0, 0.5, 1.0, 1.0];
        let mut seen = [false; 4];
        for _ in 0..200 {
            let i = argmax_random_tiebreak(&scores, &mut rng).unwrap();
            seen[i] = true;
        }
        assert_eq!(seen, [true, false, true, true]);
    }
}
