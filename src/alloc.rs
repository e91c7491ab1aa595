//! Allocation helpers: softmax probabilities and sampling from them.
//!
//! Scores and probabilities are aligned to arm indices so policies can keep
//! their state in plain vectors.

use rand::Rng;

/// Compute a stable softmax distribution over `scores`.
///
/// - `temperature` controls sharpness; non-finite or non-positive values fall back to `1.0`.
/// - Uses the max-trick for numerical stability.
/// - Returns a distribution that sums to 1 (or empty if input is empty).
pub fn softmax(scores: &[f64], temperature: f64) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }
    let t = if temperature.is_finite() && temperature > 0.0 {
        temperature
    } else {
        1.0
    };

    let max_score = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut out: Vec<f64> = scores.iter().map(|&v| ((v - max_score) / t).exp()).collect();
    let denom: f64 = out.iter().sum();
    if denom <= 0.0 || !denom.is_finite() {
        // Degenerate fallback: uniform.
        let n = scores.len() as f64;
        return vec![1.0 / n; scores.len()];
    }
    for v in &mut out {
        *v /= denom;
    }
    out
}

/// Draw an index from a probability vector by inverse CDF.
///
/// Falls back to the last index when rounding leaves the CDF short of 1.
pub fn sample_index<R: Rng + ?Sized>(probs: &[f64], rng: &mut R) -> Option<usize> {
    if probs.is_empty() {
        return None;
    }
    let r: f64 = rng.random();
    let mut cdf = 0.0;
    for (i, p) in probs.iter().enumerate() {
        cdf += *p;
        if r < cdf {
            return Some(i);
        }
    }
    Some(probs.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn softmax_sums_to_one() {
        let p = softmax(&[0.0, 1.0, -2.0], 1.0);
        let s: f64 = p.iter().sum();
        assert!((s - 1.0).abs() < 1e-9, "sum={}", s);
    }

    #[test]
    fn low_temperature_concentrates_on_max() {
        let p = softmax(&[0.0, 1.0], 0.01);
        assert!(p[1] > 0.999);
    }

    #[test]
    fn sample_index_respects_point_mass() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            assert_eq!(sample_index(&[0.0, 1.0, 0.0], &mut rng), Some(1));
        }
        assert_eq!(sample_index(&[], &mut rng), None);
    }

    proptest! {
        #[test]
        fn softmax_is_a_distribution(
            scores in proptest::collection::vec(-1.0e6f64..1.0e6f64, 0..20),
            temperature in prop_oneof![Just(f64::NAN), Just(0.0), Just(-1.0), 1.0e-6f64..1.0e6f64],
        ) {
            let p = softmax(&scores, temperature);
            prop_assert_eq!(&p, &softmax(&scores, temperature));
            prop_assert_eq!(p.len(), scores.len());
            if !scores.is_empty() {
                let sum: f64 = p.iter().sum();
                prop_assert!((sum - 1.0).abs() < 1e-9, "sum={}", sum);
                for &v in &p {
                    prop_assert!(v.is_finite());
                    prop_assert!((0.0..=1.0).contains(&v));
                }
            }
        }
    }
}
