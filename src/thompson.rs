//! Thompson sampling over binarized rewards.
//!
//! Each arm carries a Beta posterior over its success rate. Continuous rewards
//! are first mapped to `{0, 1}` by the configured [`Binarizer`]; the posterior
//! then moves by one pseudo-count per observation.
//!
//! Notes:
//! - Selection samples every posterior and takes the max (random tie-break).
//! - The reported expectation is the posterior mean, so reading it never
//!   consumes randomness.

use rand::rngs::StdRng;
use rand_distr::{Beta, Distribution};

use crate::binarize::Binarizer;
use crate::policy::ArmPolicy;
use crate::utils::argmax_random_tiebreak;

/// Beta posterior state for one arm.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BetaStats {
    pub alpha: f64,
    pub beta: f64,
    pub uses: u64,
}

impl Default for BetaStats {
    /// Uniform `Beta(1, 1)` prior.
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
            uses: 0,
        }
    }
}

impl BetaStats {
    pub fn expected_value(&self) -> f64 {
        let denom = self.alpha + self.beta;
        if denom <= 0.0 {
            0.5
        } else {
            self.alpha / denom
        }
    }

    fn push(&mut self, success: u8) {
        if success == 1 {
            self.alpha += 1.0;
        } else {
            self.beta += 1.0;
        }
        self.uses = self.uses.saturating_add(1);
    }
}

#[derive(Debug, Clone)]
pub struct ThompsonSampling {
    binarizer: Binarizer,
    arms: Vec<String>,
    stats: Vec<BetaStats>,
}

impl ThompsonSampling {
    pub fn new(arms: &[String], binarizer: Binarizer) -> Self {
        Self {
            binarizer,
            arms: arms.to_vec(),
            stats: vec![BetaStats::default(); arms.len()],
        }
    }

    pub fn binarizer(&self) -> &Binarizer {
        &self.binarizer
    }

    /// Per-arm posteriors, aligned with arm order.
    pub fn stats(&self) -> &[BetaStats] {
        &self.stats
    }

    fn sample_beta(s: BetaStats, rng: &mut StdRng) -> f64 {
        match Beta::new(s.alpha, s.beta) {
            Ok(dist) => dist.sample(rng),
            Err(_) => s.expected_value(),
        }
    }
}

impl ArmPolicy for ThompsonSampling {
    fn update(&mut self, arm: usize, reward: f64) {
        let success = self.binarizer.binarize(&self.arms[arm], reward);
        self.stats[arm].push(success);
    }

    fn choose(&self, rng: &mut StdRng) -> usize {
        let samples: Vec<f64> = self
            .stats
            .iter()
            .map(|&s| Self::sample_beta(s, rng))
            .collect();
        argmax_random_tiebreak(&samples, rng).unwrap_or(0)
    }

    fn expectation(&self, arm: usize) -> f64 {
        self.stats[arm].expected_value()
    }
}
