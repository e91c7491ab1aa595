//! UCB1: optimism in the face of uncertainty.
//!
//! Score of a tried arm: `mean + alpha * sqrt(2 ln(total_pulls) / pulls)`.
//! Untried arms are chosen first, in configured order.

use rand::rngs::StdRng;

use crate::policy::ArmPolicy;
use crate::stats::ArmStats;
use crate::utils::argmax_random_tiebreak;

/// Default exploration weight.
pub const DEFAULT_ALPHA: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct Ucb1 {
    alpha: f64,
    stats: Vec<ArmStats>,
}

impl Ucb1 {
    pub fn new(n_arms: usize, alpha: f64) -> Self {
        Self {
            alpha,
            stats: vec![ArmStats::default(); n_arms],
        }
    }

    fn total_pulls(&self) -> u64 {
        self.stats.iter().map(|s| s.pulls).sum()
    }

    /// Upper confidence bound of `arm`; `None` while the arm is untried.
    pub fn upper_bound(&self, arm: usize) -> Option<f64> {
        let s = self.stats[arm];
        if s.pulls == 0 {
            return None;
        }
        let total = self.total_pulls() as f64;
        let bonus = (2.0 * total.ln() / s.pulls as f64).sqrt();
        Some(s.mean() + self.alpha * bonus)
    }
}

impl ArmPolicy for Ucb1 {
    fn update(&mut self, arm: usize, reward: f64) {
        self.stats[arm].push(reward);
    }

    fn choose(&self, rng: &mut StdRng) -> usize {
        if let Some(untried) = self.stats.iter().position(|s| s.pulls == 0) {
            return untried;
        }
        let scores: Vec<f64> = (0..self.stats.len())
            .map(|i| self.upper_bound(i).unwrap_or(f64::INFINITY))
            .collect();
        argmax_random_tiebreak(&scores, rng).unwrap_or(0)
    }

    fn expectation(&self, arm: usize) -> f64 {
        self.upper_bound(arm).unwrap_or(0.0)
    }
}
