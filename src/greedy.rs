//! Epsilon-greedy: explore uniformly with probability epsilon, else exploit the best mean.

use rand::rngs::StdRng;
use rand::Rng;

use crate::policy::ArmPolicy;
use crate::stats::{means, ArmStats};
use crate::utils::argmax_random_tiebreak;

/// Default exploration probability.
pub const DEFAULT_EPSILON: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    epsilon: f64,
    stats: Vec<ArmStats>,
}

impl EpsilonGreedy {
    pub fn new(n_arms: usize, epsilon: f64) -> Self {
        Self {
            epsilon,
            stats: vec![ArmStats::default(); n_arms],
        }
    }

    pub fn stats(&self) -> &[ArmStats] {
        &self.stats
    }
}

impl ArmPolicy for EpsilonGreedy {
    fn update(&mut self, arm: usize, reward: f64) {
        self.stats[arm].push(reward);
    }

    fn choose(&self, rng: &mut StdRng) -> usize {
        if rng.random::<f64>() < self.epsilon {
            return rng.random_range(0..self.stats.len());
        }
        argmax_random_tiebreak(&means(&self.stats), rng).unwrap_or(0)
    }

    fn expectation(&self, arm: usize) -> f64 {
        self.stats[arm].mean()
    }
}
