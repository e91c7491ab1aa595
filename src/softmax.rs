//! Softmax (Boltzmann) exploration over mean rewards.
//!
//! The reported expectation of an arm is its current selection probability,
//! the same quantity the policy samples from.

use rand::rngs::StdRng;

use crate::alloc::{sample_index, softmax};
use crate::policy::ArmPolicy;
use crate::stats::{means, ArmStats};

/// Default temperature.
pub const DEFAULT_TAU: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct Softmax {
    tau: f64,
    stats: Vec<ArmStats>,
    probs: Vec<f64>,
}

impl Softmax {
    pub fn new(n_arms: usize, tau: f64) -> Self {
        let stats = vec![ArmStats::default(); n_arms];
        let probs = softmax(&means(&stats), tau);
        Self { tau, stats, probs }
    }

    /// Current selection probabilities, aligned with arm order.
    pub fn probabilities(&self) -> &[f64] {
        &self.probs
    }
}

impl ArmPolicy for Softmax {
    fn update(&mut self, arm: usize, reward: f64) {
        self.stats[arm].push(reward);
        self.probs = softmax(&means(&self.stats), self.tau);
    }

    fn choose(&self, rng: &mut StdRng) -> usize {
        sample_index(&self.probs, rng).unwrap_or(0)
    }

    fn expectation(&self, arm: usize) -> f64 {
        self.probs[arm]
    }
}
