//! Reward binarization for Bernoulli-style policies.
//!
//! Thompson sampling consumes success/failure signals. A continuous reward maps
//! to `1` when it is strictly greater than the arm's threshold and to `0`
//! otherwise, so a reward exactly at the threshold counts as a failure. The same
//! [`Binarizer`] is applied to the batch fit and to every later observation.

use std::collections::BTreeMap;

/// Threshold used for every arm unless overridden.
pub const DEFAULT_BINARY_THRESHOLD: f64 = 0.5;

/// Pure per-arm threshold function `(arm_id, reward) -> {0, 1}`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Binarizer {
    /// Threshold for arms without an override.
    pub threshold: f64,
    /// Per-arm overrides.
    #[cfg_attr(feature = "serde", serde(default))]
    pub per_arm: BTreeMap<String, f64>,
}

impl Default for Binarizer {
    fn default() -> Self {
        Self::with_threshold(DEFAULT_BINARY_THRESHOLD)
    }
}

impl Binarizer {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            per_arm: BTreeMap::new(),
        }
    }

    /// Override the threshold for one arm.
    pub fn with_arm_threshold(mut self, arm: impl Into<String>, threshold: f64) -> Self {
        self.per_arm.insert(arm.into(), threshold);
        self
    }

    pub fn threshold_for(&self, arm: &str) -> f64 {
        self.per_arm.get(arm).copied().unwrap_or(self.threshold)
    }

    #[must_use]
    pub fn binarize(&self, arm: &str, reward: f64) -> u8 {
        u8::from(reward > self.threshold_for(arm))
    }

    /// Binarize a whole reward stream for one arm.
    pub fn binarize_all(&self, arm: &str, rewards: &[f64]) -> Vec<u8> {
        rewards.iter().map(|&r| self.binarize(arm, r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_maps_to_failure() {
        let b = Binarizer::default();
        assert_eq!(b.binarize_all("a", &[0.2, 0.5, 0.51, 0.8]), vec![0, 0, 1, 1]);
    }

    #[test]
    fn per_arm_override_applies_only_to_that_arm() {
        let b = Binarizer::default().with_arm_threshold("hi", 10.0);
        assert_eq!(b.binarize("hi", 9.0), 0);
        assert_eq!(b.binarize("lo", 9.0), 1);
    }

    #[test]
    fn nan_reward_is_failure() {
        assert_eq!(Binarizer::default().binarize("a", f64::NAN), 0);
    }
}
