//! Static equal-allocation ("A/B test") baseline and bandit comparison.
//!
//! The A/B baseline pulls every arm the same number of times. [`Comparison`]
//! spends the same total budget (`trials_per_arm * n_arms` pulls) on a bandit
//! simulation, split into an exploration batch and policy-driven rounds, so
//! the two allocations can be compared on collected reward.

use rand::Rng;
use std::collections::BTreeMap;
use tracing::info;

use crate::reward::RewardSource;
use crate::simulation::{Simulation, SimulationConfig};
use crate::{Error, LedgerSnapshot, Result};

/// Salt mixed into the reward seed for the baseline's independent stream.
const AB_SEED_SALT: u64 = 0xAB7E_57AB;

/// Equal-allocation rewards for every arm.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbBaseline {
    pub trials_per_arm: usize,
    /// Raw rewards per arm, in pull order.
    pub rewards: BTreeMap<String, Vec<f64>>,
    /// Running reward sums per arm.
    pub rewards_cumulative: BTreeMap<String, Vec<f64>>,
    /// Running trial counts per arm (`1..=trials_per_arm`).
    pub trials_cumulative: BTreeMap<String, Vec<u64>>,
}

impl AbBaseline {
    /// Pull every arm of `source` exactly `trials_per_arm` times.
    pub fn generate<R: Rng>(source: &mut RewardSource<R>, trials_per_arm: usize) -> Result<Self> {
        let mut out = Self {
            trials_per_arm,
            rewards: BTreeMap::new(),
            rewards_cumulative: BTreeMap::new(),
            trials_cumulative: BTreeMap::new(),
        };
        for arm in source.arm_ids().to_vec() {
            let rewards = source.sample_n(&arm, trials_per_arm)?;
            let cumulative = rewards
                .iter()
                .scan(0.0, |acc, &r| {
                    *acc += r;
                    Some(*acc)
                })
                .collect();
            out.trials_cumulative
                .insert(arm.clone(), (1..=trials_per_arm as u64).collect());
            out.rewards_cumulative.insert(arm.clone(), cumulative);
            out.rewards.insert(arm, rewards);
        }
        Ok(out)
    }

    /// Sum of all rewards over all arms.
    pub fn total_reward(&self) -> f64 {
        self.rewards_cumulative
            .values()
            .filter_map(|c| c.last())
            .sum()
    }

    pub fn total_trials(&self) -> usize {
        self.trials_per_arm * self.rewards.len()
    }
}

/// Budget and split for a baseline-vs-bandit comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonConfig {
    pub simulation: SimulationConfig,
    /// Pulls per arm in the baseline.
    pub trials_per_arm: usize,
    /// Fraction of the bandit budget spent on the uniform exploration batch, in `(0, 1)`.
    pub exploration_share: f64,
}

impl ComparisonConfig {
    pub fn new(simulation: SimulationConfig, trials_per_arm: usize) -> Self {
        Self {
            simulation,
            trials_per_arm,
            exploration_share: 0.3,
        }
    }

    pub fn with_exploration_share(mut self, share: f64) -> Self {
        self.exploration_share = share;
        self
    }

    /// Total bandit rounds: the baseline's total pull count.
    pub fn total_rounds(&self) -> usize {
        self.trials_per_arm * self.simulation.arms.len()
    }

    /// Exploration batch size: `floor(total_rounds * exploration_share)`.
    pub fn explore_rounds(&self) -> usize {
        (self.total_rounds() as f64 * self.exploration_share).floor() as usize
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.exploration_share > 0.0 && self.exploration_share < 1.0) {
            return Err(Error::invalid_param(
                "exploration_share",
                format!("{} not in (0, 1)", self.exploration_share),
            ));
        }
        if self.trials_per_arm == 0 {
            return Err(Error::invalid_param("trials_per_arm", "must be > 0"));
        }
        Ok(())
    }
}

/// Outcome of one baseline-vs-bandit comparison.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub ab: AbBaseline,
    pub bandit: LedgerSnapshot,
    pub bandit_expectations: BTreeMap<String, Vec<f64>>,
    pub explore_rounds: usize,
    pub exploit_rounds: usize,
}

impl Comparison {
    /// Run the baseline and the bandit, each on its own reward stream.
    pub fn run(cfg: &ComparisonConfig) -> Result<Self> {
        cfg.validate()?;
        let sim_cfg = &cfg.simulation;

        let mut ab_source =
            RewardSource::with_seed(sim_cfg.arms.clone(), sim_cfg.reward_seed ^ AB_SEED_SALT);
        let ab = AbBaseline::generate(&mut ab_source, cfg.trials_per_arm)?;

        let explore_rounds = cfg.explore_rounds();
        let exploit_rounds = cfg.total_rounds() - explore_rounds;
        let mut sim = Simulation::new(sim_cfg)?;
        sim.fit(explore_rounds)?;
        sim.run(exploit_rounds)?;

        let out = Self {
            ab,
            bandit: sim.ledger().snapshot(),
            bandit_expectations: sim.expectation_history().to_map(),
            explore_rounds,
            exploit_rounds,
        };
        info!(
            ab_total = out.ab.total_reward(),
            bandit_total = out.bandit_total_reward(),
            explore_rounds,
            exploit_rounds,
            "compared equal allocation against bandit"
        );
        Ok(out)
    }

    pub fn bandit_total_reward(&self) -> f64 {
        self.bandit.arms.values().map(|s| s.total_reward()).sum()
    }

    /// Bandit total reward minus baseline total reward.
    pub fn uplift(&self) -> f64 {
        self.bandit_total_reward() - self.ab.total_reward()
    }

    /// Pull counts per arm: `(baseline, bandit)`.
    pub fn pulls_per_arm(&self) -> BTreeMap<String, (u64, u64)> {
        self.bandit
            .arms
            .iter()
            .map(|(arm, s)| (arm.clone(), (self.ab.trials_per_arm as u64, s.total_pulls())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArmConfig, ArmSet, PolicyConfig};

    fn arms() -> ArmSet {
        ArmSet::new(vec![
            ("superstar".to_string(), ArmConfig::gaussian(0.7, 0.05).unwrap()),
            ("old_navy".to_string(), ArmConfig::gaussian(0.65, 0.02).unwrap()),
            ("ugly_duck".to_string(), ArmConfig::uniform(0.60, 0.75).unwrap()),
        ])
        .unwrap()
    }

    #[test]
    fn baseline_allocates_equally() {
        let mut src = RewardSource::with_seed(arms(), 1);
        let ab = AbBaseline::generate(&mut src, 25).unwrap();
        assert_eq!(ab.total_trials(), 75);
        for arm in ["superstar", "old_navy", "ugly_duck"] {
            assert_eq!(ab.rewards[arm].len(), 25);
            assert_eq!(ab.trials_cumulative[arm].last(), Some(&25));
            let sum: f64 = ab.rewards[arm].iter().sum();
            let last = *ab.rewards_cumulative[arm].last().unwrap();
            assert!((sum - last).abs() < 1e-9);
        }
    }

    #[test]
    fn comparison_spends_the_same_budget() {
        let sim = SimulationConfig::new(arms(), PolicyConfig::epsilon_greedy(0.1));
        let cfg = ComparisonConfig::new(sim, 100).with_exploration_share(0.3);
        let cmp = Comparison::run(&cfg).unwrap();
        assert_eq!(cmp.explore_rounds, 90);
        assert_eq!(cmp.exploit_rounds, 210);
        assert_eq!(cmp.bandit.rounds, 300);
        let bandit_pulls: u64 = cmp.pulls_per_arm().values().map(|p| p.1).sum();
        assert_eq!(bandit_pulls, 300);
        assert!(cmp.uplift().is_finite());
        assert_eq!(cmp.bandit_expectations["superstar"].len(), 300);
    }

    #[test]
    fn exploration_share_must_be_open_unit_interval() {
        let sim = SimulationConfig::new(arms(), PolicyConfig::default());
        for share in [0.0, 1.0, -0.5, f64::NAN] {
            let cfg = ComparisonConfig::new(sim.clone(), 10).with_exploration_share(share);
            assert!(matches!(
                Comparison::run(&cfg),
                Err(Error::InvalidParameter { .. })
            ));
        }
    }
}
