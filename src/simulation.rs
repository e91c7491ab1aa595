//! Stateful simulation loop: the entry point most callers want.
//!
//! [`Simulation`] owns one [`RewardSource`], one [`PolicyEngine`], the
//! [`Ledger`], the [`ExpectationLog`], and the round history, and moves through
//! three phases:
//!
//! 1. **Unfitted**: only [`Simulation::fit`] is valid.
//! 2. **Fitted**: the policy has been trained on a uniform-random exploration
//!    batch; every batch trial is on the ledger.
//! 3. **Running**: at least one policy-driven round has been played.
//!
//! Rounds form a dependency chain (each selection depends on every earlier
//! observation), so they are played strictly in sequence.
//!
//! ```rust
//! use armsim::{ArmConfig, ArmSet, PolicyConfig, Simulation, SimulationConfig};
//!
//! let arms = ArmSet::new(vec![
//!     ("A".to_string(), ArmConfig::gaussian(10.0, 2.0)?),
//!     ("B".to_string(), ArmConfig::uniform(5.0, 15.0)?),
//! ])?;
//! let cfg = SimulationConfig::new(arms, PolicyConfig::epsilon_greedy(0.1));
//! let mut sim = Simulation::new(&cfg)?;
//! sim.fit(20)?;
//! sim.run(10)?;
//! assert_eq!(sim.ledger().len(), 30);
//! # Ok::<(), armsim::Error>(())
//! ```

use rand::rngs::StdRng;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::ledger::{ExpectationLog, Ledger, RoundRecord};
use crate::policy::{PolicyConfig, PolicyEngine, PolicySpec, DEFAULT_POLICY_SEED};
use crate::reward::{ArmSet, ArmSpec, RewardSource};
use crate::utils::{round_to, BATCH_EXPECTATION_DECIMALS, ROUND_EXPECTATION_DECIMALS};
use crate::{Error, Result};

/// Default seed of the reward stream.
pub const DEFAULT_REWARD_SEED: u64 = 0;

/// Everything needed to build a [`Simulation`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub arms: ArmSet,
    pub policy: PolicyConfig,
    /// Seed of the reward stream.
    pub reward_seed: u64,
    /// Seed of the policy stream, independent of `reward_seed`.
    pub policy_seed: u64,
}

impl SimulationConfig {
    pub fn new(arms: ArmSet, policy: PolicyConfig) -> Self {
        Self {
            arms,
            policy,
            reward_seed: DEFAULT_REWARD_SEED,
            policy_seed: DEFAULT_POLICY_SEED,
        }
    }

    /// Build from the external arm mapping and `{method, method_params}` form.
    pub fn from_specs(arms: &BTreeMap<String, ArmSpec>, policy: &PolicySpec) -> Result<Self> {
        Ok(Self::new(
            ArmSet::from_specs(arms)?,
            PolicyConfig::try_from(policy)?,
        ))
    }

    pub fn with_reward_seed(mut self, seed: u64) -> Self {
        self.reward_seed = seed;
        self
    }

    pub fn with_policy_seed(mut self, seed: u64) -> Self {
        self.policy_seed = seed;
        self
    }

    pub fn with_seeds(self, reward_seed: u64, policy_seed: u64) -> Self {
        self.with_reward_seed(reward_seed).with_policy_seed(policy_seed)
    }
}

/// Serializable form of [`SimulationConfig`], matching the external inputs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationSpec {
    pub arms: BTreeMap<String, ArmSpec>,
    pub policy: PolicySpec,
    #[cfg_attr(feature = "serde", serde(default))]
    pub reward_seed: Option<u64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub policy_seed: Option<u64>,
}

impl TryFrom<&SimulationSpec> for SimulationConfig {
    type Error = Error;

    fn try_from(spec: &SimulationSpec) -> Result<Self> {
        Ok(SimulationConfig::from_specs(&spec.arms, &spec.policy)?.with_seeds(
            spec.reward_seed.unwrap_or(DEFAULT_REWARD_SEED),
            spec.policy_seed.unwrap_or(DEFAULT_POLICY_SEED),
        ))
    }
}

/// Lifecycle phase of a [`Simulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    Unfitted,
    Fitted,
    Running,
}

/// One bandit simulation run.
#[derive(Debug, Clone)]
pub struct Simulation<R = StdRng> {
    source: RewardSource<R>,
    policy: PolicyEngine,
    ledger: Ledger,
    expectations: ExpectationLog,
    rounds: Vec<RoundRecord>,
    phase: Phase,
    explore_rounds: usize,
}

impl Simulation<StdRng> {
    /// Build a fresh, unfitted simulation with seeded reward and policy streams.
    pub fn new(cfg: &SimulationConfig) -> Result<Self> {
        let source = RewardSource::with_seed(cfg.arms.clone(), cfg.reward_seed);
        let policy = PolicyEngine::new(cfg.arms.ids(), cfg.policy.clone(), cfg.policy_seed)?;
        Self::from_parts(source, policy)
    }
}

impl<R: Rng> Simulation<R> {
    /// Assemble from an existing source and an unfitted policy over the same arms.
    pub fn from_parts(source: RewardSource<R>, policy: PolicyEngine) -> Result<Self> {
        if policy.is_fitted() {
            return Err(Error::AlreadyFitted);
        }
        let arms = source.arm_ids().to_vec();
        if let Some(stray) = policy.arms().iter().find(|a| !arms.contains(a)) {
            return Err(Error::UnknownArm(stray.clone()));
        }
        if let Some(missing) = arms.iter().find(|a| !policy.arms().contains(a)) {
            return Err(Error::UnknownArm(missing.clone()));
        }
        if policy.arms() != arms.as_slice() {
            return Err(Error::invalid_param(
                "arms",
                "policy arm order must match the reward source",
            ));
        }
        Ok(Self {
            source,
            policy,
            ledger: Ledger::new(&arms),
            expectations: ExpectationLog::new(&arms),
            rounds: Vec::new(),
            phase: Phase::Unfitted,
            explore_rounds: 0,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn arms(&self) -> &[String] {
        self.ledger.arms()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn expectation_history(&self) -> &ExpectationLog {
        &self.expectations
    }

    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    /// Rounds played during the exploration batch.
    pub fn explore_rounds(&self) -> usize {
        self.explore_rounds
    }

    /// Rounds played by the policy after fitting.
    pub fn exploit_rounds(&self) -> usize {
        self.rounds.len() - self.explore_rounds
    }

    /// Current policy estimates for every arm.
    pub fn expectations(&self) -> BTreeMap<String, f64> {
        self.policy.expectations()
    }

    /// Play `explore_rounds` uniform-random trials and train the policy on them.
    ///
    /// On failure neither the ledger nor the policy changes.
    pub fn fit(&mut self, explore_rounds: usize) -> Result<()> {
        if self.phase != Phase::Unfitted {
            return Err(Error::AlreadyFitted);
        }
        let batch = self.source.sample_batch(explore_rounds);
        let (decisions, rewards): (Vec<String>, Vec<f64>) = batch.into_iter().unzip();

        let arms = self.arms().to_vec();
        let mut ledger = Ledger::new(&arms);
        let mut rounds = Vec::with_capacity(explore_rounds);
        for (i, (arm, &reward)) in decisions.iter().zip(&rewards).enumerate() {
            ledger.record(i, arm, reward)?;
            rounds.push(RoundRecord {
                round_index: i,
                arm_id: arm.clone(),
                reward,
            });
        }

        let mut policy = self.policy.clone();
        policy.batch_fit(&decisions, &rewards)?;

        let snapshot: Vec<f64> = policy
            .expectation_vec()
            .into_iter()
            .map(|e| round_to(e, BATCH_EXPECTATION_DECIMALS))
            .collect();
        let mut expectations = ExpectationLog::new(&arms);
        expectations.push_replicated(&snapshot, explore_rounds);

        for a in &arms {
            if ledger.series(a).is_some_and(|s| s.total_pulls() == 0) {
                warn!(arm = %a, explore_rounds, "arm received no exploration pulls");
            }
        }
        info!(
            method = %policy.method(),
            explore_rounds,
            arms = arms.len(),
            "fitted bandit policy on exploration batch"
        );

        self.policy = policy;
        self.ledger = ledger;
        self.expectations = expectations;
        self.rounds = rounds;
        self.explore_rounds = explore_rounds;
        self.phase = Phase::Fitted;
        Ok(())
    }

    /// Select, pull, observe, and record one round.
    pub fn advance_one_round(&mut self) -> Result<RoundRecord> {
        if self.phase == Phase::Unfitted {
            return Err(Error::NotFitted);
        }
        let arm = self.policy.select_arm()?;
        let reward = self.source.sample(&arm)?;
        // Arm sets are identical, so the ledger cannot reject what the policy accepted.
        self.policy.observe(&arm, reward)?;
        let round_index = self.rounds.len();
        self.ledger.record(round_index, &arm, reward)?;

        let snapshot: Vec<f64> = self
            .policy
            .expectation_vec()
            .into_iter()
            .map(|e| round_to(e, ROUND_EXPECTATION_DECIMALS))
            .collect();
        self.expectations.push(&snapshot);

        let record = RoundRecord {
            round_index,
            arm_id: arm,
            reward,
        };
        debug!(round = round_index, arm = %record.arm_id, reward, "bandit round");
        self.rounds.push(record.clone());
        self.phase = Phase::Running;
        Ok(record)
    }

    /// Play `n` rounds in strict sequence.
    pub fn run(&mut self, n: usize) -> Result<()> {
        if self.phase == Phase::Unfitted {
            return Err(Error::NotFitted);
        }
        for _ in 0..n {
            self.advance_one_round()?;
        }
        Ok(())
    }
}
