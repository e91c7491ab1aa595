//! `armsim`: seedable multi-armed bandit simulation.
//!
//! You configure a small set of arms, each backed by a reward distribution
//! (Gaussian, uniform, or Bernoulli), and a learning policy. The simulation
//! first trains the policy on a uniform-random exploration batch, then plays
//! policy-driven rounds one at a time, recording every pull on a
//! round-aligned ledger.
//!
//! **Goals:**
//! - **Reproducible**: the reward stream and the policy stream are seeded
//!   independently; same config + same seeds → identical ledger.
//! - **Round-aligned**: after round `i` every arm's series has length `i + 1`,
//!   whether or not the arm was pulled.
//! - **Atomic failures**: a rejected call leaves no partial state behind.
//!
//! **Policies** ([`PolicyConfig`]):
//! - epsilon-greedy (`epsilon`, default 0.05)
//! - softmax / Boltzmann (`tau`, default 1.0)
//! - UCB1 (`alpha`, default 1.0)
//! - Thompson sampling over binarized rewards (`threshold`, default 0.5)
//!
//! **Pieces:**
//! - [`RewardSource`]: seeded per-arm reward sampling, rounded to 4 decimals.
//! - [`PolicyEngine`]: batch fit, idempotent [`PolicyEngine::select_arm`],
//!   online [`PolicyEngine::observe`], per-arm expectations.
//! - [`Ledger`] / [`ExpectationLog`]: cumulative pulls, rewards, and estimates
//!   per round.
//! - [`Simulation`]: the explore → exploit state machine over the above.
//! - [`Comparison`]: equal-allocation A/B baseline vs. a bandit on the same budget.
//!
//! **Non-goals:**
//! - No persistence, plotting, or dashboards; callers read the snapshots.
//! - No contextual bandits or non-stationary drift.
//!
//! ```rust
//! use armsim::{
//!     ArmSpec, Comparison, ComparisonConfig, PolicySpec, SimulationConfig, SimulationSpec,
//! };
//! use std::collections::BTreeMap;
//!
//! let mut arms = BTreeMap::new();
//! arms.insert("control".to_string(), ArmSpec::new("gauss", vec![0.60, 0.05]));
//! arms.insert("variant".to_string(), ArmSpec::new("uniform", vec![0.55, 0.80]));
//! let spec = SimulationSpec {
//!     arms,
//!     policy: PolicySpec::new("thompson_sampling").with_param("threshold", 0.65),
//!     reward_seed: Some(7),
//!     policy_seed: None,
//! };
//! let cfg = ComparisonConfig::new(SimulationConfig::try_from(&spec)?, 50);
//! let cmp = Comparison::run(&cfg)?;
//! assert_eq!(cmp.bandit.rounds, 100);
//! # Ok::<(), armsim::Error>(())
//! ```

#![forbid(unsafe_code)]

mod alloc;
mod baseline;
mod binarize;
mod error;
mod greedy;
mod ledger;
mod policy;
mod reward;
mod simulation;
mod softmax;
mod stats;
mod thompson;
mod ucb;
mod utils;

/// Scores within this distance of the maximum count as tied.
const TIEBREAK_EPS: f64 = 1e-12;

pub use alloc::{sample_index, softmax};
pub use baseline::{AbBaseline, Comparison, ComparisonConfig};
pub use binarize::{Binarizer, DEFAULT_BINARY_THRESHOLD};
pub use error::{Error, Result};
pub use greedy::{EpsilonGreedy, DEFAULT_EPSILON};
pub use ledger::{ArmSeries, ExpectationLog, Ledger, LedgerSnapshot, RoundRecord};
pub use policy::{
    ArmPolicy, PolicyConfig, PolicyEngine, PolicyMethod, PolicySpec, DEFAULT_POLICY_SEED,
};
pub use reward::{ArmConfig, ArmSet, ArmSpec, DistributionKind, RewardSource};
pub use simulation::{Phase, Simulation, SimulationConfig, SimulationSpec, DEFAULT_REWARD_SEED};
pub use softmax::{Softmax, DEFAULT_TAU};
pub use stats::ArmStats;
pub use thompson::{BetaStats, ThompsonSampling};
pub use ucb::{Ucb1, DEFAULT_ALPHA};
pub use utils::{
    argmax_random_tiebreak, round_to, BATCH_EXPECTATION_DECIMALS, REWARD_DECIMALS,
    ROUND_EXPECTATION_DECIMALS,
};
