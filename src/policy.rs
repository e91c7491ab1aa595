//! Bandit learning policies behind a single fit/select/observe engine.
//!
//! [`PolicyConfig`] is the closed set of supported policies. It is validated
//! when a [`PolicyEngine`] is built, so an unknown method name or an
//! out-of-range hyperparameter never reaches the simulation loop.
//!
//! The engine enforces the lifecycle:
//!
//! ```text
//! let mut engine = PolicyEngine::new(&arms, cfg, seed)?;
//! engine.batch_fit(&decisions, &rewards)?;   // exactly once
//! loop {
//!     let arm = engine.select_arm()?;         // idempotent until observe
//!     engine.observe(&arm, reward)?;
//! }
//! ```
//!
//! Each algorithm implements [`ArmPolicy`] over arm indices; the engine owns
//! the arm names, the policy random stream, and the fitted flag.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::binarize::{Binarizer, DEFAULT_BINARY_THRESHOLD};
use crate::greedy::{EpsilonGreedy, DEFAULT_EPSILON};
use crate::softmax::{Softmax, DEFAULT_TAU};
use crate::thompson::ThompsonSampling;
use crate::ucb::{Ucb1, DEFAULT_ALPHA};
use crate::{Error, Result};

/// Default seed of the policy random stream.
pub const DEFAULT_POLICY_SEED: u64 = 42;

/// Index-level interface implemented by every learning algorithm.
///
/// Arm indices follow the engine's configured arm order. Implementations are
/// only ever called with in-range indices.
pub trait ArmPolicy {
    /// Incorporate one reward for `arm`.
    fn update(&mut self, arm: usize, reward: f64);

    /// Pick the next arm. Randomness comes only from `rng`.
    fn choose(&self, rng: &mut StdRng) -> usize;

    /// Current expected-reward estimate for `arm` (a prior for unpulled arms).
    fn expectation(&self, arm: usize) -> f64;
}

/// Supported policy method names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PolicyMethod {
    EpsilonGreedy,
    Softmax,
    Ucb,
    ThompsonSampling,
}

impl PolicyMethod {
    pub fn name(self) -> &'static str {
        match self {
            PolicyMethod::EpsilonGreedy => "epsilon_greedy",
            PolicyMethod::Softmax => "softmax",
            PolicyMethod::Ucb => "ucb",
            PolicyMethod::ThompsonSampling => "thompson_sampling",
        }
    }
}

impl fmt::Display for PolicyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolicyMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "epsilon_greedy" => Ok(PolicyMethod::EpsilonGreedy),
            "softmax" => Ok(PolicyMethod::Softmax),
            "ucb" | "ucb1" => Ok(PolicyMethod::Ucb),
            "thompson_sampling" => Ok(PolicyMethod::ThompsonSampling),
            other => Err(Error::UnsupportedPolicy(other.to_string())),
        }
    }
}

/// A fully specified learning policy.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyConfig {
    /// Explore a uniformly random arm with probability `epsilon`.
    EpsilonGreedy { epsilon: f64 },
    /// Sample from the softmax of mean rewards at temperature `tau`.
    Softmax { tau: f64 },
    /// UCB1 with exploration weight `alpha`.
    Ucb { alpha: f64 },
    /// Beta-Bernoulli Thompson sampling over binarized rewards.
    ThompsonSampling { binarizer: Binarizer },
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig::EpsilonGreedy {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl PolicyConfig {
    pub fn epsilon_greedy(epsilon: f64) -> Self {
        PolicyConfig::EpsilonGreedy { epsilon }
    }

    pub fn softmax(tau: f64) -> Self {
        PolicyConfig::Softmax { tau }
    }

    pub fn ucb(alpha: f64) -> Self {
        PolicyConfig::Ucb { alpha }
    }

    /// Thompson sampling with the default 0.5 threshold on every arm.
    pub fn thompson_sampling() -> Self {
        PolicyConfig::ThompsonSampling {
            binarizer: Binarizer::default(),
        }
    }

    pub fn method(&self) -> PolicyMethod {
        match self {
            PolicyConfig::EpsilonGreedy { .. } => PolicyMethod::EpsilonGreedy,
            PolicyConfig::Softmax { .. } => PolicyMethod::Softmax,
            PolicyConfig::Ucb { .. } => PolicyMethod::Ucb,
            PolicyConfig::ThompsonSampling { .. } => PolicyMethod::ThompsonSampling,
        }
    }

    /// Build from the external `{method, method_params}` form.
    ///
    /// Missing hyperparameters take their defaults; unknown ones are rejected.
    pub fn from_method(method: &str, method_params: &BTreeMap<String, f64>) -> Result<Self> {
        let method: PolicyMethod = method.parse()?;
        let mut params = method_params.clone();
        let mut take = |name: &str, default: f64| params.remove(name).unwrap_or(default);
        let cfg = match method {
            PolicyMethod::EpsilonGreedy => PolicyConfig::EpsilonGreedy {
                epsilon: take("epsilon", DEFAULT_EPSILON),
            },
            PolicyMethod::Softmax => PolicyConfig::Softmax {
                tau: take("tau", DEFAULT_TAU),
            },
            PolicyMethod::Ucb => PolicyConfig::Ucb {
                alpha: take("alpha", DEFAULT_ALPHA),
            },
            PolicyMethod::ThompsonSampling => PolicyConfig::ThompsonSampling {
                binarizer: Binarizer::with_threshold(take("threshold", DEFAULT_BINARY_THRESHOLD)),
            },
        };
        if let Some(extra) = params.keys().next() {
            return Err(Error::invalid_param(
                extra.clone(),
                format!("not a parameter of {method}"),
            ));
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check hyperparameter ranges.
    pub fn validate(&self) -> Result<()> {
        match self {
            PolicyConfig::EpsilonGreedy { epsilon } => {
                if !(0.0..=1.0).contains(epsilon) {
                    return Err(Error::invalid_param(
                        "epsilon",
                        format!("{epsilon} not in [0, 1]"),
                    ));
                }
            }
            PolicyConfig::Softmax { tau } => {
                if !(tau.is_finite() && *tau > 0.0) {
                    return Err(Error::invalid_param(
                        "tau",
                        format!("{tau} must be finite and > 0"),
                    ));
                }
            }
            PolicyConfig::Ucb { alpha } => {
                if !(alpha.is_finite() && *alpha >= 0.0) {
                    return Err(Error::invalid_param(
                        "alpha",
                        format!("{alpha} must be finite and >= 0"),
                    ));
                }
            }
            PolicyConfig::ThompsonSampling { binarizer } => {
                let all = std::iter::once(&binarizer.threshold).chain(binarizer.per_arm.values());
                for t in all {
                    if !t.is_finite() {
                        return Err(Error::invalid_param(
                            "threshold",
                            format!("{t} must be finite"),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// External, string-tagged form of a policy configuration.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolicySpec {
    pub method: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub method_params: BTreeMap<String, f64>,
}

impl PolicySpec {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            method_params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.method_params.insert(name.into(), value);
        self
    }
}

impl TryFrom<&PolicySpec> for PolicyConfig {
    type Error = Error;

    fn try_from(spec: &PolicySpec) -> Result<Self> {
        PolicyConfig::from_method(&spec.method, &spec.method_params)
    }
}

#[derive(Debug, Clone)]
enum Learner {
    EpsilonGreedy(EpsilonGreedy),
    Softmax(Softmax),
    Ucb(Ucb1),
    Thompson(ThompsonSampling),
}

impl Learner {
    fn build(arms: &[String], cfg: &PolicyConfig) -> Self {
        let k = arms.len();
        match cfg {
            PolicyConfig::EpsilonGreedy { epsilon } => {
                Learner::EpsilonGreedy(EpsilonGreedy::new(k, *epsilon))
            }
            PolicyConfig::Softmax { tau } => Learner::Softmax(Softmax::new(k, *tau)),
            PolicyConfig::Ucb { alpha } => Learner::Ucb(Ucb1::new(k, *alpha)),
            PolicyConfig::ThompsonSampling { binarizer } => {
                Learner::Thompson(ThompsonSampling::new(arms, binarizer.clone()))
            }
        }
    }

    fn policy(&self) -> &dyn ArmPolicy {
        match self {
            Learner::EpsilonGreedy(p) => p,
            Learner::Softmax(p) => p,
            Learner::Ucb(p) => p,
            Learner::Thompson(p) => p,
        }
    }

    fn policy_mut(&mut self) -> &mut dyn ArmPolicy {
        match self {
            Learner::EpsilonGreedy(p) => p,
            Learner::Softmax(p) => p,
            Learner::Ucb(p) => p,
            Learner::Thompson(p) => p,
        }
    }
}

/// Stateful wrapper that drives one learning policy through its lifecycle.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    cfg: PolicyConfig,
    arms: Vec<String>,
    learner: Learner,
    rng: StdRng,
    seed: u64,
    fitted: bool,
    // Arm chosen by `select_arm` and not yet consumed by `observe`.
    pending: Option<usize>,
}

impl PolicyEngine {
    /// Create an unfitted engine over `arms` with its own seeded random stream.
    pub fn new(arms: &[String], cfg: PolicyConfig, seed: u64) -> Result<Self> {
        if arms.is_empty() {
            return Err(Error::NoArms);
        }
        for (i, a) in arms.iter().enumerate() {
            if arms[..i].contains(a) {
                return Err(Error::DuplicateArm(a.clone()));
            }
        }
        cfg.validate()?;
        if let PolicyConfig::ThompsonSampling { binarizer } = &cfg {
            if let Some(stray) = binarizer.per_arm.keys().find(|a| !arms.contains(a)) {
                return Err(Error::UnknownArm(stray.clone()));
            }
        }
        Ok(Self {
            learner: Learner::build(arms, &cfg),
            cfg,
            arms: arms.to_vec(),
            rng: StdRng::seed_from_u64(seed),
            seed,
            fitted: false,
            pending: None,
        })
    }

    /// Create from the external `{method, method_params}` form.
    pub fn from_spec(arms: &[String], spec: &PolicySpec, seed: u64) -> Result<Self> {
        Self::new(arms, PolicyConfig::try_from(spec)?, seed)
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.cfg
    }

    pub fn method(&self) -> PolicyMethod {
        self.cfg.method()
    }

    pub fn arms(&self) -> &[String] {
        &self.arms
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Binarizer in use, for Thompson sampling only.
    pub fn binarizer(&self) -> Option<&Binarizer> {
        match &self.learner {
            Learner::Thompson(ts) => Some(ts.binarizer()),
            _ => None,
        }
    }

    fn index_of(&self, arm: &str) -> Result<usize> {
        self.arms
            .iter()
            .position(|a| a == arm)
            .ok_or_else(|| Error::UnknownArm(arm.to_string()))
    }

    /// Train on a historical exploration batch. Must be called exactly once.
    ///
    /// All decisions are validated before any state changes, so a failed fit
    /// leaves the engine untouched.
    pub fn batch_fit(&mut self, decisions: &[String], rewards: &[f64]) -> Result<()> {
        if self.fitted {
            return Err(Error::AlreadyFitted);
        }
        if decisions.len() != rewards.len() {
            return Err(Error::LengthMismatch(decisions.len(), rewards.len()));
        }
        let idxs = decisions
            .iter()
            .map(|d| self.index_of(d))
            .collect::<Result<Vec<_>>>()?;
        let policy = self.learner.policy_mut();
        for (idx, &reward) in idxs.into_iter().zip(rewards) {
            policy.update(idx, reward);
        }
        self.fitted = true;
        self.pending = None;
        Ok(())
    }

    /// Arm the policy currently judges best to pull next.
    ///
    /// Repeated calls without an intervening [`observe`](Self::observe) return
    /// the same arm and draw no further randomness.
    pub fn select_arm(&mut self) -> Result<String> {
        if !self.fitted {
            return Err(Error::NotFitted);
        }
        let idx = match self.pending {
            Some(idx) => idx,
            None => {
                let idx = self.learner.policy().choose(&mut self.rng);
                self.pending = Some(idx);
                idx
            }
        };
        Ok(self.arms[idx].clone())
    }

    /// Incorporate one observation.
    pub fn observe(&mut self, arm: &str, reward: f64) -> Result<()> {
        if !self.fitted {
            return Err(Error::NotFitted);
        }
        let idx = self.index_of(arm)?;
        self.learner.policy_mut().update(idx, reward);
        self.pending = None;
        Ok(())
    }

    /// Current per-arm expectation for every configured arm.
    pub fn expectations(&self) -> BTreeMap<String, f64> {
        self.arms
            .iter()
            .zip(self.expectation_vec())
            .map(|(a, e)| (a.clone(), e))
            .collect()
    }

    /// Expectations aligned with [`arms`](Self::arms).
    pub fn expectation_vec(&self) -> Vec<f64> {
        let policy = self.learner.policy();
        (0..self.arms.len()).map(|i| policy.expectation(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arms() -> Vec<String> {
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    }

    fn all_configs() -> Vec<PolicyConfig> {
        vec![
            PolicyConfig::epsilon_greedy(0.1),
            PolicyConfig::softmax(1.0),
            PolicyConfig::ucb(1.0),
            PolicyConfig::thompson_sampling(),
        ]
    }

    #[test]
    fn unsupported_method_fails_at_construction() {
        let spec = PolicySpec::new("lin_ucb");
        assert_eq!(
            PolicyEngine::from_spec(&arms(), &spec, 0).unwrap_err(),
            Error::UnsupportedPolicy("lin_ucb".to_string())
        );
    }

    #[test]
    fn unknown_hyperparameter_is_rejected() {
        let spec = PolicySpec::new("softmax").with_param("epsilon", 0.1);
        assert!(matches!(
            PolicyConfig::try_from(&spec),
            Err(Error::InvalidParameter { ref name, .. }) if name == "epsilon"
        ));
    }

    #[test]
    fn out_of_range_hyperparameters_are_rejected() {
        assert!(PolicyConfig::epsilon_greedy(1.5).validate().is_err());
        assert!(PolicyConfig::softmax(0.0).validate().is_err());
        assert!(PolicyConfig::ucb(-1.0).validate().is_err());
        assert!(PolicyEngine::new(&arms(), PolicyConfig::epsilon_greedy(-0.1), 0).is_err());
    }

    #[test]
    fn defaults_fill_missing_params() {
        let cfg = PolicyConfig::try_from(&PolicySpec::new("ucb")).unwrap();
        assert_eq!(cfg, PolicyConfig::ucb(DEFAULT_ALPHA));
        let ts = PolicyConfig::try_from(&PolicySpec::new("thompson_sampling")).unwrap();
        assert_eq!(ts, PolicyConfig::thompson_sampling());
    }

    #[test]
    fn thompson_threshold_is_configurable() {
        let spec = PolicySpec::new("thompson_sampling").with_param("threshold", 9.0);
        let engine = PolicyEngine::from_spec(&arms(), &spec, 0).unwrap();
        assert_eq!(engine.binarizer().unwrap().threshold_for("a"), 9.0);
    }

    #[test]
    fn threshold_override_for_unknown_arm_is_rejected() {
        let cfg = PolicyConfig::ThompsonSampling {
            binarizer: Binarizer::default().with_arm_threshold("typo", 9.0),
        };
        assert_eq!(
            PolicyEngine::new(&arms(), cfg, 0).unwrap_err(),
            Error::UnknownArm("typo".to_string())
        );

        let cfg = PolicyConfig::ThompsonSampling {
            binarizer: Binarizer::default().with_arm_threshold("b", 9.0),
        };
        let engine = PolicyEngine::new(&arms(), cfg, 0).unwrap();
        assert_eq!(engine.binarizer().unwrap().threshold_for("b"), 9.0);
        assert_eq!(engine.binarizer().unwrap().threshold_for("a"), 0.5);
    }

    #[test]
    fn engine_reports_its_construction_inputs() {
        let e = PolicyEngine::new(&arms(), PolicyConfig::softmax(2.0), 17).unwrap();
        assert_eq!(e.config(), &PolicyConfig::softmax(2.0));
        assert_eq!(e.method(), PolicyMethod::Softmax);
        assert_eq!(e.seed(), 17);
        assert_eq!(e.arms(), arms().as_slice());
        assert!(!e.is_fitted());
    }

    #[test]
    fn select_and_observe_require_fit() {
        for cfg in all_configs() {
            let mut e = PolicyEngine::new(&arms(), cfg, 0).unwrap();
            assert_eq!(e.select_arm(), Err(Error::NotFitted));
            assert_eq!(e.observe("a", 1.0), Err(Error::NotFitted));
        }
    }

    #[test]
    fn second_fit_is_rejected() {
        let mut e = PolicyEngine::new(&arms(), PolicyConfig::default(), 0).unwrap();
        e.batch_fit(&["a".to_string()], &[1.0]).unwrap();
        assert_eq!(e.batch_fit(&[], &[]), Err(Error::AlreadyFitted));
    }

    #[test]
    fn failed_fit_leaves_engine_unfitted() {
        let mut e = PolicyEngine::new(&arms(), PolicyConfig::ucb(1.0), 0).unwrap();
        let decisions = vec!["a".to_string(), "zzz".to_string()];
        assert_eq!(
            e.batch_fit(&decisions, &[1.0, 2.0]),
            Err(Error::UnknownArm("zzz".to_string()))
        );
        assert!(!e.is_fitted());
        assert_eq!(e.expectation_vec(), vec![0.0, 0.0, 0.0]);
        assert_eq!(
            e.batch_fit(&decisions[..1], &[1.0, 2.0]),
            Err(Error::LengthMismatch(1, 2))
        );
    }

    #[test]
    fn select_is_idempotent_until_observe() {
        for cfg in all_configs() {
            let mut e = PolicyEngine::new(&arms(), cfg, 9).unwrap();
            e.batch_fit(&arms(), &[0.3, 0.9, 0.6]).unwrap();
            let first = e.select_arm().unwrap();
            for _ in 0..10 {
                assert_eq!(e.select_arm().unwrap(), first);
            }
            e.observe(&first, 1.0).unwrap();
            assert!(arms().contains(&e.select_arm().unwrap()));
        }
    }

    #[test]
    fn expectations_cover_every_arm() {
        for cfg in all_configs() {
            let mut e = PolicyEngine::new(&arms(), cfg, 1).unwrap();
            e.batch_fit(&["a".to_string()], &[0.7]).unwrap();
            let ex = e.expectations();
            assert_eq!(ex.keys().cloned().collect::<Vec<_>>(), arms());
            assert!(ex.values().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn observe_unknown_arm_is_rejected() {
        let mut e = PolicyEngine::new(&arms(), PolicyConfig::default(), 0).unwrap();
        e.batch_fit(&[], &[]).unwrap();
        assert_eq!(e.observe("nope", 1.0), Err(Error::UnknownArm("nope".to_string())));
    }

    #[test]
    fn greedy_exploits_best_fitted_arm() {
        let mut e = PolicyEngine::new(&arms(), PolicyConfig::epsilon_greedy(0.0), 0).unwrap();
        e.batch_fit(&arms(), &[1.0, 3.0, 2.0]).unwrap();
        assert_eq!(e.select_arm().unwrap(), "b");
    }

    #[test]
    fn same_seed_same_choices() {
        for cfg in all_configs() {
            let mut e1 = PolicyEngine::new(&arms(), cfg.clone(), 77).unwrap();
            let mut e2 = PolicyEngine::new(&arms(), cfg, 77).unwrap();
            e1.batch_fit(&arms(), &[0.4, 0.6, 0.5]).unwrap();
            e2.batch_fit(&arms(), &[0.4, 0.6, 0.5]).unwrap();
            for i in 0..30 {
                let a1 = e1.select_arm().unwrap();
                let a2 = e2.select_arm().unwrap();
                assert_eq!(a1, a2);
                let r = (i % 7) as f64 / 7.0;
                e1.observe(&a1, r).unwrap();
                e2.observe(&a2, r).unwrap();
            }
        }
    }

    #[test]
    fn duplicate_arms_are_rejected() {
        let dup = vec!["a".to_string(), "a".to_string()];
        assert_eq!(
            PolicyEngine::new(&dup, PolicyConfig::default(), 0).unwrap_err(),
            Error::DuplicateArm("a".to_string())
        );
    }
}
