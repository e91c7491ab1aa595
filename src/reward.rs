//! Reward generation: one configured probability distribution per arm.
//!
//! [`RewardSource`] owns the arm set and an explicit random stream. Rewards are
//! rounded to [`REWARD_DECIMALS`] places exactly once, when they are generated.
//!
//! ```rust
//! use armsim::{ArmConfig, ArmSet, RewardSource};
//!
//! let arms = ArmSet::new(vec![
//!     ("A".to_string(), ArmConfig::gaussian(10.0, 2.0)?),
//!     ("B".to_string(), ArmConfig::uniform(5.0, 15.0)?),
//! ])?;
//! let mut source = RewardSource::with_seed(arms, 7);
//! let r = source.sample("B")?;
//! assert!((5.0..=15.0).contains(&r));
//! # Ok::<(), armsim::Error>(())
//! ```

use rand::distr::{Bernoulli, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::{round_to, REWARD_DECIMALS};
use crate::{Error, Result};

/// Supported reward distribution families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DistributionKind {
    /// `gauss`: params `[mean, stddev]`.
    Gaussian,
    /// `uniform`: params `[low, high]`.
    Uniform,
    /// `bernoulli`: params `[p]`, rewards are `0.0` or `1.0`.
    Bernoulli,
}

impl DistributionKind {
    /// Configuration tag for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            DistributionKind::Gaussian => "gauss",
            DistributionKind::Uniform => "uniform",
            DistributionKind::Bernoulli => "bernoulli",
        }
    }

    fn arity(self) -> usize {
        match self {
            DistributionKind::Gaussian | DistributionKind::Uniform => 2,
            DistributionKind::Bernoulli => 1,
        }
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DistributionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gauss" | "gaussian" | "normal" => Ok(DistributionKind::Gaussian),
            "uniform" => Ok(DistributionKind::Uniform),
            "bernoulli" => Ok(DistributionKind::Bernoulli),
            other => Err(Error::UnsupportedDistribution(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Sampler {
    Gaussian(Normal<f64>),
    Uniform(Uniform<f64>),
    Bernoulli(Bernoulli),
}

impl Sampler {
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Sampler::Gaussian(d) => d.sample(rng),
            Sampler::Uniform(d) => d.sample(rng),
            Sampler::Bernoulli(d) => {
                if d.sample(rng) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Immutable reward model of one arm.
///
/// Parameters are validated when the config is built, so a constructed
/// `ArmConfig` can always be sampled.
#[derive(Debug, Clone)]
pub struct ArmConfig {
    kind: DistributionKind,
    params: Vec<f64>,
    sampler: Sampler,
}

impl PartialEq for ArmConfig {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.params == other.params
    }
}

impl ArmConfig {
    /// Build from a kind and its ordered parameter list.
    pub fn new(kind: DistributionKind, params: &[f64]) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidDistributionParams {
            kind: kind.tag(),
            reason,
        };
        if params.len() != kind.arity() {
            return Err(invalid(format!(
                "expected {} params, got {}",
                kind.arity(),
                params.len()
            )));
        }
        if let Some(p) = params.iter().find(|p| !p.is_finite()) {
            return Err(invalid(format!("non-finite param {p}")));
        }
        if kind == DistributionKind::Gaussian && params[1] < 0.0 {
            return Err(invalid(format!("stddev {} must be >= 0", params[1])));
        }
        let sampler = match kind {
            DistributionKind::Gaussian => Normal::new(params[0], params[1])
                .map(Sampler::Gaussian)
                .map_err(|e| invalid(e.to_string()))?,
            DistributionKind::Uniform => Uniform::new_inclusive(params[0], params[1])
                .map(Sampler::Uniform)
                .map_err(|e| invalid(format!("low={} high={}: {e}", params[0], params[1])))?,
            DistributionKind::Bernoulli => Bernoulli::new(params[0])
                .map(Sampler::Bernoulli)
                .map_err(|e| invalid(e.to_string()))?,
        };
        Ok(Self {
            kind,
            params: params.to_vec(),
            sampler,
        })
    }

    /// Parse the external `{distribution, params}` form.
    ///
    /// Unknown tags fail with [`Error::UnsupportedDistribution`].
    pub fn from_tag(distribution: &str, params: &[f64]) -> Result<Self> {
        Self::new(distribution.parse()?, params)
    }

    /// Normal distribution with the given mean and standard deviation.
    pub fn gaussian(mean: f64, stddev: f64) -> Result<Self> {
        Self::new(DistributionKind::Gaussian, &[mean, stddev])
    }

    /// Continuous uniform distribution over `[low, high]`.
    pub fn uniform(low: f64, high: f64) -> Result<Self> {
        Self::new(DistributionKind::Uniform, &[low, high])
    }

    /// Bernoulli rewards: `1.0` with probability `p`, else `0.0`.
    pub fn bernoulli(p: f64) -> Result<Self> {
        Self::new(DistributionKind::Bernoulli, &[p])
    }

    pub fn kind(&self) -> DistributionKind {
        self.kind
    }

    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Analytic mean of the distribution.
    pub fn mean(&self) -> f64 {
        match self.kind {
            DistributionKind::Gaussian | DistributionKind::Bernoulli => self.params[0],
            DistributionKind::Uniform => 0.5 * (self.params[0] + self.params[1]),
        }
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.sampler.draw(rng)
    }
}

/// External, string-tagged form of an arm's configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmSpec {
    pub distribution: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: Vec<f64>,
}

impl ArmSpec {
    pub fn new(distribution: impl Into<String>, params: Vec<f64>) -> Self {
        Self {
            distribution: distribution.into(),
            params,
        }
    }
}

impl TryFrom<&ArmSpec> for ArmConfig {
    type Error = Error;

    fn try_from(spec: &ArmSpec) -> Result<Self> {
        ArmConfig::from_tag(&spec.distribution, &spec.params)
    }
}

impl From<&ArmConfig> for ArmSpec {
    fn from(cfg: &ArmConfig) -> Self {
        ArmSpec::new(cfg.kind.tag(), cfg.params.clone())
    }
}

/// Ordered, duplicate-free set of named arms.
///
/// Order is the configured order; it drives uniform arm choice during
/// exploration and the stable iteration order of every per-arm view.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmSet {
    ids: Vec<String>,
    configs: Vec<ArmConfig>,
}

impl ArmSet {
    /// Build from `(arm_id, config)` pairs, keeping their order.
    pub fn new(arms: Vec<(String, ArmConfig)>) -> Result<Self> {
        if arms.is_empty() {
            return Err(Error::NoArms);
        }
        let mut ids = Vec::with_capacity(arms.len());
        let mut configs = Vec::with_capacity(arms.len());
        for (id, cfg) in arms {
            if ids.contains(&id) {
                return Err(Error::DuplicateArm(id));
            }
            ids.push(id);
            configs.push(cfg);
        }
        Ok(Self { ids, configs })
    }

    /// Build from the external arm-id → `{distribution, params}` mapping.
    ///
    /// Map iteration order (lexicographic for `BTreeMap`) becomes arm order.
    pub fn from_specs(specs: &BTreeMap<String, ArmSpec>) -> Result<Self> {
        let arms = specs
            .iter()
            .map(|(id, spec)| Ok((id.clone(), ArmConfig::try_from(spec)?)))
            .collect::<Result<Vec<_>>>()?;
        Self::new(arms)
    }

    /// Export back to the external form.
    pub fn to_specs(&self) -> BTreeMap<String, ArmSpec> {
        self.iter()
            .map(|(id, cfg)| (id.to_string(), ArmSpec::from(cfg)))
            .collect()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn index_of(&self, arm: &str) -> Result<usize> {
        self.ids
            .iter()
            .position(|a| a == arm)
            .ok_or_else(|| Error::UnknownArm(arm.to_string()))
    }

    pub fn get(&self, arm: &str) -> Result<&ArmConfig> {
        Ok(&self.configs[self.index_of(arm)?])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArmConfig)> {
        self.ids.iter().map(String::as_str).zip(self.configs.iter())
    }
}

/// Seedable per-arm reward generator.
#[derive(Debug, Clone)]
pub struct RewardSource<R = StdRng> {
    arms: ArmSet,
    rng: R,
}

impl RewardSource<StdRng> {
    /// Create a source whose stream is `StdRng` seeded with `seed`.
    pub fn with_seed(arms: ArmSet, seed: u64) -> Self {
        Self::with_rng(arms, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RewardSource<R> {
    /// Create a source drawing from an injected random stream.
    pub fn with_rng(arms: ArmSet, rng: R) -> Self {
        Self { arms, rng }
    }

    pub fn arms(&self) -> &ArmSet {
        &self.arms
    }

    pub fn arm_ids(&self) -> &[String] {
        self.arms.ids()
    }

    /// Draw one reward for `arm_id`, rounded to four decimals.
    pub fn sample(&mut self, arm_id: &str) -> Result<f64> {
        let idx = self.arms.index_of(arm_id)?;
        Ok(self.sample_idx(idx))
    }

    /// Draw `n` rewards for `arm_id`.
    pub fn sample_n(&mut self, arm_id: &str, n: usize) -> Result<Vec<f64>> {
        let idx = self.arms.index_of(arm_id)?;
        Ok((0..n).map(|_| self.sample_idx(idx)).collect())
    }

    /// Draw `n` exploration trials, each on an arm chosen uniformly at random.
    pub fn sample_batch(&mut self, n: usize) -> Vec<(String, f64)> {
        let k = self.arms.len();
        (0..n)
            .map(|_| {
                let idx = self.rng.random_range(0..k);
                let reward = self.sample_idx(idx);
                (self.arms.ids[idx].clone(), reward)
            })
            .collect()
    }

    fn sample_idx(&mut self, idx: usize) -> f64 {
        let raw = self.arms.configs[idx].draw(&mut self.rng);
        round_to(raw, REWARD_DECIMALS)
    }
}
