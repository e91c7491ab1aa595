//! Error taxonomy for the simulation engine.
//!
//! Every error here is local and deterministic: it points at a configuration
//! or call-order bug, never at a transient condition, so nothing is retried.

use thiserror::Error;

/// Errors produced by reward sources, policies, ledgers, and simulations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The arm id is not part of the configured arm set.
    #[error("arm '{0}' not found in configuration")]
    UnknownArm(String),

    /// The distribution tag has no registered sampler.
    #[error("unsupported distribution: '{0}'")]
    UnsupportedDistribution(String),

    /// The policy method name is not one of the supported variants.
    #[error("unsupported bandit method: '{0}'")]
    UnsupportedPolicy(String),

    /// `select_arm`/`observe`/`advance_one_round` called before fitting.
    #[error("bandit model has not been fitted yet; call fit() first")]
    NotFitted,

    /// A second batch fit was attempted on an already fitted policy or simulation.
    #[error("bandit model has already been fitted")]
    AlreadyFitted,

    /// Distribution parameters have the wrong arity or lie outside the domain.
    #[error("invalid parameters for {kind} distribution: {reason}")]
    InvalidDistributionParams { kind: &'static str, reason: String },

    /// A policy or comparison hyperparameter is unknown or out of range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Parallel decision/reward sequences differ in length.
    #[error("length mismatch: {0} decisions vs {1} rewards")]
    LengthMismatch(usize, usize),

    /// The arm set is empty.
    #[error("at least one arm must be configured")]
    NoArms,

    /// The same arm id was configured twice.
    #[error("arm '{0}' configured more than once")]
    DuplicateArm(String),

    /// A ledger entry was recorded for a non-contiguous round index.
    #[error("round {got} recorded out of order (expected {expected})")]
    RoundOutOfOrder { expected: usize, got: usize },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_param(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
