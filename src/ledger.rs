//! Round-aligned bookkeeping.
//!
//! The [`Ledger`] appends one entry per round to every arm's series, whether or
//! not that arm was pulled, so for any round `i` every series of every arm has
//! length `i + 1`. [`ExpectationLog`] keeps the policy's per-arm estimates on
//! the same round axis.

use std::collections::BTreeMap;

use crate::{Error, Result};

/// One pull: which arm was chosen in which round and what it paid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundRecord {
    pub round_index: usize,
    pub arm_id: String,
    pub reward: f64,
}

/// Time-aligned series for one arm.
///
/// `reward_at_round[i]` is `0.0` in rounds where the arm was not pulled; use
/// `pulls_cumulative` to tell that sentinel apart from a genuine zero reward.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmSeries {
    pub pulls_cumulative: Vec<u64>,
    pub rewards_cumulative: Vec<f64>,
    pub reward_at_round: Vec<f64>,
}

impl ArmSeries {
    pub fn len(&self) -> usize {
        self.pulls_cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pulls_cumulative.is_empty()
    }

    /// Whether the arm was pulled in round `i`.
    pub fn pulled_at(&self, i: usize) -> bool {
        match i {
            0 => self.pulls_cumulative.first().is_some_and(|&n| n > 0),
            _ => match (self.pulls_cumulative.get(i - 1), self.pulls_cumulative.get(i)) {
                (Some(prev), Some(cur)) => cur > prev,
                _ => false,
            },
        }
    }

    pub fn total_pulls(&self) -> u64 {
        self.pulls_cumulative.last().copied().unwrap_or(0)
    }

    pub fn total_reward(&self) -> f64 {
        self.rewards_cumulative.last().copied().unwrap_or(0.0)
    }

    fn push(&mut self, pulled: bool, reward: f64) {
        let prev_pulls = self.total_pulls();
        let prev_reward = self.total_reward();
        if pulled {
            self.pulls_cumulative.push(prev_pulls + 1);
            self.rewards_cumulative.push(prev_reward + reward);
            self.reward_at_round.push(reward);
        } else {
            self.pulls_cumulative.push(prev_pulls);
            self.rewards_cumulative.push(prev_reward);
            self.reward_at_round.push(0.0);
        }
    }
}

/// Per-arm cumulative pull/reward ledger over a fixed arm set.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    arms: Vec<String>,
    series: Vec<ArmSeries>,
    rounds: usize,
}

impl Ledger {
    /// Empty ledger over `arms`; the arm set is fixed from here on.
    pub fn new(arms: &[String]) -> Self {
        Self {
            arms: arms.to_vec(),
            series: vec![ArmSeries::default(); arms.len()],
            rounds: 0,
        }
    }

    pub fn arms(&self) -> &[String] {
        &self.arms
    }

    /// Number of rounds recorded.
    pub fn len(&self) -> usize {
        self.rounds
    }

    pub fn is_empty(&self) -> bool {
        self.rounds == 0
    }

    fn index_of(&self, arm: &str) -> Result<usize> {
        self.arms
            .iter()
            .position(|a| a == arm)
            .ok_or_else(|| Error::UnknownArm(arm.to_string()))
    }

    /// Append one synchronized entry to every arm for `round_index`.
    ///
    /// Rounds must be recorded contiguously from 0; the ledger never dedupes,
    /// so recording a round twice is reported instead of silently appended.
    pub fn record(&mut self, round_index: usize, arm_pulled: &str, reward: f64) -> Result<()> {
        let pulled = self.index_of(arm_pulled)?;
        if round_index != self.rounds {
            return Err(Error::RoundOutOfOrder {
                expected: self.rounds,
                got: round_index,
            });
        }
        for (i, s) in self.series.iter_mut().enumerate() {
            s.push(i == pulled, reward);
        }
        self.rounds += 1;
        Ok(())
    }

    pub fn series(&self, arm: &str) -> Option<&ArmSeries> {
        self.index_of(arm).ok().map(|i| &self.series[i])
    }

    pub fn pulls_cumulative(&self, arm: &str) -> Option<&[u64]> {
        self.series(arm).map(|s| s.pulls_cumulative.as_slice())
    }

    pub fn rewards_cumulative(&self, arm: &str) -> Option<&[f64]> {
        self.series(arm).map(|s| s.rewards_cumulative.as_slice())
    }

    pub fn reward_at_round(&self, arm: &str) -> Option<&[f64]> {
        self.series(arm).map(|s| s.reward_at_round.as_slice())
    }

    /// Sum of all arms' cumulative pulls at round `i` (equals `i + 1`).
    pub fn total_pulls_at(&self, i: usize) -> u64 {
        self.series
            .iter()
            .filter_map(|s| s.pulls_cumulative.get(i))
            .sum()
    }

    /// Total reward collected across all arms so far.
    pub fn total_reward(&self) -> f64 {
        self.series.iter().map(ArmSeries::total_reward).sum()
    }

    /// Owned, arm-keyed copy for external readers.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            rounds: self.rounds,
            arms: self
                .arms
                .iter()
                .cloned()
                .zip(self.series.iter().cloned())
                .collect(),
        }
    }
}

/// Read-only copy of a [`Ledger`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LedgerSnapshot {
    pub rounds: usize,
    pub arms: BTreeMap<String, ArmSeries>,
}

/// Per-round history of the policy's expectation estimates.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectationLog {
    arms: Vec<String>,
    series: Vec<Vec<f64>>,
}

impl ExpectationLog {
    pub fn new(arms: &[String]) -> Self {
        Self {
            arms: arms.to_vec(),
            series: vec![Vec::new(); arms.len()],
        }
    }

    /// Append `times` copies of one snapshot (aligned with the arm order).
    pub(crate) fn push_replicated(&mut self, snapshot: &[f64], times: usize) {
        for (s, &v) in self.series.iter_mut().zip(snapshot) {
            s.extend(std::iter::repeat(v).take(times));
        }
    }

    pub(crate) fn push(&mut self, snapshot: &[f64]) {
        self.push_replicated(snapshot, 1);
    }

    /// Number of rounds covered.
    pub fn len(&self) -> usize {
        self.series.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn arms(&self) -> &[String] {
        &self.arms
    }

    pub fn get(&self, arm: &str) -> Option<&[f64]> {
        self.arms
            .iter()
            .position(|a| a == arm)
            .map(|i| self.series[i].as_slice())
    }

    /// Latest estimate per arm.
    pub fn latest(&self) -> BTreeMap<String, f64> {
        self.arms
            .iter()
            .zip(&self.series)
            .filter_map(|(a, s)| s.last().map(|&v| (a.clone(), v)))
            .collect()
    }

    pub fn to_map(&self) -> BTreeMap<String, Vec<f64>> {
        self.arms.iter().cloned().zip(self.series.iter().cloned()).collect()
    }
}
