//! Running per-arm reward statistics shared by the mean-based policies.

/// Pull count and reward sum for one arm.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmStats {
    pub pulls: u64,
    pub reward_sum: f64,
}

impl ArmStats {
    pub fn push(&mut self, reward: f64) {
        self.pulls = self.pulls.saturating_add(1);
        self.reward_sum += reward;
    }

    /// Mean observed reward, `0.0` before the first pull.
    pub fn mean(&self) -> f64 {
        if self.pulls == 0 {
            0.0
        } else {
            self.reward_sum / self.pulls as f64
        }
    }
}

/// Per-arm means, aligned with `stats`.
pub(crate) fn means(stats: &[ArmStats]) -> Vec<f64> {
    stats.iter().map(ArmStats::mean).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_is_zero_before_first_pull() {
        assert_eq!(ArmStats::default().mean(), 0.0);
    }

    #[test]
    fn mean_tracks_pushes() {
        let mut s = ArmStats::default();
        s.push(1.0);
        s.push(3.0);
        assert_eq!(s.pulls, 2);
        assert_eq!(s.mean(), 2.0);
    }
}
