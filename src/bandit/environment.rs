use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TsimError};

use super::types::PullRecord;

/// Tolerance used when checking that a propensity vector sums to one.
pub const PROPENSITY_TOLERANCE: f64 = 1e-9;

/// Simulated Gaussian bandit: each arm pays `Normal(mean, sqrt(var))`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bandit {
    name: String,
    arm_means: Vec<f64>,
    arm_vars: Vec<f64>,
    pulls: Vec<PullRecord>,
    avg_reward_tracker: Vec<f64>,
    pull_counts: Vec<u64>,
    /// Running sum of `reward / propensity` per arm over weighted pulls.
    ips_sums: Vec<f64>,
    weighted_pulls: u64,
}

impl Bandit {
    pub fn new(name: impl Into<String>, arm_means: Vec<f64>, arm_vars: Vec<f64>) -> Result<Self> {
        if arm_means.is_empty() {
            return Err(TsimError::ValidationFailed(
                "bandit needs at least one arm".to_string(),
            ));
        }
        if arm_means.len() != arm_vars.len() {
            return Err(TsimError::ValidationFailed(format!(
                "{} arm means but {} arm variances",
                arm_means.len(),
                arm_vars.len()
            )));
        }
        if let Some((i, mean)) = arm_means.iter().enumerate().find(|(_, m)| !m.is_finite()) {
            return Err(TsimError::ValidationFailed(format!(
                "arm {i} mean must be finite, got {mean}"
            )));
        }
        if let Some((i, var)) = arm_vars
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(TsimError::ValidationFailed(format!(
                "arm {i} variance must be finite and non-negative, got {var}"
            )));
        }

        let num_arms = arm_means.len();
        Ok(Self {
            name: name.into(),
            arm_means,
            arm_vars,
            pulls: Vec::new(),
            avg_reward_tracker: vec![0.0; num_arms],
            pull_counts: vec![0; num_arms],
            ips_sums: vec![0.0; num_arms],
            weighted_pulls: 0,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn num_arms(&self) -> usize {
        self.arm_means.len()
    }

    #[must_use]
    pub fn arm_means(&self) -> &[f64] {
        &self.arm_means
    }

    #[must_use]
    pub fn arm_vars(&self) -> &[f64] {
        &self.arm_vars
    }

    /// Running average reward per arm.
    #[must_use]
    pub fn avg_reward_tracker(&self) -> &[f64] {
        &self.avg_reward_tracker
    }

    /// Every observed reward, in pull order.
    #[must_use]
    pub fn reward_tracker(&self) -> Vec<f64> {
        self.pulls.iter().map(|p| p.reward).collect()
    }

    #[must_use]
    pub fn last_reward(&self) -> Option<f64> {
        self.pulls.last().map(|p| p.reward)
    }

    #[must_use]
    pub fn pulls(&self) -> &[PullRecord] {
        &self.pulls
    }

    #[must_use]
    pub fn pull_counts(&self) -> &[u64] {
        &self.pull_counts
    }

    #[must_use]
    pub fn total_pulls(&self) -> usize {
        self.pulls.len()
    }

    /// Index of the arm with the highest true mean (lowest index on ties).
    #[must_use]
    pub fn best_arm(&self) -> usize {
        let mut best = 0;
        for (i, mean) in self.arm_means.iter().enumerate().skip(1) {
            if *mean > self.arm_means[best] {
                best = i;
            }
        }
        best
    }

    /// Pull `arm`, append the reward to the history, and return it.
    ///
    /// When `propensities` is given it must cover every arm, be non-negative,
    /// and sum to one; the pulled arm's entry is kept for inverse-propensity
    /// weighting.
    pub fn pull_arm<R: Rng + ?Sized>(
        &mut self,
        arm: usize,
        propensities: Option<&[f64]>,
        rng: &mut R,
    ) -> Result<f64> {
        let num_arms = self.num_arms();
        if arm >= num_arms {
            return Err(TsimError::InvalidArm { arm, num_arms });
        }

        let propensity = match propensities {
            Some(props) => Some(self.check_propensities(props)?[arm]),
            None => None,
        };

        let normal = Normal::new(self.arm_means[arm], self.arm_vars[arm].sqrt())
            .map_err(|err| TsimError::Distribution(format!("arm {arm} reward: {err}")))?;
        let reward = normal.sample(rng);

        self.pull_counts[arm] += 1;
        #[allow(clippy::cast_precision_loss)]
        let count = self.pull_counts[arm] as f64;
        self.avg_reward_tracker[arm] += (reward - self.avg_reward_tracker[arm]) / count;

        if let Some(p) = propensity {
            self.weighted_pulls += 1;
            if p > 0.0 {
                self.ips_sums[arm] += reward / p;
            }
        }

        self.pulls.push(PullRecord {
            round: self.pulls.len(),
            arm,
            reward,
            propensity,
        });
        Ok(reward)
    }

    /// Inverse-propensity estimate of each arm's mean reward over all pulls
    /// that carried a propensity vector. `None` until such a pull happens.
    #[must_use]
    pub fn ips_estimates(&self) -> Option<Vec<f64>> {
        if self.weighted_pulls == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.weighted_pulls as f64;
        Some(self.ips_sums.iter().map(|sum| sum / n).collect())
    }

    fn check_propensities<'a>(&self, props: &'a [f64]) -> Result<&'a [f64]> {
        if props.len() != self.num_arms() {
            return Err(TsimError::PropensityMismatch {
                expected: self.num_arms(),
                actual: props.len(),
            });
        }
        if let Some(p) = props.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(TsimError::InvalidPropensities(format!(
                "entries must be finite and non-negative, got {p}"
            )));
        }
        let total: f64 = props.iter().sum();
        if (total - 1.0).abs() > PROPENSITY_TOLERANCE {
            return Err(TsimError::InvalidPropensities(format!(
                "entries must sum to 1, got {total}"
            )));
        }
        Ok(props)
    }
}
