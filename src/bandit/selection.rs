//! Arm selection from one round of posterior draws.
//!
//! `single` pulls the arm with the largest sampled mean. `monte_carlo` turns
//! the draws into a propensity vector through a [`PropensityPolicy`] and
//! samples the arm from it, so downstream code can importance-weight the
//! observed rewards.

use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::{Rng, RngCore};
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TsimError};

use super::types::PullMode;

/// Outcome of [`thompson_arm_pull`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArmPull {
    Single(usize),
    MonteCarlo { arm: usize, propensities: Vec<f64> },
}

impl ArmPull {
    #[must_use]
    pub const fn arm(&self) -> usize {
        match self {
            Self::Single(arm) | Self::MonteCarlo { arm, .. } => *arm,
        }
    }

    #[must_use]
    pub fn propensities(&self) -> Option<&[f64]> {
        match self {
            Self::Single(_) => None,
            Self::MonteCarlo { propensities, .. } => Some(propensities),
        }
    }
}

/// Maps sampled means and variances to a probability distribution over arms.
///
/// Implementations must return one non-negative entry per arm, summing to one,
/// with non-zero mass on every arm whose variance is finite.
pub trait PropensityPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn propensities(
        &self,
        means: &[f64],
        vars: &[f64],
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Temperature softmax over sampled means
    #[default]
    Softmax,
    /// Monte Carlo probability that each arm is best
    WinRate,
}

impl PolicyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Softmax => "softmax",
            Self::WinRate => "win_rate",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "softmax" => Some(Self::Softmax),
            "win_rate" | "win-rate" | "winrate" => Some(Self::WinRate),
            _ => None,
        }
    }
}

/// Softmax of `mean / temperature`, mixed with a uniform floor.
#[derive(Debug, Clone, Copy)]
pub struct SoftmaxPropensity {
    pub temperature: f64,
    pub min_propensity: f64,
}

impl Default for SoftmaxPropensity {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            min_propensity: 1e-6,
        }
    }
}

impl PropensityPolicy for SoftmaxPropensity {
    fn name(&self) -> &'static str {
        PolicyKind::Softmax.as_str()
    }

    fn propensities(
        &self,
        means: &[f64],
        vars: &[f64],
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>> {
        check_inputs(means, vars)?;
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(TsimError::Config(format!(
                "softmax temperature must be positive, got {}",
                self.temperature
            )));
        }

        let scores: Vec<f64> = means
            .iter()
            .map(|m| if m.is_finite() { m / self.temperature } else { f64::NEG_INFINITY })
            .collect();
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let raw: Vec<f64> = if max.is_finite() {
            scores.iter().map(|s| (s - max).exp()).collect()
        } else {
            vec![1.0; scores.len()]
        };
        Ok(with_floor(&raw, vars, self.min_propensity))
    }
}

/// Monte Carlo estimate of P(arm i has the largest mean), Laplace-smoothed.
#[derive(Debug, Clone, Copy)]
pub struct WinRatePropensity {
    pub samples: usize,
}

impl Default for WinRatePropensity {
    fn default() -> Self {
        Self { samples: 1000 }
    }
}

impl PropensityPolicy for WinRatePropensity {
    fn name(&self) -> &'static str {
        PolicyKind::WinRate.as_str()
    }

    fn propensities(
        &self,
        means: &[f64],
        vars: &[f64],
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>> {
        check_inputs(means, vars)?;
        let normals = means
            .iter()
            .zip(vars)
            .map(|(m, v)| {
                if m.is_finite() && v.is_finite() {
                    Normal::new(*m, v.sqrt())
                        .map(Some)
                        .map_err(|err| TsimError::Distribution(format!("win rate draw: {err}")))
                } else {
                    Ok(None)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let mut wins = vec![0_u64; means.len()];
        let mut draws = vec![f64::NEG_INFINITY; means.len()];
        for _ in 0..self.samples {
            for (slot, normal) in draws.iter_mut().zip(&normals) {
                *slot = normal.as_ref().map_or(f64::NEG_INFINITY, |n| n.sample(&mut *rng));
            }
            if let Some(best) = argmax(&draws) {
                wins[best] += 1;
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let raw: Vec<f64> = wins.iter().map(|w| *w as f64 + 1.0).collect();
        Ok(normalize(&raw))
    }
}

#[must_use]
pub fn policy_for(
    kind: PolicyKind,
    temperature: f64,
    samples: usize,
    min_propensity: f64,
) -> Box<dyn PropensityPolicy> {
    match kind {
        PolicyKind::Softmax => Box::new(SoftmaxPropensity {
            temperature,
            min_propensity,
        }),
        PolicyKind::WinRate => Box::new(WinRatePropensity { samples }),
    }
}

/// Choose an arm from sampled posterior means and variances.
pub fn thompson_arm_pull<R: Rng>(
    mean_lis: &[f64],
    var_lis: &[f64],
    mode: PullMode,
    policy: &dyn PropensityPolicy,
    rng: &mut R,
) -> Result<ArmPull> {
    check_inputs(mean_lis, var_lis)?;
    match mode {
        PullMode::Single => argmax(mean_lis)
            .map(ArmPull::Single)
            .ok_or_else(|| TsimError::Numeric("no finite sampled mean".to_string())),
        PullMode::MonteCarlo => {
            let propensities = policy.propensities(mean_lis, var_lis, &mut *rng)?;
            let index = WeightedIndex::new(&propensities)
                .map_err(|err| TsimError::InvalidPropensities(err.to_string()))?;
            let arm = index.sample(rng);
            Ok(ArmPull::MonteCarlo { arm, propensities })
        }
    }
}

/// Index of the largest value; the lowest index wins exact ties and NaN is
/// never chosen while a comparable value exists.
#[must_use]
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some(b) if *value <= values[b] => {}
            _ => best = Some(i),
        }
    }
    best
}

fn check_inputs(means: &[f64], vars: &[f64]) -> Result<()> {
    if means.is_empty() {
        return Err(TsimError::ValidationFailed("no arms to select from".to_string()));
    }
    if means.len() != vars.len() {
        return Err(TsimError::ValidationFailed(format!(
            "{} sampled means but {} variances",
            means.len(),
            vars.len()
        )));
    }
    Ok(())
}

fn normalize(raw: &[f64]) -> Vec<f64> {
    let total: f64 = raw.iter().sum();
    if total > 0.0 && total.is_finite() {
        raw.iter().map(|r| r / total).collect()
    } else {
        #[allow(clippy::cast_precision_loss)]
        let uniform = 1.0 / raw.len() as f64;
        vec![uniform; raw.len()]
    }
}

/// Normalizes `raw`, then gives every finite-variance arm at least
/// `min_propensity` of the mass. The floor never drops below the smallest
/// positive `f64`, so an underflowed softmax weight still leaves the arm
/// reachable.
fn with_floor(raw: &[f64], vars: &[f64], min_propensity: f64) -> Vec<f64> {
    let base = normalize(raw);
    let eligible = vars.iter().filter(|v| v.is_finite()).count();
    if eligible == 0 {
        return base;
    }
    #[allow(clippy::cast_precision_loss)]
    let floor = min_propensity
        .max(f64::MIN_POSITIVE)
        .min(1.0 / eligible as f64);
    #[allow(clippy::cast_precision_loss)]
    let keep = floor.mul_add(-(eligible as f64), 1.0);
    let mixed: Vec<f64> = base
        .iter()
        .zip(vars)
        .map(|(p, v)| if v.is_finite() { p.mul_add(keep, floor) } else { p * keep })
        .collect();
    normalize(&mixed)
}
