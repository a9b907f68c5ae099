//! Thompson sampling over Gaussian arms with unknown mean and variance.
//!
//! Each arm carries a Normal-Inverse-Gamma posterior. A run force-pulls every
//! arm `num_initial_pulls` times, seeds the posteriors from those averages,
//! then for every adaptive round draws a precision and a mean per arm, picks
//! an arm, observes its reward, and applies the conjugate update to that arm.

use rand::Rng;
use rand_distr::{Distribution, Gamma, Normal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, TsimError};

use super::environment::Bandit;
use super::selection::{PropensityPolicy, SoftmaxPropensity, thompson_arm_pull};
use super::types::{PosteriorDraw, PriorParams, PullMode};

pub const BANNER: &str = "---------------Running Thompson Sampling ---------------";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Exponent in `3 - 2 * alpha` that sets how many forced pulls each arm gets.
    pub initial_pull_alpha: i32,
    /// Lower bound on forced pulls per arm; two are needed for a variance.
    pub min_initial_pulls: usize,
    pub prior_alpha: f64,
    pub prior_beta: f64,
    /// Floor for precision draws: anything below it, including zero, negative
    /// and NaN draws, is clamped up to this value.
    pub min_precision: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            initial_pull_alpha: -1,
            min_initial_pulls: 2,
            prior_alpha: 0.5,
            prior_beta: 0.5,
            min_precision: 1e-12,
        }
    }
}

impl SamplerConfig {
    #[must_use]
    pub fn num_initial_pulls(&self) -> usize {
        let from_alpha = 3_i64 - 2 * i64::from(self.initial_pull_alpha);
        usize::try_from(from_alpha)
            .unwrap_or(0)
            .max(self.min_initial_pulls)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_initial_pulls() == 0 {
            return Err(TsimError::Config(
                "sampler must force at least one pull per arm".to_string(),
            ));
        }
        if !(self.prior_alpha.is_finite() && self.prior_alpha > 0.0) {
            return Err(TsimError::Config(format!(
                "sampler.prior_alpha must be positive, got {}",
                self.prior_alpha
            )));
        }
        if !(self.prior_beta.is_finite() && self.prior_beta > 0.0) {
            return Err(TsimError::Config(format!(
                "sampler.prior_beta must be positive, got {}",
                self.prior_beta
            )));
        }
        if !(self.min_precision.is_finite() && self.min_precision > 0.0) {
            return Err(TsimError::Config(format!(
                "sampler.min_precision must be positive, got {}",
                self.min_precision
            )));
        }
        Ok(())
    }
}

/// What happened in one adaptive round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    pub arm: usize,
    pub reward: f64,
    pub draws: Vec<PosteriorDraw>,
    pub propensities: Option<Vec<f64>>,
    pub prior: PriorParams,
    pub posterior: PriorParams,
}

pub struct ThompsonSampler {
    config: SamplerConfig,
    mode: PullMode,
    policy: Box<dyn PropensityPolicy>,
    posteriors: Vec<PriorParams>,
    clamped_draws: u64,
}

impl ThompsonSampler {
    pub fn new(
        config: SamplerConfig,
        mode: PullMode,
        policy: Box<dyn PropensityPolicy>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            mode,
            policy,
            posteriors: Vec::new(),
            clamped_draws: 0,
        })
    }

    #[must_use]
    pub fn with_defaults(mode: PullMode) -> Self {
        Self {
            config: SamplerConfig::default(),
            mode,
            policy: Box::new(SoftmaxPropensity::default()),
            posteriors: Vec::new(),
            clamped_draws: 0,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SamplerConfig {
        &self.config
    }

    #[must_use]
    pub const fn mode(&self) -> PullMode {
        self.mode
    }

    #[must_use]
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Current per-arm posteriors; empty until [`Self::initialize`] runs.
    #[must_use]
    pub fn posteriors(&self) -> &[PriorParams] {
        &self.posteriors
    }

    /// Number of precision draws that had to be clamped to `min_precision`.
    #[must_use]
    pub const fn clamped_draws(&self) -> u64 {
        self.clamped_draws
    }

    #[must_use]
    pub fn num_initial_pulls(&self) -> usize {
        self.config.num_initial_pulls()
    }

    /// Rounds left for adaptive pulls once every arm has been forced.
    #[must_use]
    pub fn adaptive_rounds(&self, num_arms: usize, num_rounds: usize) -> usize {
        num_rounds.saturating_sub(self.num_initial_pulls() * num_arms)
    }

    /// Force-pull every arm in index order, then seed one prior per arm.
    pub fn initialize<R: Rng>(&mut self, bandit: &mut Bandit, rng: &mut R) -> Result<()> {
        let num_arms = bandit.num_arms();
        for _ in 0..self.num_initial_pulls() {
            for arm in 0..num_arms {
                match self.mode {
                    PullMode::MonteCarlo => {
                        let one_hot: Vec<f64> = (0..num_arms)
                            .map(|i| if i == arm { 1.0 } else { 0.0 })
                            .collect();
                        bandit.pull_arm(arm, Some(one_hot.as_slice()), rng)?;
                    }
                    PullMode::Single => {
                        bandit.pull_arm(arm, None, rng)?;
                    }
                }
            }
        }
        self.seed_priors(bandit);
        Ok(())
    }

    fn seed_priors(&mut self, bandit: &Bandit) {
        #[allow(clippy::cast_precision_loss)]
        let n0 = self.num_initial_pulls() as f64;
        self.posteriors = bandit
            .avg_reward_tracker()
            .iter()
            .map(|avg| PriorParams::new(*avg, n0, self.config.prior_alpha, self.config.prior_beta))
            .collect();
        debug!(arms = self.posteriors.len(), n0, "seeded priors");
    }

    /// Draw `tau ~ Gamma(alpha, rate = beta)` and `mu ~ Normal(mu0, 1/(n0 tau))`
    /// for every arm.
    pub fn draw<R: Rng>(&mut self, rng: &mut R) -> Result<Vec<PosteriorDraw>> {
        let mut draws = Vec::with_capacity(self.posteriors.len());
        for (arm, prior) in self.posteriors.iter().enumerate() {
            let gamma = Gamma::new(prior.alpha, 1.0 / prior.beta)
                .map_err(|err| TsimError::Distribution(format!("arm {arm} precision: {err}")))?;
            let raw_tau = gamma.sample(rng);
            let tau = clamp_precision(raw_tau, self.config.min_precision);
            if tau.to_bits() != raw_tau.to_bits() {
                self.clamped_draws += 1;
                debug!(arm, raw_tau, tau, "clamped precision draw");
            }

            let std_dev = (prior.n0 * tau).sqrt().recip();
            let normal = Normal::new(prior.mu0, std_dev)
                .map_err(|err| TsimError::Distribution(format!("arm {arm} mean: {err}")))?;
            draws.push(PosteriorDraw {
                tau,
                mu: normal.sample(rng),
            });
        }
        Ok(draws)
    }

    /// One adaptive round: draw, select, pull, update the chosen arm.
    pub fn step<R: Rng>(&mut self, bandit: &mut Bandit, rng: &mut R) -> Result<RoundOutcome> {
        if self.posteriors.len() != bandit.num_arms() {
            return Err(TsimError::ValidationFailed(format!(
                "sampler has {} posteriors for {} arms; initialize first",
                self.posteriors.len(),
                bandit.num_arms()
            )));
        }

        let draws = self.draw(rng)?;
        let means: Vec<f64> = draws.iter().map(|d| d.mu).collect();
        let vars: Vec<f64> = draws.iter().map(PosteriorDraw::variance).collect();

        let pull = thompson_arm_pull(&means, &vars, self.mode, self.policy.as_ref(), rng)?;
        let arm = pull.arm();
        bandit.pull_arm(arm, pull.propensities(), rng)?;
        let reward = bandit
            .last_reward()
            .ok_or_else(|| TsimError::Numeric("bandit recorded no reward".to_string()))?;

        let prior = self.posteriors[arm];
        let posterior = prior.posterior(reward);
        if !posterior.is_valid() {
            return Err(TsimError::Numeric(format!(
                "arm {arm} posterior {posterior:?} after reward {reward} is invalid"
            )));
        }
        self.posteriors[arm] = posterior;

        debug!(
            arm,
            reward,
            mu0 = posterior.mu0,
            n0 = posterior.n0,
            beta = posterior.beta,
            "updated posterior"
        );

        Ok(RoundOutcome {
            arm,
            reward,
            draws,
            propensities: pull.propensities().map(<[f64]>::to_vec),
            prior,
            posterior,
        })
    }

    /// Run the full schedule: forced pulls, then every adaptive round.
    pub fn run<R: Rng>(
        &mut self,
        bandit: &mut Bandit,
        num_rounds: usize,
        rng: &mut R,
    ) -> Result<()> {
        info!("{BANNER}");
        self.initialize(bandit, rng)?;

        let adaptive = self.adaptive_rounds(bandit.num_arms(), num_rounds);
        info!(
            bandit = bandit.name(),
            arms = bandit.num_arms(),
            initial_pulls = self.num_initial_pulls(),
            adaptive,
            mode = self.mode.as_str(),
            "starting adaptive rounds"
        );
        for _ in 0..adaptive {
            self.step(bandit, rng)?;
        }
        Ok(())
    }
}

/// Keeps a precision draw usable as `1/tau`.
#[must_use]
pub fn clamp_precision(tau: f64, min_precision: f64) -> f64 {
    if tau.is_finite() && tau >= min_precision {
        tau
    } else if tau.is_finite() || tau.is_nan() || tau < 0.0 {
        min_precision
    } else {
        f64::MAX
    }
}

/// Run Thompson sampling with the default sampler and return the final
/// posteriors.
pub fn thompson_sampling<R: Rng>(
    bandit: &mut Bandit,
    num_rounds: usize,
    mode: PullMode,
    rng: &mut R,
) -> Result<Vec<PriorParams>> {
    let mut sampler = ThompsonSampler::with_defaults(mode);
    sampler.run(bandit, num_rounds, rng)?;
    Ok(sampler.posteriors().to_vec())
}
