use serde::{Deserialize, Serialize};

/// Normal-Inverse-Gamma posterior over one arm's (mean, precision).
///
/// `mu0` is the posterior mean estimate, `n0` the pseudo-count backing it,
/// and `alpha`/`beta` the shape and rate of the Gamma over precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorParams {
    pub mu0: f64,
    pub n0: f64,
    pub alpha: f64,
    pub beta: f64,
}

impl PriorParams {
    #[must_use]
    pub const fn new(mu0: f64, n0: f64, alpha: f64, beta: f64) -> Self {
        Self {
            mu0,
            n0,
            alpha,
            beta,
        }
    }

    /// Closed-form conjugate update after observing reward `x`.
    #[must_use]
    pub fn posterior(&self, x: f64) -> Self {
        let n0 = self.n0 + 1.0;
        let deviation = x - self.mu0;
        Self {
            mu0: self.n0.mul_add(self.mu0, x) / n0,
            n0,
            alpha: self.alpha + 0.5,
            beta: (0.5 * (self.n0 / n0)).mul_add(deviation * deviation, self.beta),
        }
    }

    /// Expected precision E[tau] = alpha / beta, if defined.
    #[must_use]
    pub fn expected_precision(&self) -> Option<f64> {
        (self.beta > 0.0).then(|| self.alpha / self.beta)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.mu0.is_finite()
            && self.n0.is_finite()
            && self.n0 > 0.0
            && self.alpha.is_finite()
            && self.alpha > 0.0
            && self.beta.is_finite()
            && self.beta >= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PullMode {
    /// Pull the arm with the largest sampled mean
    #[default]
    Single,
    /// Sample the arm from a propensity vector and log it with the pull
    MonteCarlo,
}

impl PullMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::MonteCarlo => "monte_carlo",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single" => Some(Self::Single),
            "monte_carlo" | "monte-carlo" | "montecarlo" => Some(Self::MonteCarlo),
            _ => None,
        }
    }
}

/// One round's posterior draw for an arm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosteriorDraw {
    pub tau: f64,
    pub mu: f64,
}

impl PosteriorDraw {
    #[must_use]
    pub fn variance(&self) -> f64 {
        1.0 / self.tau
    }
}

/// A single pull recorded by the bandit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRecord {
    pub round: usize,
    pub arm: usize,
    pub reward: f64,
    /// Probability the pulled arm had when it was chosen, if a propensity
    /// vector accompanied the pull.
    pub propensity: Option<f64>,
}
