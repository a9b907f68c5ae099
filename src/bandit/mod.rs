//! Gaussian bandit and Normal-Inverse-Gamma Thompson sampling.
//!
//! - `Bandit`: ground-truth arms, pull history, running averages
//! - `thompson_arm_pull`: `single` / `monte_carlo` arm selection
//! - `ThompsonSampler`: forced pulls, prior seeding, adaptive posterior updates

pub mod environment;
pub mod selection;
pub mod thompson;
pub mod types;

pub use environment::{Bandit, PROPENSITY_TOLERANCE};
pub use selection::{
    ArmPull, PolicyKind, PropensityPolicy, SoftmaxPropensity, WinRatePropensity, argmax,
    policy_for, thompson_arm_pull,
};
pub use thompson::{
    BANNER, RoundOutcome, SamplerConfig, ThompsonSampler, clamp_precision, thompson_sampling,
};
pub use types::{PosteriorDraw, PriorParams, PullMode, PullRecord};
