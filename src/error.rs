use thiserror::Error;

pub type Result<T> = std::result::Result<T, TsimError>;

#[derive(Debug, Error)]
pub enum TsimError {
    #[error("config error: {0}")]
    Config(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("arm {arm} out of range (bandit has {num_arms} arms)")]
    InvalidArm { arm: usize, num_arms: usize },

    #[error("propensity vector has {actual} entries, expected {expected}")]
    PropensityMismatch { expected: usize, actual: usize },

    #[error("invalid propensities: {0}")]
    InvalidPropensities(String),

    #[error("distribution error: {0}")]
    Distribution(String),

    #[error("numeric error: {0}")]
    Numeric(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TsimError {
    /// Stable machine-readable code used in robot-mode error output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::ValidationFailed(_)
            | Self::InvalidArm { .. }
            | Self::PropensityMismatch { .. }
            | Self::InvalidPropensities(_) => "validation_failed",
            Self::Distribution(_) | Self::Numeric(_) => "numeric_error",
            Self::Io(_) | Self::Serialization(_) => "error",
        }
    }
}
