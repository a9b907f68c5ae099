//! tsim - Thompson sampling simulator
//!
//! Simulates Thompson sampling over Gaussian arms whose mean and variance are
//! both unknown, using a Normal-Inverse-Gamma conjugate prior per arm.

pub mod app;
pub mod bandit;
pub mod cli;
pub mod config;
pub mod error;
pub mod simulation;
pub mod test_utils;

pub use error::{Result, TsimError};
