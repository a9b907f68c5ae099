//! Unit test suite entry point.

mod config_tests;
mod sampler_tests;
