//! E2E test suite entry point.

#[path = "../common/mod.rs"]
mod common;
mod sweep_workflow;
