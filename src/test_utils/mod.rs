//! Shared test utilities for tsim.

pub mod fixtures;

pub use fixtures::UnitTestFixture;

use std::fmt::Debug;

use crate::config::Config;
use crate::error::Result;
use crate::simulation::Simulation;

/// One row of a table-driven test.
#[derive(Debug, Clone)]
pub struct Case<I, E> {
    pub name: &'static str,
    pub input: I,
    pub expected: E,
}

/// Run `check` over every row and report all mismatching rows together.
pub fn run_cases<I, E, F>(cases: Vec<Case<I, E>>, check: F) -> std::result::Result<(), String>
where
    E: Debug + PartialEq,
    F: Fn(I) -> E,
{
    let failures: Vec<String> = cases
        .into_iter()
        .filter_map(|case| {
            let actual = check(case.input);
            (actual != case.expected).then(|| {
                format!(
                    "{}: expected {:?}, got {:?}",
                    case.name, case.expected, actual
                )
            })
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures.join("\n"))
    }
}

/// Reduce a result to `Ok(())` or the error's robot code, so a table can
/// assert which error kind a failure used.
pub fn outcome<T>(result: Result<T>) -> std::result::Result<(), &'static str> {
    result.map(|_| ()).map_err(|err| err.code())
}

/// Row for [`run_setup_cases`]: an edit to the default config and the
/// expected outcome of building a simulation from it.
pub type SetupCase = Case<fn(&mut Config), std::result::Result<(), &'static str>>;

/// Apply each row's edit to `Config::default()` and build a seeded
/// simulation, which runs config validation and bandit construction.
pub fn run_setup_cases(cases: Vec<SetupCase>) -> std::result::Result<(), String> {
    run_cases(cases, |edit| {
        let mut config = Config::default();
        edit(&mut config);
        outcome(Simulation::with_seed(&config, 0))
    })
}
