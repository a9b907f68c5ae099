use std::path::PathBuf;

use tsim::bandit::{PolicyKind, PullMode};
use tsim::config::{Config, parse_f64_list};
use tsim::test_utils::{Case, SetupCase, UnitTestFixture, run_setup_cases};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/configs")
        .join(name)
}

#[test]
fn default_fixture_matches_builtin_defaults() {
    let raw = std::fs::read_to_string(fixture_path("default.toml")).unwrap();
    let config = Config::from_toml(&raw).unwrap();
    let defaults = Config::default();

    assert_eq!(config.simulation.name, defaults.simulation.name);
    assert_eq!(config.simulation.arm_means, defaults.simulation.arm_means);
    assert_eq!(config.simulation.arm_vars, defaults.simulation.arm_vars);
    assert_eq!(config.simulation.num_rounds, defaults.simulation.num_rounds);
    assert_eq!(config.simulation.mode, PullMode::Single);
    assert_eq!(config.sampler.num_initial_pulls(), 5);
    config.validate().unwrap();
}

#[test]
fn custom_fixture_overrides_every_table() {
    let raw = std::fs::read_to_string(fixture_path("custom.toml")).unwrap();
    let config = Config::from_toml(&raw).unwrap();

    assert_eq!(config.simulation.name, "ads");
    assert_eq!(config.simulation.arm_means.len(), 4);
    assert_eq!(config.simulation.mode, PullMode::MonteCarlo);
    assert_eq!(config.simulation.seed, Some(1234));
    assert_eq!(config.sampler.initial_pull_alpha, 0);
    assert_eq!(config.sampler.num_initial_pulls(), 3);
    assert!((config.sampler.prior_beta - 2.0).abs() < f64::EPSILON);
    assert_eq!(config.selection.policy, PolicyKind::WinRate);
    assert_eq!(config.selection.samples, 250);
    // untouched key keeps its default
    assert!((config.selection.temperature - 1.0).abs() < f64::EPSILON);
    config.validate().unwrap();
}

#[test]
fn explicit_config_path_skips_project_file() {
    let fixture = UnitTestFixture::new();
    let _ = fixture.create_project_config("[simulation]\nname = \"project\"\n");
    let explicit = fixture.create_file(
        "explicit.toml",
        "[simulation]\nname = \"explicit\"\nnum_rounds = 12\n",
    );

    let config = Config::load(Some(&explicit), &fixture.data_path).unwrap();
    assert_eq!(config.simulation.name, "explicit");
    assert_eq!(config.simulation.num_rounds, 12);
}

#[test]
fn missing_explicit_config_falls_back_to_defaults() {
    let fixture = UnitTestFixture::new();
    let missing = fixture.data_path.join("nope.toml");
    let config = Config::load(Some(&missing), &fixture.data_path).unwrap();
    assert_eq!(config.simulation.arm_means, vec![1.0, 2.0, 3.0]);
}

#[test]
fn malformed_config_is_a_config_error() {
    let fixture = UnitTestFixture::new();
    let path = fixture.create_file("broken.toml", "[simulation\nname = 3");
    let err = Config::load(Some(&path), &fixture.data_path).unwrap_err();
    assert!(matches!(err, tsim::TsimError::Config(_)));
}

fn row(
    name: &'static str,
    edit: fn(&mut Config),
    expected: Result<(), &'static str>,
) -> SetupCase {
    Case {
        name,
        input: edit,
        expected,
    }
}

#[test]
fn setup_table() {
    let cases = vec![
        row("defaults", |_| {}, Ok(())),
        row(
            "no arms",
            |c| {
                c.simulation.arm_means.clear();
                c.simulation.arm_vars.clear();
            },
            Err("config_error"),
        ),
        row(
            "length mismatch",
            |c| c.simulation.arm_vars.push(1.0),
            Err("config_error"),
        ),
        row(
            "negative variance reaches the bandit",
            |c| c.simulation.arm_vars[1] = -1.0,
            Err("validation_failed"),
        ),
        row(
            "non-finite mean reaches the bandit",
            |c| c.simulation.arm_means[0] = f64::NAN,
            Err("validation_failed"),
        ),
        row(
            "zero prior beta",
            |c| c.sampler.prior_beta = 0.0,
            Err("config_error"),
        ),
        row(
            "zero temperature",
            |c| c.selection.temperature = 0.0,
            Err("config_error"),
        ),
        row(
            "zero temperature ignored by win rate",
            |c| {
                c.selection.policy = PolicyKind::WinRate;
                c.selection.temperature = 0.0;
            },
            Ok(()),
        ),
        row(
            "zero propensity floor",
            |c| c.selection.min_propensity = 0.0,
            Err("config_error"),
        ),
        row(
            "propensity floor of one",
            |c| c.selection.min_propensity = 1.0,
            Err("config_error"),
        ),
        row("zero rounds", |c| c.simulation.num_rounds = 0, Ok(())),
    ];

    run_setup_cases(cases).unwrap();
}

#[test]
fn float_lists_parse_with_blanks_and_negatives() {
    assert_eq!(parse_f64_list("1, -2.5,,3").unwrap(), vec![1.0, -2.5, 3.0]);
    assert!(parse_f64_list("1,x").is_err());
    assert!(parse_f64_list("").unwrap().is_empty());
}
