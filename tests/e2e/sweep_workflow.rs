use serde_json::Value;
use tempfile::tempdir;

use tsim::config::Config;
use tsim::simulation::{Simulation, sweep};

use super::common::isolated_tsim;

#[test]
fn sweep_matches_independent_runs() {
    let config = Config::default();
    let report = sweep(&config, 40, 6).unwrap();

    assert_eq!(report.runs.len(), 6);
    for summary in &report.runs {
        let single = Simulation::with_seed(&config, summary.seed).unwrap().run().unwrap();
        assert!((single.cumulative_regret - summary.cumulative_regret).abs() < 1e-9);
        assert!((single.adaptive_fraction(2) - summary.best_fraction).abs() < 1e-12);
    }
}

#[test]
fn sweep_reports_best_arm_winning() {
    let report = sweep(&Config::default(), 0, 50).unwrap();
    assert_eq!(report.best_arm, 2);
    assert_eq!(report.worst_arm, 0);
    assert!(report.win_fraction() >= 0.9, "win fraction {}", report.win_fraction());
}

#[test]
fn sweep_rejects_zero_seeds() {
    assert!(sweep(&Config::default(), 0, 0).is_err());
}

#[test]
fn sweep_cli_uses_config_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("sweep.toml");
    std::fs::write(
        &config_path,
        "[simulation]\narm_means = [0.0, 5.0]\narm_vars = [1.0, 1.0]\nnum_rounds = 60\n",
    )
    .unwrap();

    let output = isolated_tsim(dir.path())
        .arg("--robot")
        .arg("--config")
        .arg(&config_path)
        .args(["sweep", "--seeds", "8"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    let data = &json["data"];
    assert_eq!(data["best_arm"], 1);
    assert_eq!(data["worst_arm"], 0);
    assert_eq!(data["runs"].as_array().unwrap().len(), 8);
    assert_eq!(data["best_beats_worst"], 8);
}
