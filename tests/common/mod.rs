//! Helpers shared by the integration suites.

use std::path::Path;

use assert_cmd::Command;
use tsim::config::ENV_OVERRIDES;

/// A `tsim` process that ignores the caller's config files and `TSIM_*`
/// overrides.
pub fn isolated_process(dir: &Path) -> std::process::Command {
    let bin = assert_cmd::cargo::cargo_bin("tsim");
    let mut cmd = std::process::Command::new(bin);
    cmd.current_dir(dir).env_remove("RUST_LOG");
    for key in ENV_OVERRIDES {
        cmd.env_remove(key);
    }
    cmd.env("TSIM_CONFIG", dir.join("missing-config.toml"));
    cmd
}

/// [`isolated_process`] wrapped for `assert_cmd` assertions.
pub fn isolated_tsim(dir: &Path) -> Command {
    Command::from_std(isolated_process(dir))
}
