use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bandit::{PolicyKind, PullMode, SamplerConfig};
use crate::error::{Result, TsimError};

pub const PROJECT_CONFIG_FILE: &str = "tsim.toml";

/// Environment variables that override loaded config values, in the order
/// they are applied. `TSIM_CONFIG` selects the file and is not listed.
pub const ENV_OVERRIDES: &[&str] = &[
    "TSIM_NAME",
    "TSIM_ARM_MEANS",
    "TSIM_ARM_VARS",
    "TSIM_ROUNDS",
    "TSIM_MODE",
    "TSIM_SEED",
    "TSIM_INITIAL_PULL_ALPHA",
    "TSIM_MIN_INITIAL_PULLS",
    "TSIM_PRIOR_ALPHA",
    "TSIM_PRIOR_BETA",
    "TSIM_MIN_PRECISION",
    "TSIM_POLICY",
    "TSIM_TEMPERATURE",
    "TSIM_SAMPLES",
    "TSIM_MIN_PROPENSITY",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, project_dir: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("TSIM_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_patch(&project_dir.join(PROJECT_CONFIG_FILE))? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Parse a full config from TOML text, filling gaps with defaults.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let patch: ConfigPatch =
            toml::from_str(raw).map_err(|err| TsimError::Config(format!("parse config: {err}")))?;
        let mut config = Self::default();
        config.merge_patch(patch);
        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("tsim/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| TsimError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| TsimError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.simulation {
            self.simulation.merge(patch);
        }
        if let Some(patch) = patch.sampler {
            merge_sampler(&mut self.sampler, patch);
        }
        if let Some(patch) = patch.selection {
            self.selection.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_string("TSIM_NAME") {
            self.simulation.name = value;
        }
        if let Some(values) = env_f64_list("TSIM_ARM_MEANS")? {
            self.simulation.arm_means = values;
        }
        if let Some(values) = env_f64_list("TSIM_ARM_VARS")? {
            self.simulation.arm_vars = values;
        }
        if let Some(value) = env_parse::<usize>("TSIM_ROUNDS")? {
            self.simulation.num_rounds = value;
        }
        if let Some(value) = env_string("TSIM_MODE") {
            self.simulation.mode = PullMode::parse(&value).ok_or_else(|| {
                TsimError::Config(format!(
                    "invalid TSIM_MODE value {value} (expected single|monte_carlo)"
                ))
            })?;
        }
        if let Some(value) = env_parse::<u64>("TSIM_SEED")? {
            self.simulation.seed = Some(value);
        }

        if let Some(value) = env_parse::<i32>("TSIM_INITIAL_PULL_ALPHA")? {
            self.sampler.initial_pull_alpha = value;
        }
        if let Some(value) = env_parse::<usize>("TSIM_MIN_INITIAL_PULLS")? {
            self.sampler.min_initial_pulls = value;
        }
        if let Some(value) = env_parse::<f64>("TSIM_PRIOR_ALPHA")? {
            self.sampler.prior_alpha = value;
        }
        if let Some(value) = env_parse::<f64>("TSIM_PRIOR_BETA")? {
            self.sampler.prior_beta = value;
        }
        if let Some(value) = env_parse::<f64>("TSIM_MIN_PRECISION")? {
            self.sampler.min_precision = value;
        }

        if let Some(value) = env_string("TSIM_POLICY") {
            self.selection.policy = PolicyKind::parse(&value).ok_or_else(|| {
                TsimError::Config(format!(
                    "invalid TSIM_POLICY value {value} (expected softmax|win_rate)"
                ))
            })?;
        }
        if let Some(value) = env_parse::<f64>("TSIM_TEMPERATURE")? {
            self.selection.temperature = value;
        }
        if let Some(value) = env_parse::<usize>("TSIM_SAMPLES")? {
            self.selection.samples = value;
        }
        if let Some(value) = env_parse::<f64>("TSIM_MIN_PROPENSITY")? {
            self.selection.min_propensity = value;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;
        if sim.arm_means.is_empty() {
            return Err(TsimError::Config(
                "simulation.arm_means must name at least one arm".to_string(),
            ));
        }
        if sim.arm_means.len() != sim.arm_vars.len() {
            return Err(TsimError::Config(format!(
                "simulation.arm_means has {} entries but simulation.arm_vars has {}",
                sim.arm_means.len(),
                sim.arm_vars.len()
            )));
        }
        self.sampler.validate()?;

        let sel = &self.selection;
        if sel.policy == PolicyKind::Softmax && !(sel.temperature.is_finite() && sel.temperature > 0.0) {
            return Err(TsimError::Config(format!(
                "selection.temperature must be positive, got {}",
                sel.temperature
            )));
        }
        if sel.policy == PolicyKind::WinRate && sel.samples == 0 {
            return Err(TsimError::Config(
                "selection.samples must be at least 1".to_string(),
            ));
        }
        if !(sel.min_propensity > 0.0 && sel.min_propensity < 1.0) {
            return Err(TsimError::Config(format!(
                "selection.min_propensity must be in (0, 1), got {}",
                sel.min_propensity
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub name: String,
    pub arm_means: Vec<f64>,
    pub arm_vars: Vec<f64>,
    pub num_rounds: usize,
    pub mode: PullMode,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            name: "thompson_sampling".to_string(),
            arm_means: vec![1.0, 2.0, 3.0],
            arm_vars: vec![1.0, 1.0, 1.0],
            num_rounds: 100,
            mode: PullMode::Single,
            seed: None,
        }
    }
}

impl SimulationConfig {
    fn merge(&mut self, patch: SimulationPatch) {
        if let Some(value) = patch.name {
            self.name = value;
        }
        if let Some(value) = patch.arm_means {
            self.arm_means = value;
        }
        if let Some(value) = patch.arm_vars {
            self.arm_vars = value;
        }
        if let Some(value) = patch.num_rounds {
            self.num_rounds = value;
        }
        if let Some(value) = patch.mode {
            self.mode = value;
        }
        if let Some(value) = patch.seed {
            self.seed = Some(value);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub policy: PolicyKind,
    pub temperature: f64,
    pub samples: usize,
    pub min_propensity: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Softmax,
            temperature: 1.0,
            samples: 1000,
            min_propensity: 1e-6,
        }
    }
}

impl SelectionConfig {
    fn merge(&mut self, patch: SelectionPatch) {
        if let Some(value) = patch.policy {
            self.policy = value;
        }
        if let Some(value) = patch.temperature {
            self.temperature = value;
        }
        if let Some(value) = patch.samples {
            self.samples = value;
        }
        if let Some(value) = patch.min_propensity {
            self.min_propensity = value;
        }
    }
}

fn merge_sampler(sampler: &mut SamplerConfig, patch: SamplerPatch) {
    if let Some(value) = patch.initial_pull_alpha {
        sampler.initial_pull_alpha = value;
    }
    if let Some(value) = patch.min_initial_pulls {
        sampler.min_initial_pulls = value;
    }
    if let Some(value) = patch.prior_alpha {
        sampler.prior_alpha = value;
    }
    if let Some(value) = patch.prior_beta {
        sampler.prior_beta = value;
    }
    if let Some(value) = patch.min_precision {
        sampler.min_precision = value;
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub simulation: Option<SimulationPatch>,
    pub sampler: Option<SamplerPatch>,
    pub selection: Option<SelectionPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SimulationPatch {
    pub name: Option<String>,
    pub arm_means: Option<Vec<f64>>,
    pub arm_vars: Option<Vec<f64>>,
    pub num_rounds: Option<usize>,
    pub mode: Option<PullMode>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SamplerPatch {
    pub initial_pull_alpha: Option<i32>,
    pub min_initial_pulls: Option<usize>,
    pub prior_alpha: Option<f64>,
    pub prior_beta: Option<f64>,
    pub min_precision: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SelectionPatch {
    pub policy: Option<PolicyKind>,
    pub temperature: Option<f64>,
    pub samples: Option<usize>,
    pub min_propensity: Option<f64>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse::<T>().map(Some).map_err(|err| {
            TsimError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_f64_list(key: &str) -> Result<Option<Vec<f64>>> {
    match std::env::var(key) {
        Ok(value) => parse_f64_list(&value)
            .map(Some)
            .map_err(|err| TsimError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}

/// Parse a comma separated list of floats, ignoring blank entries.
pub fn parse_f64_list(value: &str) -> std::result::Result<Vec<f64>, std::num::ParseFloatError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::parse::<f64>)
        .collect()
}
