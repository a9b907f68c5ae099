//! Simulation driver: builds a bandit and sampler from config, runs them,
//! and summarizes the run. Sweeps repeat the run across seeds in parallel.

use std::path::Path;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bandit::{Bandit, PriorParams, PullMode, ThompsonSampler, policy_for};
use crate::config::Config;
use crate::error::{Result, TsimError};

pub struct Simulation {
    bandit: Bandit,
    sampler: ThompsonSampler,
    num_rounds: usize,
    seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub name: String,
    pub mode: PullMode,
    pub policy: String,
    pub seed: u64,
    pub started_at: DateTime<Utc>,
    pub num_rounds: usize,
    pub num_initial_pulls: usize,
    pub adaptive_rounds: usize,
    pub total_pulls: usize,
    pub arm_means: Vec<f64>,
    pub arm_vars: Vec<f64>,
    pub pull_counts: Vec<u64>,
    pub adaptive_pull_counts: Vec<u64>,
    pub avg_rewards: Vec<f64>,
    pub posteriors: Vec<PriorParams>,
    pub total_reward: f64,
    pub cumulative_regret: f64,
    pub clamped_draws: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ips_estimates: Option<Vec<f64>>,
}

impl Simulation {
    /// Build a simulation; a missing seed is drawn from OS entropy.
    pub fn from_config(config: &Config) -> Result<Self> {
        let seed = config.simulation.seed.unwrap_or_else(rand::random);
        Self::with_seed(config, seed)
    }

    pub fn with_seed(config: &Config, seed: u64) -> Result<Self> {
        config.validate()?;
        let sim = &config.simulation;
        let bandit = Bandit::new(sim.name.clone(), sim.arm_means.clone(), sim.arm_vars.clone())?;
        let selection = &config.selection;
        let policy = policy_for(
            selection.policy,
            selection.temperature,
            selection.samples,
            selection.min_propensity,
        );
        let sampler = ThompsonSampler::new(config.sampler.clone(), sim.mode, policy)?;
        Ok(Self {
            bandit,
            sampler,
            num_rounds: sim.num_rounds,
            seed,
        })
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    pub fn run(mut self) -> Result<SimulationReport> {
        let started_at = Utc::now();
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.sampler.run(&mut self.bandit, self.num_rounds, &mut rng)?;
        let report = self.report(started_at);
        info!(
            name = %report.name,
            seed = report.seed,
            pulls = report.total_pulls,
            regret = report.cumulative_regret,
            "simulation finished"
        );
        Ok(report)
    }

    fn report(&self, started_at: DateTime<Utc>) -> SimulationReport {
        let bandit = &self.bandit;
        let num_arms = bandit.num_arms();
        let num_initial_pulls = self.sampler.num_initial_pulls();
        let forced = num_initial_pulls * num_arms;

        let mut adaptive_pull_counts = vec![0_u64; num_arms];
        for pull in bandit.pulls().iter().skip(forced) {
            adaptive_pull_counts[pull.arm] += 1;
        }

        let best_mean = bandit.arm_means()[bandit.best_arm()];
        let cumulative_regret = bandit
            .pulls()
            .iter()
            .map(|p| best_mean - bandit.arm_means()[p.arm])
            .sum();

        SimulationReport {
            name: bandit.name().to_string(),
            mode: self.sampler.mode(),
            policy: self.sampler.policy_name().to_string(),
            seed: self.seed,
            started_at,
            num_rounds: self.num_rounds,
            num_initial_pulls,
            adaptive_rounds: self.sampler.adaptive_rounds(num_arms, self.num_rounds),
            total_pulls: bandit.total_pulls(),
            arm_means: bandit.arm_means().to_vec(),
            arm_vars: bandit.arm_vars().to_vec(),
            pull_counts: bandit.pull_counts().to_vec(),
            adaptive_pull_counts,
            avg_rewards: bandit.avg_reward_tracker().to_vec(),
            posteriors: self.sampler.posteriors().to_vec(),
            total_reward: bandit.pulls().iter().map(|p| p.reward).sum(),
            cumulative_regret,
            clamped_draws: self.sampler.clamped_draws(),
            ips_estimates: bandit.ips_estimates(),
        }
    }
}

impl SimulationReport {
    /// Share of adaptive pulls that went to `arm`; zero when nothing was adaptive.
    #[must_use]
    pub fn adaptive_fraction(&self, arm: usize) -> f64 {
        let total: u64 = self.adaptive_pull_counts.iter().sum();
        if total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let fraction = self.adaptive_pull_counts.get(arm).copied().unwrap_or(0) as f64 / total as f64;
        fraction
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, json)?;
        match std::fs::rename(&temp_path, path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                std::fs::remove_file(path)?;
                if let Err(err) = std::fs::rename(&temp_path, path) {
                    let _ = std::fs::remove_file(&temp_path);
                    return Err(TsimError::Io(err));
                }
            }
            Err(err) => return Err(TsimError::Io(err)),
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedSummary {
    pub seed: u64,
    pub best_fraction: f64,
    pub worst_fraction: f64,
    pub cumulative_regret: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub name: String,
    pub mode: PullMode,
    pub base_seed: u64,
    pub best_arm: usize,
    pub worst_arm: usize,
    pub runs: Vec<SeedSummary>,
    /// Seeds where the best arm got strictly more adaptive pulls than the worst.
    pub best_beats_worst: usize,
    pub mean_regret: f64,
}

impl SweepReport {
    #[must_use]
    pub fn win_fraction(&self) -> f64 {
        if self.runs.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let fraction = self.best_beats_worst as f64 / self.runs.len() as f64;
        fraction
    }
}

/// Run one independent simulation per seed in `base_seed..base_seed + seeds`.
pub fn sweep(config: &Config, base_seed: u64, seeds: usize) -> Result<SweepReport> {
    if seeds == 0 {
        return Err(TsimError::Config("sweep needs at least one seed".to_string()));
    }
    config.validate()?;

    let means = &config.simulation.arm_means;
    let best_arm = extreme_index(means, |a, b| a > b);
    let worst_arm = extreme_index(means, |a, b| a < b);

    let reports: Vec<SimulationReport> = (0..seeds as u64)
        .into_par_iter()
        .map(|offset| Simulation::with_seed(config, base_seed.wrapping_add(offset))?.run())
        .collect::<Result<_>>()?;

    let runs: Vec<SeedSummary> = reports
        .iter()
        .map(|r| SeedSummary {
            seed: r.seed,
            best_fraction: r.adaptive_fraction(best_arm),
            worst_fraction: r.adaptive_fraction(worst_arm),
            cumulative_regret: r.cumulative_regret,
        })
        .collect();
    let best_beats_worst = reports
        .iter()
        .filter(|r| r.adaptive_pull_counts[best_arm] > r.adaptive_pull_counts[worst_arm])
        .count();
    #[allow(clippy::cast_precision_loss)]
    let mean_regret = runs.iter().map(|r| r.cumulative_regret).sum::<f64>() / runs.len() as f64;

    info!(seeds, best_arm, worst_arm, best_beats_worst, "sweep finished");

    Ok(SweepReport {
        name: config.simulation.name.clone(),
        mode: config.simulation.mode,
        base_seed,
        best_arm,
        worst_arm,
        runs,
        best_beats_worst,
        mean_regret,
    })
}

fn extreme_index(values: &[f64], better: impl Fn(f64, f64) -> bool) -> usize {
    let mut index = 0;
    for (i, value) in values.iter().enumerate().skip(1) {
        if better(*value, values[index]) {
            index = i;
        }
    }
    index
}
