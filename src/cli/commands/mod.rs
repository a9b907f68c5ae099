//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use std::path::PathBuf;

use clap::Args;

pub mod run;
pub mod sweep;

use crate::app::AppContext;
use crate::bandit::{PolicyKind, PullMode};
use crate::cli::Commands;
use crate::config::Config;
use crate::error::Result;

pub fn run(ctx: &AppContext, command: Option<&Commands>) -> Result<()> {
    match command {
        Some(Commands::Run(args)) => run::run(ctx, args),
        Some(Commands::Sweep(args)) => sweep::run(ctx, args),
        None => run::run(ctx, &run::RunArgs::default()),
    }
}

/// Flags that override the `[simulation]` and `[selection]` config tables.
#[derive(Args, Debug, Default, Clone)]
pub struct SimulationArgs {
    /// Bandit name recorded in the report
    #[arg(long)]
    pub name: Option<String>,

    /// True arm means, comma separated
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub means: Option<Vec<f64>>,

    /// True arm variances, comma separated
    #[arg(long, value_delimiter = ',')]
    pub vars: Option<Vec<f64>>,

    /// Total rounds, forced pulls included
    #[arg(long)]
    pub rounds: Option<usize>,

    /// How arms are chosen in adaptive rounds
    #[arg(long, value_enum)]
    pub mode: Option<PullMode>,

    /// Propensity policy for monte-carlo mode
    #[arg(long, value_enum)]
    pub policy: Option<PolicyKind>,

    /// Softmax temperature
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Monte Carlo samples for the win-rate policy
    #[arg(long)]
    pub samples: Option<usize>,
}

impl SimulationArgs {
    pub fn apply(&self, config: &mut Config) {
        let sim = &mut config.simulation;
        if let Some(name) = &self.name {
            sim.name.clone_from(name);
        }
        if let Some(means) = &self.means {
            sim.arm_means.clone_from(means);
        }
        if let Some(vars) = &self.vars {
            sim.arm_vars.clone_from(vars);
        }
        if let Some(rounds) = self.rounds {
            sim.num_rounds = rounds;
        }
        if let Some(mode) = self.mode {
            sim.mode = mode;
        }

        let sel = &mut config.selection;
        if let Some(policy) = self.policy {
            sel.policy = policy;
        }
        if let Some(temperature) = self.temperature {
            sel.temperature = temperature;
        }
        if let Some(samples) = self.samples {
            sel.samples = samples;
        }
    }
}

fn default_report_dir() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("tsim").join("reports")
}
