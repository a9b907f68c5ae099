//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

pub mod commands;
pub mod output;

pub use output::OutputFormat;

use commands::run::RunArgs;
use commands::sweep::SweepArgs;

#[derive(Parser, Debug)]
#[command(
    name = "tsim",
    version,
    about = "Thompson sampling simulator for Gaussian bandits",
    long_about = "Simulates Thompson sampling with a Normal-Inverse-Gamma prior over \
                  Gaussian arms. Without a subcommand, runs the three-arm demo."
)]
pub struct Cli {
    /// Emit machine-readable JSON on stdout
    #[arg(long, global = true)]
    pub robot: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Silence all logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file to use instead of the global and project files
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    #[must_use]
    pub const fn output_format(&self) -> OutputFormat {
        if self.robot {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one simulation (the default)
    Run(RunArgs),

    /// Repeat the simulation over a range of seeds
    Sweep(SweepArgs),
}
