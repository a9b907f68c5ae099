use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, OutputFormat, emit_human, emit_json, robot_ok};
use crate::error::Result;
use crate::simulation::sweep;

use super::SimulationArgs;

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub simulation: SimulationArgs,

    /// Number of seeds to run
    #[arg(long, default_value_t = 50)]
    pub seeds: usize,

    /// First seed of the range
    #[arg(long, default_value_t = 0)]
    pub base_seed: u64,

    /// List every seed in human output
    #[arg(long)]
    pub details: bool,
}

pub fn run(ctx: &AppContext, args: &SweepArgs) -> Result<()> {
    let mut config = ctx.config.clone();
    args.simulation.apply(&mut config);

    let report = sweep(&config, args.base_seed, args.seeds)?;

    match ctx.output_format {
        OutputFormat::Json => emit_json(&robot_ok(&report)),
        OutputFormat::Human => {
            let mut layout = HumanLayout::new();
            layout
                .title("Thompson Sampling Sweep")
                .kv("Bandit", &report.name)
                .kv("Mode", report.mode.as_str())
                .kv(
                    "Seeds",
                    &format!(
                        "{}..{}",
                        report.base_seed,
                        report.base_seed.wrapping_add(report.runs.len() as u64)
                    ),
                )
                .kv("Best arm", &report.best_arm.to_string())
                .kv("Worst arm", &report.worst_arm.to_string())
                .kv(
                    "Best > worst",
                    &format!(
                        "{}/{} ({:.1}%)",
                        report.best_beats_worst,
                        report.runs.len(),
                        report.win_fraction() * 100.0
                    ),
                )
                .kv("Mean regret", &format!("{:.3}", report.mean_regret));

            if args.details {
                layout.blank().section("Seeds");
                for run in &report.runs {
                    layout.kv(
                        &format!("Seed {}", run.seed),
                        &format!(
                            "best {:.3}  worst {:.3}  regret {:.3}",
                            run.best_fraction, run.worst_fraction, run.cumulative_regret
                        ),
                    );
                }
            }
            emit_human(layout);
            Ok(())
        }
    }
}
