use std::path::PathBuf;

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, OutputFormat, emit_human, emit_json, fmt_floats, robot_ok};
use crate::error::Result;
use crate::simulation::{Simulation, SimulationReport};

use super::{SimulationArgs, default_report_dir};

#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub simulation: SimulationArgs,

    /// Seed for the random source (drawn at random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the JSON report to this path
    #[arg(long, conflicts_with = "save")]
    pub output: Option<PathBuf>,

    /// Write the JSON report under the data directory
    #[arg(long)]
    pub save: bool,
}

pub fn run(ctx: &AppContext, args: &RunArgs) -> Result<()> {
    let mut config = ctx.config.clone();
    args.simulation.apply(&mut config);
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }

    let report = Simulation::from_config(&config)?.run()?;

    let saved = match (&args.output, args.save) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(
            default_report_dir().join(format!("{}-{}.json", report.name, report.seed)),
        ),
        (None, false) => None,
    };
    if let Some(path) = &saved {
        report.save(path)?;
        tracing::info!(path = %path.display(), "saved report");
    }

    match ctx.output_format {
        OutputFormat::Json => emit_json(&robot_ok(&report)),
        OutputFormat::Human => {
            emit_human(render(&report, saved.as_ref()));
            Ok(())
        }
    }
}

fn render(report: &SimulationReport, saved: Option<&PathBuf>) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout
        .title("Thompson Sampling")
        .section("Run")
        .kv("Bandit", &report.name)
        .kv("Mode", report.mode.as_str())
        .kv("Policy", &report.policy)
        .kv("Seed", &report.seed.to_string())
        .kv("Rounds", &report.num_rounds.to_string())
        .kv("Forced pulls/arm", &report.num_initial_pulls.to_string())
        .kv("Adaptive rounds", &report.adaptive_rounds.to_string())
        .kv("Total reward", &format!("{:.3}", report.total_reward))
        .kv("Regret", &format!("{:.3}", report.cumulative_regret));
    if report.clamped_draws > 0 {
        layout.kv("Clamped draws", &report.clamped_draws.to_string());
    }
    if let Some(path) = saved {
        layout.kv("Report", &path.display().to_string());
    }
    layout.blank().section("Arms");

    for (arm, posterior) in report.posteriors.iter().enumerate() {
        let mut line = format!(
            "true {:.3}/{:.3}  pulls {:>4} (adaptive {:>4})  avg {:.3}  mu0 {:.3}  n0 {:.0}  alpha {:.1}  beta {:.3}",
            report.arm_means[arm],
            report.arm_vars[arm],
            report.pull_counts[arm],
            report.adaptive_pull_counts[arm],
            report.avg_rewards[arm],
            posterior.mu0,
            posterior.n0,
            posterior.alpha,
            posterior.beta,
        );
        if let Some(ips) = &report.ips_estimates {
            line.push_str(&format!("  ips {:.3}", ips[arm]));
        }
        layout.kv(&format!("Arm {arm}"), &line);
    }
    if let Some(ips) = &report.ips_estimates {
        layout.blank().kv("IPS estimates", &fmt_floats(ips));
    }
    layout
}
