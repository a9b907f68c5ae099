use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::Result;

pub struct AppContext {
    pub project_dir: PathBuf,
    pub config: Config,
    pub output_format: OutputFormat,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let project_dir = std::env::current_dir()?;
        let config = Config::load(cli.config.as_deref(), &project_dir)?;

        Ok(Self {
            project_dir,
            config,
            output_format: cli.output_format(),
            verbosity: cli.verbose,
        })
    }
}
