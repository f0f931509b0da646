//! Command implementations

mod inspect;
mod query;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Inspect(args) => inspect::execute(args, &config, &output),
        Commands::Query(args) => query::execute(args, &config, &output),
    }
}
