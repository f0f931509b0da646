//! Configuration loading for CLI commands

use crate::cli::Cli;
use anyhow::{Context, Result};
use curbside_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::Path;

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG_FILE: &str = "curbside.toml";

/// Resolve defaults, config file, environment and command-line flags
pub fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    match &cli.config {
        Some(path) => {
            config = config
                .load_from_file(path)
                .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
        }
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            config = config
                .load_from_file(DEFAULT_CONFIG_FILE)
                .context("Failed to load configuration file")?;
        }
        None => {}
    }

    let mut config = config.load_from_env();
    config.update_from_cli(CliConfigOverrides {
        zones_path: cli.zones.clone(),
        signs_path: cli.signs.clone(),
        categories_path: cli.categories.clone(),
        projected_crs: cli.projected_crs,
        default_radius_meters: cli.default_radius,
    });

    Ok(config)
}
