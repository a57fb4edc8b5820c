//! Command implementations.

mod check;
mod run;

pub use check::run_check;
pub use run::run_pipeline;

use anyhow::{Context, Result};
use contracts::RexConfig;
use dest::ConfigLoader;
use tracing::{debug, info};

use crate::cli::Cli;
use crate::error::CliError;

/// Build the effective configuration
///
/// Destinations from the config file come first, followed by those given on
/// the command line. `--buffer-size` overrides the file.
pub fn resolve_config(cli: &Cli) -> Result<RexConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => RexConfig::default(),
    };

    config.destinations.extend(dest::parse_all(&cli.destinations)?);

    if let Some(size) = cli.buffer_size {
        debug!(buffer_size = size, "Overriding buffer size from CLI");
        config.buffer_size = size;
    }

    dest::validate_config(&config)?;

    if config.destinations.is_empty() {
        return Err(CliError::NoDestinations.into());
    }
    Ok(config)
}
