//! `--check` implementation: validate destinations without opening them.

use anyhow::{Context, Result};
use contracts::RexConfig;
use tracing::info;

use super::resolve_config;
use crate::cli::Cli;

/// Validate the configuration and print the plan to stdout
///
/// Nothing is opened, so stdout is free to use here.
pub fn run_check(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    info!(
        destinations = config.destinations.len(),
        "Configuration is valid"
    );

    if cli.json {
        let json =
            serde_json::to_string_pretty(&config).context("Failed to serialize configuration")?;
        println!("{json}");
    } else {
        print!("{}", render_plan(&config));
    }
    Ok(())
}

fn render_plan(config: &RexConfig) -> String {
    let mut out = format!(
        "buffer size: {} bytes\ndestinations ({}):\n",
        config.buffer_size,
        config.destinations.len()
    );
    for (idx, spec) in config.destinations.iter().enumerate() {
        out.push_str(&format!("  [{idx}] {spec}\n"));
    }
    out
}
