use colored::Colorize;

use crate::cli::{Cli, ConfigCommands};
use crate::config::Config;
use crate::error::{DvDebugError, Result};

pub async fn run(cli: &Cli, config: &Config, command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(cli, config),
        ConfigCommands::Path => path(),
        ConfigCommands::Init => init(config),
    }
}

fn show(cli: &Cli, config: &Config) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| DvDebugError::ConfigError(e.to_string()))?;
    println!("{}", content);
    Ok(())
}

fn path() -> Result<()> {
    println!("{}", Config::config_path().display());
    Ok(())
}

fn init(config: &Config) -> Result<()> {
    let path = Config::config_path();
    if path.exists() {
        return Err(DvDebugError::ConfigError(format!(
            "Config file already exists at {}",
            path.display()
        )));
    }

    config.save()?;
    println!("  {} Wrote {}", "✓".green(), path.display());
    Ok(())
}
