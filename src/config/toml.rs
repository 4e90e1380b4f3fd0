//! TOML configuration file parsing

use super::*;
use crate::config::cli::Cli;
use crate::config::cli_convert::{convert_deadline, parse_duration};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<FileConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<FileConfig> {
    let config: FileConfig = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with file configuration (CLI takes precedence)
///
/// Targets given on the command line replace the file's targets rather than
/// adding to them. Boolean flags can only be switched on from the command line.
pub fn merge_cli_with_config(cli: &Cli, file: FileConfig) -> Result<Config> {
    let defaults = Config::default();

    let targets = if cli.targets.is_empty() {
        file.targets
    } else {
        cli.targets.clone()
    };

    let timeout = match (cli.timeout, file.timeout.as_deref()) {
        (Some(timeout), _) => timeout,
        (None, Some(s)) => parse_duration(s).context("Invalid timeout in config file")?,
        (None, None) => defaults.timeout,
    };

    let deadline = match (cli.deadline, file.deadline.as_deref()) {
        (Some(deadline), _) => convert_deadline(deadline),
        (None, Some(s)) => {
            convert_deadline(parse_duration(s).context("Invalid deadline in config file")?)
        }
        (None, None) => defaults.deadline,
    };

    Ok(Config {
        targets,
        connections: cli
            .connections
            .or(file.connections)
            .unwrap_or(defaults.connections),
        timeout,
        deadline,
        verbose: cli.verbose || file.verbose.unwrap_or(false),
        json: cli.json || file.json.unwrap_or(false),
    })
}
