//! conntest CLI entry point

use anyhow::{Context, Result};
use conntest::config::cli::Cli;
use conntest::config::{cli_convert, toml, validator, Config};
use conntest::output::{json, text};
use conntest::{NetConnector, RunCoordinator};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse_args();
    cli.validate()?;

    init_tracing();

    let config = build_config(&cli)?;
    validator::validate_config(&config).context("Configuration validation failed")?;

    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?;

    let report = runtime.block_on(async {
        let coordinator = RunCoordinator::new(NetConnector::new(), &config)
            .context("Failed to create coordinator")?;
        anyhow::Ok(coordinator.run().await)
    })?;

    if config.verbose {
        text::print_summary(&report);
    }
    if config.json {
        json::print_report(&report).context("Failed to write JSON report")?;
    }

    Ok(ExitCode::from(report.exit_code()))
}

/// Build configuration from CLI arguments and the optional config file
fn build_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => {
            let file = toml::parse_toml_file(path)?;
            toml::merge_cli_with_config(cli, file)
        }
        None => Ok(cli_convert::build_config_from_cli(cli)),
    }
}

/// Plain log lines on stderr; `RUST_LOG` overrides the default `info` filter
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_level(false)
                .with_target(false),
        )
        .with(env_filter)
        .init();
}
