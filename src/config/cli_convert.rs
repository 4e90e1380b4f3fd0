//! CLI to Config conversion utilities

use crate::config::cli::Cli;
use crate::config::Config;
use anyhow::{Context, Result};
use std::time::Duration;

/// Parse a duration string (e.g., "1s", "250ms", "1m30s", "1.5h") to a Duration
///
/// Accepts a sequence of decimal numbers, each with a unit suffix: `ns`, `us`
/// (or `µs`), `ms`, `s`, `m`, `h`. A bare `0` is also accepted.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        anyhow::bail!("Invalid duration format: empty string");
    }

    let mut nanos = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            anyhow::bail!("Invalid duration format: {}", s);
        }
        let value: f64 = rest[..num_len]
            .parse()
            .with_context(|| format!("Invalid duration format: {}", s))?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit_nanos = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => anyhow::bail!("Missing unit in duration: {}", s),
            unit => anyhow::bail!("Unknown unit {:?} in duration: {}", unit, s),
        };
        rest = &rest[unit_len..];

        nanos += value * unit_nanos;
    }

    if !nanos.is_finite() || nanos > u64::MAX as f64 {
        anyhow::bail!("Duration out of range: {}", s);
    }

    Ok(Duration::from_nanos(nanos.round() as u64))
}

/// Convert a deadline value to an optional deadline (zero means none)
pub fn convert_deadline(deadline: Duration) -> Option<Duration> {
    if deadline.is_zero() {
        None
    } else {
        Some(deadline)
    }
}

/// Build configuration from CLI arguments alone
pub fn build_config_from_cli(cli: &Cli) -> Config {
    let defaults = Config::default();

    Config {
        targets: cli.targets.clone(),
        connections: cli.connections.unwrap_or(defaults.connections),
        timeout: cli.timeout.unwrap_or(defaults.timeout),
        deadline: cli.deadline.and_then(convert_deadline),
        verbose: cli.verbose,
        json: cli.json,
    }
}
