//! Configuration validation

use super::*;
use crate::target::Target;
use anyhow::{Context, Result};

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_targets(&config.targets)?;

    if config.connections == 0 {
        anyhow::bail!("connections must be at least 1");
    }

    if config.timeout.is_zero() {
        anyhow::bail!("timeout must be greater than 0");
    }

    if config.deadline.is_some_and(|d| d.is_zero()) {
        anyhow::bail!("deadline must be greater than 0 when set");
    }

    Ok(())
}

/// Validate target descriptors, returning them parsed
pub fn validate_targets(targets: &[String]) -> Result<Vec<Target>> {
    if targets.is_empty() {
        anyhow::bail!("at least one target is required");
    }

    targets
        .iter()
        .map(|descriptor| {
            Target::parse(descriptor).with_context(|| format!("Invalid target: {}", descriptor))
        })
        .collect()
}
