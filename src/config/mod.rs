//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//! The resulting [`Config`] is passed explicitly to the coordinator, which hands
//! the relevant values down to every runner and attempt.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default connections per target
pub const DEFAULT_CONNECTIONS: usize = 1;

/// Default per-connection dial timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Target descriptors, `[network::]address`
    pub targets: Vec<String>,
    /// Simultaneous connections per target
    pub connections: usize,
    /// Per-connection dial timeout
    pub timeout: Duration,
    /// Overall deadline for the whole run
    pub deadline: Option<Duration>,
    /// Log every connection, not only failures
    pub verbose: bool,
    /// Emit a JSON report after the run
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            connections: DEFAULT_CONNECTIONS,
            timeout: DEFAULT_TIMEOUT,
            deadline: None,
            verbose: false,
            json: false,
        }
    }
}

/// Configuration as written in a TOML file
///
/// Every key is optional. Durations use the same syntax as the command line.
///
/// ```toml
/// targets = ["127.0.0.1:8080", "unix::/run/app.sock"]
/// connections = 100
/// timeout = "2s"
/// deadline = "30s"
/// verbose = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub targets: Vec<String>,
    pub connections: Option<usize>,
    pub timeout: Option<String>,
    pub deadline: Option<String>,
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}
