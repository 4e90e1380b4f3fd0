//! CLI argument parsing using clap

use crate::config::cli_convert::parse_duration;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

const AFTER_HELP: &str = "\
ADDR may be any IPv4, IPv6 address:port pair, or a network::addr, such
as tcp::127.0.0.1:80 or unix::path/to/unix.sock.

If any connection fails, conntest exits with status 1.";

/// conntest - check that a server can accept simultaneous connections
#[derive(Parser, Debug, Default)]
#[command(name = "conntest")]
#[command(version, about, long_about = None, after_help = AFTER_HELP)]
pub struct Cli {
    /// Targets to connect to
    #[arg(value_name = "ADDR")]
    pub targets: Vec<String>,

    /// Verbose connection output
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Number of connections to open per ADDR [default: 1]
    #[arg(short = 'n', long = "conns", value_name = "CONNS")]
    pub connections: Option<usize>,

    /// Connection timeout (e.g. 1s, 250ms, 1m30s) [default: 1s]
    #[arg(short = 't', long = "timeout", value_name = "TTL", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Execution timeout, 0 for none [default: 0]
    #[arg(short = 'T', long = "deadline", value_name = "TTL", value_parser = parse_duration)]
    pub deadline: Option<Duration>,

    /// TOML configuration file; command-line values take precedence
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print a JSON report of the run to stdout
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    ///
    /// Only checks what can be judged without the config file; the merged
    /// configuration is validated separately.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.targets.is_empty() && self.config.is_none() {
            anyhow::bail!("at least one ADDR is required");
        }

        if self.connections == Some(0) {
            anyhow::bail!("CONNS must be at least 1");
        }

        if self.timeout == Some(Duration::ZERO) {
            anyhow::bail!("connection timeout must be greater than 0");
        }

        Ok(())
    }
}
