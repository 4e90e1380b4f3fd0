//! Target abstraction
//!
//! A target is one dial destination supplied on the command line. Descriptors
//! take the form `[network::]address`:
//!
//! - `127.0.0.1:80`, `[::1]:443`, `example.com:22` (network defaults to `tcp`)
//! - `tcp4::localhost:8080`, `tcp6::localhost:8080`
//! - `unix::/run/app.sock`
//!
//! # Example
//!
//! ```
//! use conntest::target::{Network, Target};
//!
//! let target = Target::parse("unix::/run/app.sock").unwrap();
//! assert_eq!(target.network(), Network::Unix);
//! assert_eq!(target.address(), "/run/app.sock");
//!
//! let target = Target::parse("127.0.0.1:80").unwrap();
//! assert_eq!(target.network(), Network::Tcp);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

/// Separator between the network kind and the address in a descriptor
pub const NETWORK_SEPARATOR: &str = "::";

/// Stream network kinds a target can be dialed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// TCP over IPv4 or IPv6
    #[default]
    Tcp,
    /// TCP over IPv4 only
    Tcp4,
    /// TCP over IPv6 only
    Tcp6,
    /// Unix domain stream socket
    Unix,
}

impl Network {
    /// Name as written in a descriptor
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Tcp => "tcp",
            Network::Tcp4 => "tcp4",
            Network::Tcp6 => "tcp6",
            Network::Unix => "unix",
        }
    }

    /// Whether a resolved socket address belongs to this network
    fn accepts(&self, addr: &SocketAddr) -> bool {
        match self {
            Network::Tcp => true,
            Network::Tcp4 => addr.is_ipv4(),
            Network::Tcp6 => addr.is_ipv6(),
            Network::Unix => false,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "tcp" => Ok(Network::Tcp),
            "tcp4" => Ok(Network::Tcp4),
            "tcp6" => Ok(Network::Tcp6),
            "unix" => Ok(Network::Unix),
            other => Err(TargetParseError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Errors produced while parsing a target descriptor
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetParseError {
    #[error("unknown network {0:?} (expected tcp, tcp4, tcp6 or unix)")]
    UnknownNetwork(String),

    #[error("missing address in target {0:?}")]
    MissingAddress(String),
}

/// One dial destination
///
/// Immutable once parsed. The original descriptor is kept for messages so that
/// errors name the target exactly as the user wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    network: Network,
    address: String,
    descriptor: String,
}

impl Target {
    /// Parse a `[network::]address` descriptor
    ///
    /// The split happens at the first `::`, so IPv6 literals must be bracketed
    /// (`[::1]:80`) or carry an explicit network prefix (`tcp6::[::1]:80`).
    pub fn parse(descriptor: &str) -> Result<Self, TargetParseError> {
        let (network, address) = match descriptor.find(NETWORK_SEPARATOR) {
            Some(i) => (
                descriptor[..i].parse::<Network>()?,
                &descriptor[i + NETWORK_SEPARATOR.len()..],
            ),
            None => (Network::Tcp, descriptor),
        };

        if address.is_empty() {
            return Err(TargetParseError::MissingAddress(descriptor.to_string()));
        }

        Ok(Self {
            network,
            address: address.to_string(),
            descriptor: descriptor.to_string(),
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// The descriptor as originally supplied
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Resolve a TCP target to the socket addresses of its network family
    ///
    /// # Errors
    ///
    /// Fails if the lookup fails, if no address of the requested family exists,
    /// or if called on a Unix target.
    pub async fn resolve(&self) -> io::Result<Vec<SocketAddr>> {
        if self.network == Network::Unix {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unix targets have no socket addresses",
            ));
        }

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(self.address.as_str())
            .await?
            .filter(|addr| self.network.accepts(addr))
            .collect();

        if addrs.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no {} address found for {}", self.network, self.address),
            ));
        }

        Ok(addrs)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor)
    }
}

impl FromStr for Target {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::parse(s)
    }
}
