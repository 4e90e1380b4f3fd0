//! conntest - check that a server can accept simultaneous connections
//!
//! conntest opens N connections to each target at once and holds them all open
//! together. The run passes only if every target accepted all N connections
//! before its per-connection timeout and the overall deadline.
//!
//! # Architecture
//!
//! - **Target**: `[network::]address` descriptors for TCP and Unix stream sockets
//! - **Connector**: transport seam (real sockets, or a mock for tests)
//! - **Attempt**: one dial, gated, timed out, and held until released
//! - **Runner**: N attempts for one target behind a start gate, first error wins
//! - **Coordinator**: all targets concurrently, fail-fast abort, global deadline

pub mod attempt;
pub mod config;
pub mod connector;
pub mod coordinator;
pub mod output;
pub mod runner;
pub mod target;
pub mod util;

// Re-export commonly used types
pub use config::Config;
pub use connector::{Connector, NetConnector};
pub use coordinator::{RunCoordinator, RunReport};
pub use target::Target;

/// Result type used throughout conntest
pub type Result<T> = anyhow::Result<T>;
