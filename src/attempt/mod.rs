//! Connection attempts
//!
//! An attempt is one connection try against a target, identified by a 1-based
//! ordinal among its siblings. Its lifecycle runs in a single task:
//!
//! 1. **Gated**: wait at the target's start gate
//! 2. **Dialing**: connect, bounded by the per-attempt timeout and the target's
//!    stop signal
//! 3. On success, **release wait**: report the dial phase done, hold the
//!    connection until the stop signal fires, then close it
//! 4. On failure: offer the error to the target's first-error slot and fire the
//!    stop signal for every sibling
//!
//! The connection handle never leaves the task, so it is closed exactly once.

use crate::connector::Connector;
use crate::runner::gate::StartGate;
use crate::runner::slot::ErrorReporter;
use crate::target::Target;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Why a single dial did not produce a connection
#[derive(Debug, Error)]
pub enum DialError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("i/o timeout after {0:?}")]
    TimedOut(Duration),

    #[error("operation was canceled")]
    Cancelled,
}

/// A failed attempt, naming the target and the attempt ordinal
#[derive(Debug, Error)]
#[error("{descriptor}: Connection {ordinal} failed: {cause}")]
pub struct AttemptError {
    pub descriptor: String,
    pub ordinal: usize,
    #[source]
    pub cause: DialError,
}

/// Terminal state of an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Connected, held until the stop signal, then closed
    Closed,
    /// Dial failed or was aborted
    Failed,
}

/// Per-target signals shared by sibling attempts
#[derive(Debug)]
pub struct AttemptSignals {
    pub gate: Arc<StartGate>,
    pub stop: CancellationToken,
    pub errors: ErrorReporter<AttemptError>,
    /// Dropped when the dial phase ends; the runner waits for all of these
    pub dialed: mpsc::Sender<()>,
}

/// One connection attempt
pub struct Attempt<C: Connector> {
    connector: Arc<C>,
    target: Arc<Target>,
    ordinal: usize,
    timeout: Duration,
    verbose: bool,
}

impl<C: Connector> Attempt<C> {
    pub fn new(
        connector: Arc<C>,
        target: Arc<Target>,
        ordinal: usize,
        timeout: Duration,
        verbose: bool,
    ) -> Self {
        Self {
            connector,
            target,
            ordinal,
            timeout,
            verbose,
        }
    }

    /// Run the attempt through both phases
    pub async fn run(self, signals: AttemptSignals) -> AttemptOutcome {
        let AttemptSignals {
            gate,
            stop,
            errors,
            dialed,
        } = signals;

        gate.pass().await;

        match self.dial(&stop).await {
            Ok(conn) => {
                if self.verbose {
                    tracing::info!("{}: Connection {} up", self.target, self.ordinal);
                }
                drop(dialed);

                stop.cancelled().await;
                self.connector.close(conn).await;
                AttemptOutcome::Closed
            }
            Err(cause) => {
                let err = AttemptError {
                    descriptor: self.target.descriptor().to_string(),
                    ordinal: self.ordinal,
                    cause,
                };

                // Once the target is stopping, a sibling's error (or a global
                // abort) already decided the outcome
                let superseded = if stop.is_cancelled() {
                    Some(err)
                } else {
                    errors.offer(err).err()
                };
                if let Some(err) = superseded {
                    if self.verbose {
                        tracing::warn!("{}", err);
                    }
                }

                stop.cancel();
                drop(dialed);
                AttemptOutcome::Failed
            }
        }
    }

    async fn dial(&self, stop: &CancellationToken) -> Result<C::Conn, DialError> {
        tokio::select! {
            biased;
            _ = stop.cancelled() => Err(DialError::Cancelled),
            result = tokio::time::timeout(self.timeout, self.connector.connect(&self.target)) => {
                match result {
                    Ok(Ok(conn)) => Ok(conn),
                    Ok(Err(e)) => Err(DialError::Io(e)),
                    Err(_) => Err(DialError::TimedOut(self.timeout)),
                }
            }
        }
    }
}
