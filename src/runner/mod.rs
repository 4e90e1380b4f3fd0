//! Target runner
//!
//! Drives all N attempts for one target and decides whether the target can hold
//! N simultaneous connections.
//!
//! # Phases
//!
//! - **Spawning**: one task per attempt, each heading for the start gate
//! - **Gating**: the gate opens once every attempt has arrived at it
//! - **Awaiting dials**: wait until every attempt has connected or failed
//! - **Cancelling**: fire the target stop signal unconditionally
//! - **Awaiting teardown**: wait until every held connection is closed
//!
//! A single failed dial fails the target. The first failure recorded is the one
//! reported; later ones are superseded.

pub mod gate;
pub mod slot;

use crate::attempt::{Attempt, AttemptError, AttemptOutcome, AttemptSignals};
use crate::connector::Connector;
use crate::target::Target;
use gate::StartGate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Outcome of one target run
#[derive(Debug)]
pub struct TargetResult {
    pub target: Arc<Target>,
    /// Attempts that connected (and were later closed)
    pub connected: usize,
    /// The first failure recorded for the target
    pub error: Option<AttemptError>,
}

impl TargetResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Runner for a single target
pub struct TargetRunner<C: Connector> {
    connector: Arc<C>,
    target: Arc<Target>,
    connections: usize,
    timeout: Duration,
    verbose: bool,
}

impl<C: Connector> TargetRunner<C> {
    pub fn new(
        connector: Arc<C>,
        target: Target,
        connections: usize,
        timeout: Duration,
        verbose: bool,
    ) -> Self {
        Self {
            connector,
            target: Arc::new(target),
            connections,
            timeout,
            verbose,
        }
    }

    /// Run all attempts for the target
    ///
    /// The target's stop signal is a child of `parent`, so cancelling `parent`
    /// aborts every dial still in progress. Returns only after every connection
    /// opened by this run has been closed.
    pub async fn run(self, parent: &CancellationToken) -> TargetResult {
        let stop = parent.child_token();
        let gate = Arc::new(StartGate::new(self.connections));
        let (reporter, error_slot) = slot::first_error();
        let (dialed_tx, mut dialed_rx) = mpsc::channel::<()>(1);

        let mut attempts = JoinSet::new();
        for ordinal in 1..=self.connections {
            let attempt = Attempt::new(
                self.connector.clone(),
                self.target.clone(),
                ordinal,
                self.timeout,
                self.verbose,
            );
            let signals = AttemptSignals {
                gate: gate.clone(),
                stop: stop.clone(),
                errors: reporter.clone(),
                dialed: dialed_tx.clone(),
            };
            attempts.spawn(attempt.run(signals));
        }
        drop(dialed_tx);
        drop(reporter);

        gate.open_when_assembled().await;
        tracing::debug!(descriptor = %self.target, attempts = self.connections, "start gate open");

        // Nothing is ever sent; the channel closes when the last dial phase ends
        while dialed_rx.recv().await.is_some() {}

        stop.cancel();

        let mut connected = 0;
        while let Some(joined) = attempts.join_next().await {
            match joined {
                Ok(AttemptOutcome::Closed) => connected += 1,
                Ok(AttemptOutcome::Failed) => {}
                Err(e) => tracing::error!("{}: attempt task failed: {}", self.target, e),
            }
        }
        tracing::debug!(descriptor = %self.target, connected, "teardown complete");

        TargetResult {
            target: self.target,
            connected,
            error: error_slot.take(),
        }
    }
}
