//! Run coordinator
//!
//! Runs one target runner per target concurrently under a global abort token and
//! turns the racing results into one pass/fail outcome.
//!
//! - Any target failure is logged and cancels the global token, which aborts the
//!   dials still in flight on every other target.
//! - An optional deadline cancels the same token when it elapses.
//! - The run fails if the global token was cancelled, for any reason, by the
//!   time every runner has finished.

use crate::config::validator::validate_targets;
use crate::config::Config;
use crate::connector::Connector;
use crate::runner::{TargetResult, TargetRunner};
use crate::target::{Network, Target};
use crate::util::time::format_duration;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Per-target verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    /// All connections were open at the same time
    Passed,
    /// A dial failed; this target's error is the reported one
    Failed,
    /// Stopped by another target's failure or the deadline
    Aborted,
}

impl TargetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetStatus::Passed => "passed",
            TargetStatus::Failed => "failed",
            TargetStatus::Aborted => "aborted",
        }
    }
}

/// Outcome of one target within a run
#[derive(Debug, Clone)]
pub struct TargetReport {
    pub descriptor: String,
    pub network: Network,
    pub address: String,
    pub status: TargetStatus,
    pub connected: usize,
    pub error: Option<String>,
}

/// Outcome of a whole run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub connections: usize,
    pub timeout: Duration,
    pub deadline: Option<Duration>,
    pub deadline_expired: bool,
    pub success: bool,
    pub targets: Vec<TargetReport>,
}

impl RunReport {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> u8 {
        if self.success {
            0
        } else {
            1
        }
    }
}

/// Run coordinator
pub struct RunCoordinator<C: Connector> {
    connector: Arc<C>,
    targets: Vec<Target>,
    connections: usize,
    timeout: Duration,
    deadline: Option<Duration>,
    verbose: bool,
}

impl<C: Connector> RunCoordinator<C> {
    /// Create a coordinator from a validated configuration
    pub fn new(connector: C, config: &Config) -> Result<Self> {
        let targets = validate_targets(&config.targets)?;

        Ok(Self {
            connector: Arc::new(connector),
            targets,
            connections: config.connections,
            timeout: config.timeout,
            deadline: config.deadline,
            verbose: config.verbose,
        })
    }

    /// Run every target and wait for all of them, including teardown
    pub async fn run(self) -> RunReport {
        let started_at = Utc::now();
        let start = Instant::now();

        let abort = CancellationToken::new();
        let deadline_expired = Arc::new(AtomicBool::new(false));
        let watchdog = self.deadline.map(|deadline| {
            tokio::spawn(watch_deadline(
                abort.clone(),
                deadline,
                deadline_expired.clone(),
            ))
        });

        let mut runners = JoinSet::new();
        for (index, target) in self.targets.iter().enumerate() {
            let runner = TargetRunner::new(
                self.connector.clone(),
                target.clone(),
                self.connections,
                self.timeout,
                self.verbose,
            );
            let abort = abort.clone();
            runners.spawn(async move {
                let result = runner.run(&abort).await;
                if let Some(err) = &result.error {
                    tracing::error!("{}", err);
                    abort.cancel();
                }
                (index, result)
            });
        }

        let mut results: Vec<Option<TargetResult>> = self.targets.iter().map(|_| None).collect();
        while let Some(joined) = runners.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => {
                    tracing::error!("target runner failed: {}", e);
                    abort.cancel();
                }
            }
        }

        // Once the watchdog has finished, the expiry flag and the abort token
        // can no longer change, so both are read from the same state
        if let Some(watchdog) = watchdog {
            watchdog.abort();
            let _ = watchdog.await;
        }
        let success = !abort.is_cancelled();
        let deadline_expired = deadline_expired.load(Ordering::Acquire);

        let targets = self
            .targets
            .iter()
            .zip(results)
            .map(|(target, result)| self.target_report(target, result))
            .collect();

        RunReport {
            started_at,
            elapsed: start.elapsed(),
            connections: self.connections,
            timeout: self.timeout,
            deadline: self.deadline,
            deadline_expired,
            success,
            targets,
        }
    }

    fn target_report(&self, target: &Target, result: Option<TargetResult>) -> TargetReport {
        let (status, connected, error) = match result {
            Some(TargetResult {
                error: Some(err),
                connected,
                ..
            }) => (TargetStatus::Failed, connected, Some(err.to_string())),
            Some(result) if result.connected == self.connections => {
                (TargetStatus::Passed, result.connected, None)
            }
            Some(result) => (TargetStatus::Aborted, result.connected, None),
            None => (
                TargetStatus::Failed,
                0,
                Some("target runner did not complete".to_string()),
            ),
        };

        TargetReport {
            descriptor: target.descriptor().to_string(),
            network: target.network(),
            address: target.address().to_string(),
            status,
            connected,
            error,
        }
    }
}

/// Cancel `abort` once `deadline` elapses, unless it is cancelled first
async fn watch_deadline(abort: CancellationToken, deadline: Duration, expired: Arc<AtomicBool>) {
    tokio::select! {
        _ = abort.cancelled() => {}
        _ = tokio::time::sleep(deadline) => {
            expired.store(true, Ordering::Release);
            tracing::error!("deadline of {} elapsed", format_duration(deadline));
            abort.cancel();
        }
    }
}
