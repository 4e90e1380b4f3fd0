//! Mock connector for testing
//!
//! Simulates endpoints in-process so the fan-out protocol can be tested without
//! sockets and with behaviours a real listener cannot produce reliably (a dial
//! that never completes, a slow accept).
//!
//! # Features
//!
//! - Per-address behaviour with a configurable default
//! - Tracks when each dial started
//! - Counts accepted, open, peak-open and closed connections
//! - Connections report their own close when dropped
//!
//! # Example
//!
//! ```
//! use conntest::connector::Connector;
//! use conntest::connector::mock::{MockBehavior, MockConnector};
//! use conntest::target::Target;
//!
//! # tokio_test_block_on(async {
//! let connector = MockConnector::new(MockBehavior::Accept);
//! let target = Target::parse("db:5432").unwrap();
//!
//! let conn = connector.connect(&target).await.unwrap();
//! assert_eq!(connector.stats().open(), 1);
//! connector.close(conn).await;
//! assert_eq!(connector.stats().closed(), 1);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

use super::Connector;
use crate::target::Target;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// How a mock endpoint answers a dial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Accept immediately
    Accept,
    /// Refuse immediately
    Refuse,
    /// Never answer; the dial only ends by timeout or cancellation
    Hang,
    /// Accept after a delay
    Delay(Duration),
    /// Accept the first `n` dials, refuse the rest
    AcceptUpTo(usize),
}

/// Connection counters shared by a connector and its connections
#[derive(Debug, Default)]
pub struct MockStats {
    dials: AtomicUsize,
    accepted: AtomicUsize,
    open: AtomicUsize,
    peak: AtomicUsize,
    closed: AtomicUsize,
    dial_starts: Mutex<Vec<Instant>>,
}

impl MockStats {
    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn open(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Highest number of connections open at the same instant
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Time between the first and the last dial starting
    pub fn dial_start_spread(&self) -> Option<Duration> {
        let starts = self.dial_starts.lock().unwrap_or_else(|e| e.into_inner());
        let first = starts.iter().min()?;
        let last = starts.iter().max()?;
        Some(last.duration_since(*first))
    }

    fn record_dial(&self) -> usize {
        self.dial_starts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Instant::now());
        self.dials.fetch_add(1, Ordering::SeqCst)
    }
}

/// Open mock connection
///
/// Counts itself closed exactly once, when dropped.
#[derive(Debug)]
pub struct MockConn {
    address: String,
    stats: Arc<MockStats>,
}

impl MockConn {
    fn open(address: &str, stats: &Arc<MockStats>) -> Self {
        stats.accepted.fetch_add(1, Ordering::SeqCst);
        let open = stats.open.fetch_add(1, Ordering::SeqCst) + 1;
        stats.peak.fetch_max(open, Ordering::SeqCst);
        Self {
            address: address.to_string(),
            stats: stats.clone(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Drop for MockConn {
    fn drop(&mut self) {
        self.stats.open.fetch_sub(1, Ordering::SeqCst);
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Mock connector
///
/// Cloning shares behaviour and counters.
#[derive(Debug, Clone)]
pub struct MockConnector {
    default: MockBehavior,
    per_address: Arc<HashMap<String, MockBehavior>>,
    stats: Arc<HashMap<String, Arc<MockStats>>>,
    fallback_stats: Arc<MockStats>,
}

impl MockConnector {
    /// Create a connector answering every address with `default`
    pub fn new(default: MockBehavior) -> Self {
        Self {
            default,
            per_address: Arc::new(HashMap::new()),
            stats: Arc::new(HashMap::new()),
            fallback_stats: Arc::new(MockStats::default()),
        }
    }

    /// Override the behaviour for one address, with counters of its own
    pub fn with_address(mut self, address: &str, behavior: MockBehavior) -> Self {
        Arc::make_mut(&mut self.per_address).insert(address.to_string(), behavior);
        Arc::make_mut(&mut self.stats).insert(address.to_string(), Arc::new(MockStats::default()));
        self
    }

    /// Counters for addresses without an override
    pub fn stats(&self) -> &MockStats {
        &self.fallback_stats
    }

    /// Counters for an address registered with [`MockConnector::with_address`]
    pub fn stats_for(&self, address: &str) -> Option<&MockStats> {
        self.stats.get(address).map(Arc::as_ref)
    }

    fn lookup(&self, address: &str) -> (MockBehavior, Arc<MockStats>) {
        match (self.per_address.get(address), self.stats.get(address)) {
            (Some(behavior), Some(stats)) => (*behavior, stats.clone()),
            _ => (self.default, self.fallback_stats.clone()),
        }
    }
}

impl Connector for MockConnector {
    type Conn = MockConn;

    async fn connect(&self, target: &Target) -> io::Result<MockConn> {
        let (behavior, stats) = self.lookup(target.address());
        let seq = stats.record_dial();

        match behavior {
            MockBehavior::Accept => Ok(MockConn::open(target.address(), &stats)),
            MockBehavior::Refuse => Err(refused()),
            MockBehavior::Hang => std::future::pending().await,
            MockBehavior::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(MockConn::open(target.address(), &stats))
            }
            MockBehavior::AcceptUpTo(n) if seq < n => Ok(MockConn::open(target.address(), &stats)),
            MockBehavior::AcceptUpTo(_) => Err(refused()),
        }
    }
}

fn refused() -> io::Error {
    io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_accept_and_close() {
        let connector = MockConnector::new(MockBehavior::Accept);
        let target = Target::parse("a:1").unwrap();

        let first = connector.connect(&target).await.unwrap();
        let second = connector.connect(&target).await.unwrap();
        assert_eq!(first.address(), "a:1");
        assert_eq!(connector.stats().open(), 2);
        assert_eq!(connector.stats().peak(), 2);

        connector.close(first).await;
        connector.close(second).await;
        assert_eq!(connector.stats().open(), 0);
        assert_eq!(connector.stats().closed(), 2);
        assert_eq!(connector.stats().peak(), 2);
    }

    #[tokio::test]
    async fn test_mock_refuse() {
        let connector = MockConnector::new(MockBehavior::Refuse);
        let target = Target::parse("a:1").unwrap();

        let err = connector.connect(&target).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
        assert_eq!(connector.stats().dials(), 1);
        assert_eq!(connector.stats().accepted(), 0);
    }

    #[tokio::test]
    async fn test_mock_accept_up_to() {
        let connector = MockConnector::new(MockBehavior::AcceptUpTo(2));
        let target = Target::parse("a:1").unwrap();

        let _a = connector.connect(&target).await.unwrap();
        let _b = connector.connect(&target).await.unwrap();
        assert!(connector.connect(&target).await.is_err());
        assert_eq!(connector.stats().accepted(), 2);
    }

    #[tokio::test]
    async fn test_mock_hang_never_completes() {
        let connector = MockConnector::new(MockBehavior::Hang);
        let target = Target::parse("a:1").unwrap();

        let result =
            tokio::time::timeout(Duration::from_millis(20), connector.connect(&target)).await;
        assert!(result.is_err());
        assert_eq!(connector.stats().dials(), 1);
    }

    #[tokio::test]
    async fn test_mock_per_address_overrides() {
        let connector = MockConnector::new(MockBehavior::Accept)
            .with_address("down:1", MockBehavior::Refuse);

        let up = Target::parse("up:1").unwrap();
        let down = Target::parse("down:1").unwrap();

        assert!(connector.connect(&up).await.is_ok());
        assert!(connector.connect(&down).await.is_err());
        assert_eq!(connector.stats().dials(), 1);
        assert_eq!(connector.stats_for("down:1").unwrap().dials(), 1);
        assert!(connector.stats_for("up:1").is_none());
    }
}
