//! Listener fixtures shared by the socket-level tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};

#[derive(Default)]
struct Counters {
    accepted: AtomicUsize,
    open: AtomicUsize,
    peak: AtomicUsize,
    closed: AtomicUsize,
}

/// TCP listener on localhost that accepts everything and counts connections
///
/// A connection counts as closed once the peer's EOF (or a read error) is seen.
/// With [`CountingListener::bind_holding`], no connection is read (and so none
/// can count as closed) before a given number have been accepted.
pub(crate) struct CountingListener {
    address: String,
    counters: Arc<Counters>,
    task: tokio::task::JoinHandle<()>,
}

impl CountingListener {
    pub(crate) async fn bind() -> Self {
        Self::bind_holding(0).await
    }

    pub(crate) async fn bind_holding(hold: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let counters = Arc::new(Counters::default());
        let (accepted_tx, accepted_rx) = watch::channel(0usize);

        let task = {
            let counters = counters.clone();
            tokio::spawn(async move {
                loop {
                    let Ok((mut stream, _)) = listener.accept().await else {
                        break;
                    };
                    let accepted = counters.accepted.fetch_add(1, Ordering::SeqCst) + 1;
                    accepted_tx.send_replace(accepted);
                    let open = counters.open.fetch_add(1, Ordering::SeqCst) + 1;
                    counters.peak.fetch_max(open, Ordering::SeqCst);

                    let counters = counters.clone();
                    let mut accepted_rx = accepted_rx.clone();
                    tokio::spawn(async move {
                        let _ = accepted_rx.wait_for(|n| *n >= hold).await;
                        let mut buf = [0u8; 64];
                        while let Ok(n) = stream.read(&mut buf).await {
                            if n == 0 {
                                break;
                            }
                        }
                        counters.open.fetch_sub(1, Ordering::SeqCst);
                        counters.closed.fetch_add(1, Ordering::SeqCst);
                    });
                }
            })
        };

        Self { address, counters, task }
    }

    pub(crate) fn address(&self) -> String {
        self.address.clone()
    }

    pub(crate) fn accepted(&self) -> usize {
        self.counters.accepted.load(Ordering::SeqCst)
    }

    pub(crate) fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub(crate) async fn wait_for_open(&self, n: usize, limit: Duration) {
        self.wait_until(|c| c.open.load(Ordering::SeqCst) >= n, limit).await;
    }

    pub(crate) async fn wait_for_closed(&self, n: usize, limit: Duration) {
        self.wait_until(|c| c.closed.load(Ordering::SeqCst) >= n, limit).await;
    }

    /// Wait until at least `min_accepted` connections arrived and every
    /// accepted connection has been closed
    pub(crate) async fn wait_for_settled(&self, min_accepted: usize, limit: Duration) {
        self.wait_until(
            |c| {
                let accepted = c.accepted.load(Ordering::SeqCst);
                accepted >= min_accepted && c.closed.load(Ordering::SeqCst) == accepted
            },
            limit,
        )
        .await;
    }

    async fn wait_until(&self, done: impl Fn(&Counters) -> bool, limit: Duration) {
        let deadline = Instant::now() + limit;
        while !done(&self.counters) {
            assert!(Instant::now() < deadline, "listener condition not reached in {:?}", limit);
            sleep(Duration::from_millis(5)).await;
        }
    }
}

impl Drop for CountingListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A localhost address with nothing listening on it
pub(crate) fn refused_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    drop(listener);
    address
}
