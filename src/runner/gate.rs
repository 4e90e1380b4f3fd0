//! Start gate
//!
//! Holds every attempt of a target at one point until all of them have arrived,
//! then releases them together. The runner opens the gate; attempts only pass it.

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{watch, Notify};

/// One-shot barrier for a fixed number of attempts
#[derive(Debug)]
pub struct StartGate {
    parties: usize,
    arrived: AtomicUsize,
    assembled: Notify,
    open: watch::Sender<bool>,
}

impl StartGate {
    /// Create a closed gate expecting `parties` attempts
    pub fn new(parties: usize) -> Self {
        let (open, _) = watch::channel(false);
        Self {
            parties,
            arrived: AtomicUsize::new(0),
            assembled: Notify::new(),
            open,
        }
    }

    /// Number of attempts that have reached the gate
    pub fn arrived(&self) -> usize {
        self.arrived.load(Ordering::Acquire)
    }

    pub fn is_open(&self) -> bool {
        *self.open.borrow()
    }

    /// Arrive at the gate and wait until it opens
    pub async fn pass(&self) {
        // Subscribe before announcing arrival so the open cannot be missed
        let mut rx = self.open.subscribe();

        if self.arrived.fetch_add(1, Ordering::AcqRel) + 1 == self.parties {
            self.assembled.notify_one();
        }

        // The sender lives in `self`, so this only returns once the gate opens
        let _ = rx.wait_for(|open| *open).await;
    }

    /// Wait for every expected attempt to arrive, then open the gate
    pub async fn open_when_assembled(&self) {
        while self.arrived() < self.parties {
            self.assembled.notified().await;
        }
        self.open();
    }

    /// Open the gate immediately
    pub fn open(&self) {
        self.open.send_replace(true);
    }
}
