//! First-error slot
//!
//! A single-capacity exchange: the first offered error is kept, later offers are
//! handed back to the caller without blocking.

use tokio::sync::mpsc::{self, error::TrySendError};

/// Create a connected reporter/slot pair
pub fn first_error<E>() -> (ErrorReporter<E>, ErrorSlot<E>) {
    let (tx, rx) = mpsc::channel(1);
    (ErrorReporter { tx }, ErrorSlot { rx })
}

/// Write side, cloned into every attempt
#[derive(Debug)]
pub struct ErrorReporter<E> {
    tx: mpsc::Sender<E>,
}

impl<E> Clone for ErrorReporter<E> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<E> ErrorReporter<E> {
    /// Offer an error without blocking
    ///
    /// Returns the error back if the slot is already taken or the runner has
    /// stopped listening.
    pub fn offer(&self, err: E) -> Result<(), E> {
        match self.tx.try_send(err) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(err)) | Err(TrySendError::Closed(err)) => Err(err),
        }
    }
}

/// Read side, owned by the runner
#[derive(Debug)]
pub struct ErrorSlot<E> {
    rx: mpsc::Receiver<E>,
}

impl<E> ErrorSlot<E> {
    /// Take the recorded error, if any
    pub fn take(mut self) -> Option<E> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_offer_wins() {
        let (reporter, slot) = first_error::<&str>();
        let other = reporter.clone();

        assert_eq!(reporter.offer("first"), Ok(()));
        assert_eq!(other.offer("second"), Err("second"));
        assert_eq!(reporter.offer("third"), Err("third"));
        assert_eq!(slot.take(), Some("first"));
    }

    #[test]
    fn test_empty_slot() {
        let (_reporter, slot) = first_error::<String>();
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_offer_after_slot_dropped() {
        let (reporter, slot) = first_error::<u32>();
        drop(slot);
        assert_eq!(reporter.offer(7), Err(7));
    }

    #[tokio::test]
    async fn test_concurrent_offers_keep_exactly_one() {
        let (reporter, slot) = first_error::<usize>();

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let reporter = reporter.clone();
                tokio::spawn(async move { reporter.offer(i).is_ok() })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        assert!(slot.take().is_some());
    }
}
