//! Wakeup promise table
//!
//! Promises cannot be persisted. A promise event stores only a numeric ID;
//! the resolver for that ID lives here for the lifetime of the process.
//! After a restart the table starts empty, so events fired against old IDs
//! find nothing and do nothing. Receivers of resolvers dropped by a
//! restart observe [`TimerError::Disconnected`].

use crate::error::{TimerError, TimerResult};
use crate::time::Timestamp;
use ahash::AHashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

type Resolver = oneshot::Sender<TimerResult<Timestamp>>;

/// Process-lifetime map from promise ID to pending resolver.
#[derive(Default)]
pub struct WakeupPromiseTable {
    pending: AHashMap<u64, Resolver>,
}

impl WakeupPromiseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending promise under `id`.
    pub fn insert(&mut self, id: u64) -> WakeupPromise {
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        WakeupPromise { rx }
    }

    /// Resolve and forget `id`. Returns `false` if it was not pending.
    pub fn resolve(&mut self, id: u64, scheduled: Timestamp) -> bool {
        self.settle(id, Ok(scheduled))
    }

    /// Reject and forget `id`. Returns `false` if it was not pending.
    pub fn reject(&mut self, id: u64, err: TimerError) -> bool {
        self.settle(id, Err(err))
    }

    fn settle(&mut self, id: u64, result: TimerResult<Timestamp>) -> bool {
        match self.pending.remove(&id) {
            Some(tx) => {
                // receiver may already be gone; nothing to do then
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: u64) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Promise returned by `wake_at` / `delay`.
///
/// Resolves with the scheduled time, or fails with
/// [`TimerError::Cancelled`] / [`TimerError::Disconnected`].
#[derive(Debug)]
pub struct WakeupPromise {
    rx: oneshot::Receiver<TimerResult<Timestamp>>,
}

impl WakeupPromise {
    /// Promise that is already resolved with `when`.
    pub(crate) fn resolved(when: Timestamp) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Ok(when));
        Self { rx }
    }

    /// Non-blocking check. Returns the settlement once; `None` while pending.
    pub fn try_result(&mut self) -> Option<TimerResult<Timestamp>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(TimerError::Disconnected)),
        }
    }
}

impl Future for WakeupPromise {
    type Output = TimerResult<Timestamp>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(TimerError::Disconnected)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_removes_entry() {
        let mut table = WakeupPromiseTable::new();
        let mut p = table.insert(0);
        assert!(table.contains(0));
        assert!(p.try_result().is_none());

        assert!(table.resolve(0, Timestamp::raw(30)));
        assert!(!table.contains(0));
        assert_eq!(p.try_result().unwrap().unwrap(), Timestamp::raw(30));

        // second settle is a no-op
        assert!(!table.resolve(0, Timestamp::raw(31)));
    }

    #[test]
    fn reject_delivers_cancellation() {
        let mut table = WakeupPromiseTable::new();
        let mut p = table.insert(4);
        assert!(table.reject(4, TimerError::Cancelled));
        assert!(matches!(p.try_result(), Some(Err(TimerError::Cancelled))));
        assert!(table.is_empty());
    }

    #[test]
    fn dropped_table_disconnects() {
        let mut table = WakeupPromiseTable::new();
        let mut p = table.insert(1);
        drop(table);
        assert!(matches!(p.try_result(), Some(Err(TimerError::Disconnected))));
    }

    #[test]
    fn missing_id_is_noop() {
        let mut table = WakeupPromiseTable::new();
        assert!(!table.resolve(12, Timestamp::raw(1)));
        assert!(!table.reject(12, TimerError::Cancelled));
        assert_eq!(table.len(), 0);
    }

    #[tokio::test]
    async fn awaiting_a_resolved_promise() {
        let p = WakeupPromise::resolved(Timestamp::raw(8));
        assert_eq!(p.await.unwrap(), Timestamp::raw(8));
    }
}
