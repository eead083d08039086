//! Remote references: wake handlers, cancel tokens and wake replies.
//!
//! Durable events never hold live objects. They hold the durable ID of a
//! [`WakerRef`] or [`CancelToken`]; the live `Arc<dyn TimerWaker>` behind a
//! waker ID is bound in a process-lifetime table and must be rebound after
//! a restart (see `TimerService::rebind_waker`).

use crate::time::{TimerBrand, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Outcome of one `wake()` call: `Err` carries the rejection reason.
pub type WakeOutcome = Result<(), String>;

/// A handler that can be woken by the timer service.
///
/// `wake` is invoked with the time the wakeup was scheduled for (not the
/// time it was observed). The handler settles `reply` now or later, from
/// any thread. Dropping `reply` unsettled counts as a rejection.
pub trait TimerWaker: Send + Sync {
    fn wake(&self, scheduled: Timestamp, reply: WakeReply);
}

/// Adapter turning a synchronous closure into a [`TimerWaker`].
pub struct FnWaker<F>(pub F);

impl<F> TimerWaker for FnWaker<F>
where
    F: Fn(Timestamp) -> WakeOutcome + Send + Sync,
{
    fn wake(&self, scheduled: Timestamp, reply: WakeReply) {
        match (self.0)(scheduled) {
            Ok(()) => reply.fulfill(),
            Err(reason) => reply.reject(reason),
        }
    }
}

/// Wrap a closure as a shareable waker.
pub fn waker_fn<F>(f: F) -> Arc<dyn TimerWaker>
where
    F: Fn(Timestamp) -> WakeOutcome + Send + Sync + 'static,
{
    Arc::new(FnWaker(f))
}

type ReplySink = Box<dyn FnOnce(WakeOutcome) + Send>;

/// Success/failure channel of a single `wake()` call.
pub struct WakeReply {
    sink: Option<ReplySink>,
}

impl WakeReply {
    pub(crate) fn new(sink: impl FnOnce(WakeOutcome) + Send + 'static) -> Self {
        Self {
            sink: Some(Box::new(sink)),
        }
    }

    /// Reply whose outcome is only logged.
    pub(crate) fn detached(event_id: u64) -> Self {
        Self::new(move |outcome| {
            if let Err(reason) = outcome {
                debug!(event_id, %reason, "one-shot handler rejected; ignored");
            }
        })
    }

    pub fn fulfill(mut self) {
        self.settle(Ok(()));
    }

    pub fn reject(mut self, reason: impl Into<String>) {
        self.settle(Err(reason.into()));
    }

    fn settle(&mut self, outcome: WakeOutcome) {
        if let Some(sink) = self.sink.take() {
            sink(outcome);
        }
    }
}

impl Drop for WakeReply {
    fn drop(&mut self) {
        self.settle(Err("wake reply dropped without settling".to_string()));
    }
}

impl fmt::Debug for WakeReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WakeReply")
            .field("settled", &self.sink.is_none())
            .finish()
    }
}

/// Durable reference to a wake handler.
///
/// Identity is the `(brand, id)` pair; the live handler is attached.
#[derive(Clone)]
pub struct WakerRef {
    id: u64,
    brand: TimerBrand,
    waker: Arc<dyn TimerWaker>,
}

impl WakerRef {
    pub(crate) fn new(id: u64, brand: TimerBrand, waker: Arc<dyn TimerWaker>) -> Self {
        Self { id, brand, waker }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn brand(&self) -> TimerBrand {
        self.brand
    }

    pub(crate) fn waker(&self) -> &Arc<dyn TimerWaker> {
        &self.waker
    }
}

impl PartialEq for WakerRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.brand == other.brand
    }
}

impl Eq for WakerRef {}

impl fmt::Debug for WakerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WakerRef({}, {})", self.id, self.brand)
    }
}

/// Opaque reference grouping one or more events for later cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CancelToken {
    id: u64,
    brand: TimerBrand,
}

impl CancelToken {
    pub(crate) fn new(id: u64, brand: TimerBrand) -> Self {
        Self { id, brand }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn brand(&self) -> TimerBrand {
        self.brand
    }
}
