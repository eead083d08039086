//! Clock device interface
//!
//! 디바이스는 폴링 방식이며 알람을 하나만 가집니다. 알람 시각 이후(훨씬 나중일 수도 있음)에
//! 등록된 콜백을 한 번 호출합니다. 더 일찍 호출하지는 않습니다.

pub mod manual;

pub use manual::ManualTimerDevice;

use std::fmt;
use std::sync::Weak;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// External polled clock holding at most one armed alarm.
///
/// Implementations must not invoke the callback synchronously from
/// `set_wakeup` or `remove_wakeup`; the service calls both while holding
/// its state lock.
pub trait TimerDevice: Send + Sync {
    /// Time observed at the most recent poll.
    fn get_last_polled(&self) -> u64;

    /// Arm (or replace) the alarm.
    fn set_wakeup(&self, when: u64, callback: WakeupCallback);

    /// Disarm if `callback` is the armed one. Idempotent.
    fn remove_wakeup(&self, callback: &WakeupCallback);
}

/// Receiver of device wakeups.
pub trait WakeupTarget: Send + Sync {
    fn process_and_reschedule(&self);
}

static NEXT_CALLBACK_ID: AtomicU64 = AtomicU64::new(1);

/// The single continuation a service hands to its device.
///
/// Holds the service weakly; waking a dropped service does nothing.
#[derive(Clone)]
pub struct WakeupCallback {
    id: u64,
    target: Option<Weak<dyn WakeupTarget>>,
}

impl WakeupCallback {
    pub fn new(target: Weak<dyn WakeupTarget>) -> Self {
        Self {
            id: NEXT_CALLBACK_ID.fetch_add(1, Ordering::Relaxed),
            target: Some(target),
        }
    }

    /// Callback with no receiver.
    pub fn detached() -> Self {
        Self {
            id: NEXT_CALLBACK_ID.fetch_add(1, Ordering::Relaxed),
            target: None,
        }
    }

    /// Deliver the wakeup.
    pub fn wake(&self) {
        match self.target.as_ref().and_then(Weak::upgrade) {
            Some(target) => target.process_and_reschedule(),
            None => debug!(callback = self.id, "wakeup for a dropped service ignored"),
        }
    }
}

impl PartialEq for WakeupCallback {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for WakeupCallback {}

impl fmt::Debug for WakeupCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WakeupCallback({})", self.id)
    }
}
