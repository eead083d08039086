//! Manually driven timer device
//!
//! 외부에서 시간을 넣고 `poll()`로 알람을 전달하는 디바이스. 테스트와 임베더용.

use super::{TimerDevice, WakeupCallback};
use parking_lot::Mutex;
use tracing::trace;

#[derive(Default)]
struct ManualState {
    now: u64,
    alarm: Option<(u64, WakeupCallback)>,
}

/// Polled device whose time only moves when told to.
#[derive(Default)]
pub struct ManualTimerDevice {
    state: Mutex<ManualState>,
}

impl ManualTimerDevice {
    pub fn new(now: u64) -> Self {
        Self {
            state: Mutex::new(ManualState { now, alarm: None }),
        }
    }

    pub fn now(&self) -> u64 {
        self.state.lock().now
    }

    /// Set the polled time. Does not deliver anything; call [`poll`](Self::poll).
    pub fn set_time(&self, now: u64) {
        self.state.lock().now = now;
    }

    /// Move time forward by `delta` and poll.
    pub fn advance_by(&self, delta: u64) -> bool {
        {
            let mut state = self.state.lock();
            state.now = state.now.saturating_add(delta);
        }
        self.poll()
    }

    /// Currently armed alarm time.
    pub fn armed(&self) -> Option<u64> {
        self.state.lock().alarm.as_ref().map(|(when, _)| *when)
    }

    /// Deliver the alarm if it is due. Returns whether a callback ran.
    ///
    /// The alarm is cleared before delivery; the receiver re-arms it.
    pub fn poll(&self) -> bool {
        let due = {
            let mut state = self.state.lock();
            let now = state.now;
            if state.alarm.as_ref().is_some_and(|(when, _)| *when <= now) {
                state.alarm.take()
            } else {
                None
            }
        };
        match due {
            Some((when, callback)) => {
                trace!(when, "manual device delivering wakeup");
                callback.wake();
                true
            }
            None => false,
        }
    }
}

impl TimerDevice for ManualTimerDevice {
    fn get_last_polled(&self) -> u64 {
        self.now()
    }

    fn set_wakeup(&self, when: u64, callback: WakeupCallback) {
        self.state.lock().alarm = Some((when, callback));
    }

    fn remove_wakeup(&self, callback: &WakeupCallback) {
        let mut state = self.state.lock();
        if matches!(&state.alarm, Some((_, armed)) if armed == callback) {
            state.alarm = None;
        }
    }
}
