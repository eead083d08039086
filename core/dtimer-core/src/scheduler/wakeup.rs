//! WakeupCoordinator — keeps the device's single alarm on the earliest key

use super::schedule::Schedule;
use crate::device::{TimerDevice, WakeupCallback};
use crate::error::TimerResult;
use tracing::trace;

/// 스케줄의 첫 키와 디바이스 알람을 맞춥니다.
pub struct WakeupCoordinator;

impl WakeupCoordinator {
    /// Disarm unconditionally, then arm at the earliest scheduled time if any.
    ///
    /// Returns the armed time.
    pub fn reconcile(
        schedule: &Schedule,
        device: &dyn TimerDevice,
        callback: &WakeupCallback,
    ) -> TimerResult<Option<u64>> {
        let first = schedule.first_key()?;
        device.remove_wakeup(callback);
        if let Some(when) = first {
            device.set_wakeup(when, callback.clone());
        }
        trace!(armed = ?first, "device alarm reconciled");
        Ok(first)
    }
}
