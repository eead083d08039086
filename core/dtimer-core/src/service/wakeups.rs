//! One-shot wakeups, promise delays, repeaters and cancellation

use super::TimerService;
use crate::error::{TimerError, TimerResult};
use crate::refs::{CancelToken, WakeReply, WakerRef};
use crate::scheduler::{EventKind, WakeupPromise};
use crate::time::{RelativeTime, Timestamp};
use tracing::{debug, instrument};

impl TimerService {
    /// Current device time, branded with this service's brand.
    pub fn get_current_timestamp(&self) -> Timestamp {
        self.inner.stamp(self.inner.now())
    }

    /// `handler.wake(when)`을 예약합니다.
    ///
    /// `when`이 이미 지났으면 스케줄을 거치지 않고 즉시 호출합니다.
    /// 핸들러의 거절은 무시됩니다.
    #[instrument(level = "debug", skip(self, handler), fields(handler = handler.id()))]
    pub fn set_wakeup(
        &self,
        when: Timestamp,
        handler: &WakerRef,
        cancel_token: Option<&CancelToken>,
    ) -> TimerResult<Timestamp> {
        let inner = &self.inner;
        let when = inner.accept_time(when)?;
        let stamp = inner.stamp(when);
        {
            let mut state = inner.lock_state();
            let token = inner.check_token(cancel_token)?;
            let waker_id = inner.check_waker(handler)?;
            if when > inner.now() {
                inner.schedule_event(
                    &mut state,
                    EventKind::OneShot {
                        when,
                        handler: waker_id,
                    },
                    token,
                    Some(handler),
                )?;
                inner.commit(&state)?;
                return Ok(stamp);
            }
        }

        debug!(when, "wakeup already due; firing now");
        handler.waker().wake(
            stamp,
            WakeReply::new(move |outcome| {
                if let Err(reason) = outcome {
                    debug!(when, %reason, "immediate wakeup rejected; ignored");
                }
            }),
        );
        Ok(stamp)
    }

    /// Promise resolving with `when` once the clock reaches it.
    ///
    /// A past `when` resolves immediately.
    #[instrument(level = "debug", skip(self))]
    pub fn wake_at(
        &self,
        when: Timestamp,
        cancel_token: Option<&CancelToken>,
    ) -> TimerResult<WakeupPromise> {
        let inner = &self.inner;
        let when = inner.accept_time(when)?;
        let token = inner.check_token(cancel_token)?;
        if when <= inner.now() {
            return Ok(WakeupPromise::resolved(inner.stamp(when)));
        }
        let mut state = inner.lock_state();
        inner.wake_at_locked(&mut state, when, token)
    }

    /// Promise resolving at `now + delay`. `delay` must be positive.
    #[instrument(level = "debug", skip(self))]
    pub fn delay(
        &self,
        delay: RelativeTime,
        cancel_token: Option<&CancelToken>,
    ) -> TimerResult<WakeupPromise> {
        let inner = &self.inner;
        let delay = inner.accept_rel(delay)?;
        if delay == 0 {
            return Err(TimerError::InvalidArgument(
                "delay must be positive".to_string(),
            ));
        }
        let token = inner.check_token(cancel_token)?;
        let now = inner.now();
        let when = now.checked_add(delay).ok_or_else(|| {
            TimerError::Arithmetic(format!("delay overflows: now={now} delay={delay}"))
        })?;
        let mut state = inner.lock_state();
        inner.wake_at_locked(&mut state, when, token)
    }

    /// Cancel everything guarded by `token`.
    ///
    /// Unknown, already-used and foreign tokens are ignored.
    #[instrument(level = "debug", skip(self))]
    pub fn cancel(&self, token: &CancelToken) -> TimerResult<()> {
        let inner = &self.inner;
        if token.brand() != inner.brand {
            debug!(token = token.id(), "foreign cancel token ignored");
            return Ok(());
        }
        let mut state = inner.lock_state();
        let cancelled = inner.cancel_locked(&mut state, token)?;
        inner.commit(&state)?;
        debug!(token = token.id(), cancelled, "cancel processed");
        Ok(())
    }

    /// `start + k * interval` 시각마다 `handler`를 깨웁니다.
    ///
    /// 다음 틱은 핸들러가 응답을 fulfill한 뒤에 예약되며 놓친 틱은 건너뜁니다.
    /// 거절하면 반복이 취소됩니다. 첫 예약 시각을 반환합니다.
    #[instrument(level = "debug", skip(self, handler), fields(handler = handler.id()))]
    pub fn repeat(
        &self,
        start: Timestamp,
        interval: RelativeTime,
        handler: &WakerRef,
        cancel_token: Option<&CancelToken>,
    ) -> TimerResult<Timestamp> {
        let inner = &self.inner;
        let start = inner.accept_time(start)?;
        let interval = inner.accept_rel(interval)?;
        let token = inner.check_token(cancel_token)?;
        let mut state = inner.lock_state();
        let first = inner.repeat_locked(&mut state, start, interval, handler, token)?;
        inner.commit(&state)?;
        Ok(inner.stamp(first))
    }
}
