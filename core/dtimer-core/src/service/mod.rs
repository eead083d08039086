//! TimerService — the public facade
//!
//! 모든 상태 변경은 하나의 락 아래에서 끝까지 실행됩니다. 핸들러 호출과 응답 처리는
//! 락을 놓은 뒤에 실행되므로 핸들러가 같은 스레드에서 서비스를 다시 호출해도 됩니다.
//! 더 이상 참조되지 않는 waker도 락을 놓은 뒤에 drop됩니다 (`StateGuard`).

mod clock;
mod constructors;
mod handles;
pub mod meta;
mod repeater;
mod wakeups;

pub use clock::Clock;
pub use meta::MetaTable;
pub use repeater::{REPEATERS_TABLE, Repeater};

use crate::config::DurabilityLevel;
use crate::device::{TimerDevice, WakeupCallback, WakeupTarget};
use crate::error::{TimerError, TimerResult};
use crate::refs::{CancelToken, WakeOutcome, WakeReply, WakerRef};
use crate::scheduler::{
    EventId, EventKind, EventPhase, EventRecord, FireEffect, ReplyRoute, SchedulerState,
    WakeupCoordinator,
};
use crate::storage::StoreVariant;
use crate::time::{RelativeTime, TimerBrand, Timestamp};
use parking_lot::{Mutex, MutexGuard};
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Weak};
use tracing::{debug, error, warn};

/// 내구성 타이머 서비스
///
/// 하나의 폴링 디바이스 알람 위에 one-shot 웨이크업, promise 지연, 반복 타이머를
/// 다중화합니다. 대기 중인 이벤트는 저장소에 기록되어 재시작 후에도 유지됩니다.
///
/// # 예제
///
/// ```rust
/// use dtimer_core::{ManualTimerDevice, TimerService, Timestamp, waker_fn};
/// use std::sync::Arc;
///
/// # fn main() -> dtimer_core::TimerResult<()> {
/// let device = Arc::new(ManualTimerDevice::new(0));
/// let timer = TimerService::open_in_memory(device.clone())?;
///
/// let handler = timer.export_waker(waker_fn(|t| {
///     println!("woke for {t}");
///     Ok(())
/// }))?;
/// timer.set_wakeup(Timestamp::raw(30), &handler, None)?;
/// assert_eq!(device.armed(), Some(30));
///
/// device.set_time(30);
/// device.poll();
/// assert_eq!(device.armed(), None);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TimerService {
    pub(crate) inner: Arc<Inner>,
}

pub(crate) struct Inner {
    /// Weak self-reference handed to repeater replies
    this: Weak<Inner>,
    brand: TimerBrand,
    device: Arc<dyn TimerDevice>,
    callback: WakeupCallback,
    store: StoreVariant,
    meta: MetaTable,
    durability: DurabilityLevel,
    state: Mutex<SchedulerState>,
}

/// Scheduler state lock. Wakers released while it was held are dropped
/// with the mutex unlocked, since dropping one may settle a repeater reply.
pub(crate) struct StateGuard<'a> {
    guard: MutexGuard<'a, SchedulerState>,
}

impl Deref for StateGuard<'_> {
    type Target = SchedulerState;

    fn deref(&self) -> &SchedulerState {
        &self.guard
    }
}

impl DerefMut for StateGuard<'_> {
    fn deref_mut(&mut self) -> &mut SchedulerState {
        &mut self.guard
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        let retired = self.guard.wakers.take_retired();
        if !retired.is_empty() {
            MutexGuard::unlocked(&mut self.guard, move || drop(retired));
        }
    }
}

impl WakeupTarget for Inner {
    fn process_and_reschedule(&self) {
        if let Err(err) = self.process_due() {
            error!(%err, "processing device wakeup failed");
        }
    }
}

impl Inner {
    pub(crate) fn lock_state(&self) -> StateGuard<'_> {
        StateGuard {
            guard: self.state.lock(),
        }
    }

    fn now(&self) -> u64 {
        self.device.get_last_polled()
    }

    fn stamp(&self, value: u64) -> Timestamp {
        Timestamp::branded(value, self.brand)
    }

    fn check_brand(&self, brand: Option<TimerBrand>) -> TimerResult<()> {
        match brand {
            Some(other) if other != self.brand => Err(TimerError::BrandMismatch {
                left: other.to_string(),
                right: self.brand.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Raw value of an incoming timestamp that must belong to this clock.
    fn accept_time(&self, time: Timestamp) -> TimerResult<u64> {
        self.check_brand(time.brand())?;
        Ok(time.abs_value())
    }

    fn accept_rel(&self, rel: RelativeTime) -> TimerResult<u64> {
        self.check_brand(rel.brand())?;
        Ok(rel.rel_value())
    }

    /// Durable ID of a handler exported by this service.
    fn check_waker(&self, handler: &WakerRef) -> TimerResult<u64> {
        if handler.brand() != self.brand {
            return Err(TimerError::InvalidArgument(format!(
                "handler {} was exported by another timer service",
                handler.id()
            )));
        }
        Ok(handler.id())
    }

    fn check_token(&self, token: Option<&CancelToken>) -> TimerResult<Option<CancelToken>> {
        match token {
            Some(token) if token.brand() != self.brand => Err(TimerError::InvalidArgument(
                format!("cancel token {} was issued by another timer service", token.id()),
            )),
            other => Ok(other.copied()),
        }
    }

    /// Create, schedule and persist a new event. Returns its first time.
    ///
    /// `handler`'s waker stays bound while the event is alive.
    fn schedule_event(
        &self,
        state: &mut SchedulerState,
        kind: EventKind,
        token: Option<CancelToken>,
        handler: Option<&WakerRef>,
    ) -> TimerResult<u64> {
        let id = EventId(self.meta.allocate(meta::NEXT_EVENT_ID)?);
        let record = EventRecord::new(id, kind, token, self.now())?;
        let at = record.schedule_yourself(state)?;
        if let (Some(waker_id), Some(handler)) = (record.kind.handler(), handler) {
            state.wakers.acquire(waker_id, handler.waker());
        }
        Ok(at)
    }

    fn wake_at_locked(
        &self,
        state: &mut SchedulerState,
        when: u64,
        token: Option<CancelToken>,
    ) -> TimerResult<crate::scheduler::WakeupPromise> {
        let promise_id = self.meta.allocate(meta::NEXT_PROMISE_ID)?;
        self.schedule_event(state, EventKind::PromiseWakeup { when, promise_id }, token, None)?;
        let promise = state.promises.insert(promise_id);
        self.commit(state)?;
        Ok(promise)
    }

    fn repeat_locked(
        &self,
        state: &mut SchedulerState,
        start: u64,
        interval: u64,
        handler: &WakerRef,
        token: Option<CancelToken>,
    ) -> TimerResult<u64> {
        if interval == 0 {
            return Err(TimerError::InvalidArgument(
                "interval must be nonzero".to_string(),
            ));
        }
        let waker_id = self.check_waker(handler)?;
        self.schedule_event(
            state,
            EventKind::Repeater {
                start,
                interval,
                handler: waker_id,
            },
            token,
            Some(handler),
        )
    }

    /// Cancel every event guarded by `token`. Returns how many were cancelled.
    fn cancel_locked(&self, state: &mut SchedulerState, token: &CancelToken) -> TimerResult<usize> {
        let Some(guarded) = state.cancels.lookup(token)? else {
            return Ok(0);
        };
        let mut cancelled = 0;
        for id in guarded {
            if let Some(record) = state.events.load(id)? {
                record.cancel(state)?;
                cancelled += 1;
            }
        }
        Ok(cancelled)
    }

    /// Reload in-memory bookkeeping from the stored events.
    ///
    /// A repeater saved as EXECUTING lost its reply with the previous process.
    /// The disconnect counts as a rejection, so it is cancelled.
    /// Returns how many were cancelled.
    fn restore_locked(&self, state: &mut SchedulerState) -> TimerResult<usize> {
        let records = state.events.all()?;
        for record in &records {
            if let Some(waker_id) = record.kind.handler() {
                state.wakers.restore(waker_id);
            }
        }
        let mut interrupted = 0;
        for record in records {
            if record.phase == EventPhase::Executing {
                warn!(event_id = record.id.0, "repeater reply lost across restart; cancelling");
                record.cancel(state)?;
                interrupted += 1;
            }
        }
        Ok(interrupted)
    }

    /// Re-arm the device and persist. Ends every mutating operation.
    fn commit(&self, state: &SchedulerState) -> TimerResult<Option<u64>> {
        let armed = WakeupCoordinator::reconcile(&state.schedule, self.device.as_ref(), &self.callback)?;
        self.persist()?;
        Ok(armed)
    }

    fn persist(&self) -> TimerResult<()> {
        match self.durability {
            DurabilityLevel::Full => self.store.flush(),
            DurabilityLevel::Lazy => Ok(()),
        }
    }

    /// Fire everything due at the current device time, then re-arm.
    ///
    /// Handlers run even if re-arming or persisting fails; their events are
    /// already out of the schedule.
    fn process_due(&self) -> TimerResult<()> {
        let (effects, committed) = {
            let mut state = self.lock_state();
            let now = self.now();
            let due = state.schedule.drain_up_to(now)?;
            let mut effects = Vec::with_capacity(due.len());
            for (at, id) in due {
                match self.fire_one(&mut state, at, id) {
                    Ok(Some(effect)) => effects.push(effect),
                    Ok(None) => {}
                    Err(err) => error!(event_id = id.0, when = at, %err, "event failed to fire"),
                }
            }
            let committed = self.commit(&state);
            (effects, committed)
        };
        self.run_effects(effects);
        committed.map(|_| ())
    }

    fn fire_one(
        &self,
        state: &mut SchedulerState,
        at: u64,
        id: EventId,
    ) -> TimerResult<Option<FireEffect>> {
        match state.events.load(id)? {
            Some(record) => record.fired(state, at),
            None => {
                debug!(event_id = id.0, when = at, "schedule entry without record; skipped");
                Ok(None)
            }
        }
    }

    /// Invoke handlers. Must run with the state lock released.
    fn run_effects(&self, effects: Vec<FireEffect>) {
        for effect in effects {
            let reply = match effect.route {
                ReplyRoute::Detached => WakeReply::detached(effect.event_id.0),
                ReplyRoute::Repeater => self.repeater_reply(effect.event_id),
            };
            effect.waker.wake(effect.scheduled, reply);
        }
    }

    fn repeater_reply(&self, id: EventId) -> WakeReply {
        let this = self.this.clone();
        WakeReply::new(move |outcome| match this.upgrade() {
            Some(inner) => {
                if let Err(err) = inner.repeater_settled(id, outcome) {
                    error!(event_id = id.0, %err, "repeater reply handling failed");
                }
            }
            None => debug!(event_id = id.0, "repeater replied after service dropped"),
        })
    }

    fn repeater_settled(&self, id: EventId, outcome: WakeOutcome) -> TimerResult<()> {
        let mut state = self.lock_state();
        let Some(record) = state.events.load(id)? else {
            // cancelled while the handler was running
            debug!(event_id = id.0, "repeater gone before reply");
            return Ok(());
        };
        match outcome {
            Ok(()) => {
                record.reschedule_yourself(&state, self.now())?;
            }
            Err(reason) => {
                warn!(event_id = id.0, %reason, "repeater handler rejected; cancelling");
                record.cancel(&mut state)?;
            }
        }
        self.commit(&state)?;
        Ok(())
    }
}

impl TimerService {
    /// Device-callback entry point: fire all due events and re-arm.
    ///
    /// Normally reached through the device's [`WakeupCallback`]; calling it
    /// directly is harmless.
    pub fn process_and_reschedule(&self) -> TimerResult<()> {
        self.inner.process_due()
    }

    pub fn get_timer_brand(&self) -> TimerBrand {
        self.inner.brand
    }

    /// Whether `candidate` is this timer service (same brand).
    pub fn is_my_timer_service(&self, candidate: &TimerService) -> bool {
        self.inner.brand.is_my_timer_service(candidate)
    }

    /// Read-only facet.
    pub fn get_clock(&self) -> Clock {
        Clock::new(self.clone())
    }

    /// 저장소에 남아있는 이벤트 수 (진단용)
    pub fn pending_events(&self) -> TimerResult<usize> {
        self.inner.lock_state().events.count()
    }

    /// Flush the backing store regardless of durability level.
    pub fn flush(&self) -> TimerResult<()> {
        self.inner.store.flush()
    }
}
