//! Event records and their state machine
//!
//! 이벤트는 durable 레코드(태그된 enum)로 저장되고, 동작은 태그에 따라 다시 붙습니다.
//!
//! | 종류            | fired                                 | cancel                    |
//! |-----------------|---------------------------------------|---------------------------|
//! | `OneShot`       | handler.wake (응답 무시) 후 삭제       | 스케줄에서 제거 후 삭제    |
//! | `PromiseWakeup` | promise resolve 후 삭제 (없으면 무시) | promise reject 후 삭제     |
//! | `Repeater`      | EXECUTING 진입, 응답에 따라 재예약     | 스케줄에서 제거 후 삭제    |

use super::SchedulerState;
use crate::error::{TimerError, TimerResult};
use crate::refs::{CancelToken, TimerWaker};
use crate::storage::{StoreVariant, u64_key};
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

pub const EVENTS_TABLE: &str = "events";

/// Durable event identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}", self.0)
    }
}

/// What an event does when it fires. Handlers are stored by durable ref ID.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    OneShot { when: u64, handler: u64 },
    PromiseWakeup { when: u64, promise_id: u64 },
    Repeater { start: u64, interval: u64, handler: u64 },
}

impl EventKind {
    /// First time this event should be placed in the schedule.
    pub fn first_fire_time(&self, now: u64) -> TimerResult<u64> {
        match self {
            Self::OneShot { when, .. } | Self::PromiseWakeup { when, .. } => Ok(*when),
            Self::Repeater {
                start, interval, ..
            } => next_fire_time(*start, *interval, now),
        }
    }

    /// Waker ID this event wakes, if any.
    pub fn handler(&self) -> Option<u64> {
        match self {
            Self::OneShot { handler, .. } | Self::Repeater { handler, .. } => Some(*handler),
            Self::PromiseWakeup { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OneShot { .. } => "one-shot",
            Self::PromiseWakeup { .. } => "promise",
            Self::Repeater { .. } => "repeater",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPhase {
    /// In the schedule under `at`
    Scheduled { at: u64 },
    /// Repeater waiting for its handler's reply
    Executing,
    Cancelled,
}

/// Persisted event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub kind: EventKind,
    pub phase: EventPhase,
    pub cancel_token: Option<CancelToken>,
}

/// How the service should route the reply of a handler invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyRoute {
    /// One-shot: reply is only logged
    Detached,
    /// Repeater: fulfill reschedules, reject cancels
    Repeater,
}

/// A handler invocation produced by `fired`, run after the state lock is released.
pub struct FireEffect {
    pub event_id: EventId,
    pub waker: Arc<dyn TimerWaker>,
    pub scheduled: Timestamp,
    pub route: ReplyRoute,
}

impl fmt::Debug for FireEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FireEffect")
            .field("event_id", &self.event_id)
            .field("scheduled", &self.scheduled)
            .field("route", &self.route)
            .finish()
    }
}

/// Smallest `start + k * interval` strictly after `now`, or `start` if
/// `now` is still before it.
///
/// Missed ticks are skipped, never replayed.
pub fn next_fire_time(start: u64, interval: u64, now: u64) -> TimerResult<u64> {
    if interval == 0 {
        return Err(TimerError::InvalidArgument(
            "interval must be nonzero".to_string(),
        ));
    }
    if now < start {
        return Ok(start);
    }
    let into_period = (now - start) % interval;
    now.checked_add(interval - into_period).ok_or_else(|| {
        TimerError::Arithmetic(format!(
            "next fire time overflows: now={now} interval={interval}"
        ))
    })
}

impl EventRecord {
    /// New record, placed at its first fire time.
    pub fn new(
        id: EventId,
        kind: EventKind,
        cancel_token: Option<CancelToken>,
        now: u64,
    ) -> TimerResult<Self> {
        let at = kind.first_fire_time(now)?;
        Ok(Self {
            id,
            kind,
            phase: EventPhase::Scheduled { at },
            cancel_token,
        })
    }

    /// Insert into the schedule, register the cancel token and persist.
    /// Returns the scheduled time.
    pub fn schedule_yourself(&self, state: &SchedulerState) -> TimerResult<u64> {
        let EventPhase::Scheduled { at } = self.phase else {
            return Err(TimerError::InvalidArgument(format!(
                "{} is not schedulable in phase {:?}",
                self.id, self.phase
            )));
        };
        state.schedule.insert(at, self.id)?;
        if let Some(token) = &self.cancel_token {
            state.cancels.register(token, self.id)?;
        }
        state.events.save(self)?;
        debug!(event_id = self.id.0, when = at, kind = self.kind.name(), "event scheduled");
        Ok(at)
    }

    /// Called once the event has been drained from the schedule at `scheduled`.
    pub fn fired(
        mut self,
        state: &mut SchedulerState,
        scheduled: u64,
    ) -> TimerResult<Option<FireEffect>> {
        if !matches!(self.phase, EventPhase::Scheduled { .. }) {
            debug!(event_id = self.id.0, phase = ?self.phase, "fired outside schedule; ignored");
            return Ok(None);
        }
        let stamp = state.stamp(scheduled);

        match self.kind {
            EventKind::OneShot { handler, .. } => {
                let waker = state.wakers.get(handler).cloned();
                self.retire(state)?;
                match waker {
                    Some(waker) => Ok(Some(FireEffect {
                        event_id: self.id,
                        waker,
                        scheduled: stamp,
                        route: ReplyRoute::Detached,
                    })),
                    None => {
                        warn!(event_id = self.id.0, handler, "one-shot handler not bound; dropped");
                        Ok(None)
                    }
                }
            }
            EventKind::PromiseWakeup { promise_id, .. } => {
                self.retire(state)?;
                if !state.promises.resolve(promise_id, stamp) {
                    debug!(event_id = self.id.0, promise_id, "promise no longer pending");
                }
                Ok(None)
            }
            EventKind::Repeater { handler, .. } => {
                self.phase = EventPhase::Executing;
                let Some(waker) = state.wakers.get(handler).cloned() else {
                    warn!(event_id = self.id.0, handler, "repeater handler not bound; cancelling");
                    self.cancel(state)?;
                    return Ok(None);
                };
                state.events.save(&self)?;
                Ok(Some(FireEffect {
                    event_id: self.id,
                    waker,
                    scheduled: stamp,
                    route: ReplyRoute::Repeater,
                }))
            }
        }
    }

    /// Repeater reply was fulfilled: place the next tick after `now`.
    /// Returns the new time, or `None` if there was nothing to do.
    pub fn reschedule_yourself(
        mut self,
        state: &SchedulerState,
        now: u64,
    ) -> TimerResult<Option<u64>> {
        let EventKind::Repeater {
            start, interval, ..
        } = self.kind
        else {
            return Ok(None);
        };
        if self.phase != EventPhase::Executing {
            return Ok(None);
        }
        let next = next_fire_time(start, interval, now)?;
        self.phase = EventPhase::Scheduled { at: next };
        state.schedule.insert(next, self.id)?;
        state.events.save(&self)?;
        debug!(event_id = self.id.0, when = next, "repeater rescheduled");
        Ok(Some(next))
    }

    /// Cancel and destroy. Safe to call in any phase.
    pub fn cancel(mut self, state: &mut SchedulerState) -> TimerResult<()> {
        if let Some(token) = &self.cancel_token {
            state.cancels.unregister(Some(token), self.id)?;
        }
        if let EventPhase::Scheduled { at } = self.phase {
            state.schedule.remove(at, self.id)?;
        }
        if let EventKind::PromiseWakeup { promise_id, .. } = self.kind {
            state.promises.reject(promise_id, TimerError::Cancelled);
        }
        if let Some(handler) = self.kind.handler() {
            state.wakers.release(handler);
        }
        self.phase = EventPhase::Cancelled;
        state.events.remove(self.id)?;
        debug!(event_id = self.id.0, kind = self.kind.name(), "event cancelled");
        Ok(())
    }

    /// Fired non-repeating event: stop tracking the token and delete.
    fn retire(&self, state: &mut SchedulerState) -> TimerResult<()> {
        if let Some(token) = &self.cancel_token {
            state.cancels.unregister(Some(token), self.id)?;
        }
        if let Some(handler) = self.kind.handler() {
            state.wakers.release(handler);
        }
        state.events.remove(self.id)?;
        Ok(())
    }
}

/// Event records keyed by big-endian event ID.
#[derive(Clone)]
pub struct EventTable {
    store: StoreVariant,
}

impl EventTable {
    pub fn new(store: StoreVariant) -> Self {
        Self { store }
    }

    pub fn load(&self, id: EventId) -> TimerResult<Option<EventRecord>> {
        self.store
            .get(EVENTS_TABLE, &u64_key(id.0))?
            .map(|bytes| bincode::deserialize(&bytes).map_err(Into::into))
            .transpose()
    }

    pub fn save(&self, record: &EventRecord) -> TimerResult<()> {
        let bytes = bincode::serialize(record)?;
        self.store.insert(EVENTS_TABLE, &u64_key(record.id.0), &bytes)
    }

    pub fn remove(&self, id: EventId) -> TimerResult<bool> {
        self.store.delete(EVENTS_TABLE, &u64_key(id.0))
    }

    /// 살아있는 이벤트 수
    pub fn count(&self) -> TimerResult<usize> {
        self.store.count(EVENTS_TABLE)
    }

    /// Every stored record in ID order. Used when reopening a store.
    pub fn all(&self) -> TimerResult<Vec<EventRecord>> {
        self.store
            .scan(EVENTS_TABLE, ..)?
            .into_iter()
            .map(|(_, bytes)| bincode::deserialize(&bytes).map_err(Into::into))
            .collect()
    }
}
