//! Repeater — control object for a periodic wakeup
//!
//! `make_repeater`는 시작 시각만 고정하고 예약하지 않습니다. 실제 예약은
//! `schedule(handler)`에서 한 번만 일어나며, `disable()`로 취소합니다.
//! 시작 시각과 간격은 `repeaters` 테이블에 저장되어 재시작 후 `open_repeater`로
//! 다시 열 수 있습니다. 활성 여부는 따로 저장하지 않고, 전용 취소 토큰이 아직
//! 이벤트를 보호하고 있는지로 판단합니다. 핸들러 거절이나 재시작으로 이벤트가
//! 취소되면 자동으로 비활성이 됩니다.

use super::{TimerService, meta};
use crate::error::{TimerError, TimerResult};
use crate::refs::{CancelToken, WakerRef};
use crate::storage::{StoreVariant, u64_key};
use crate::time::{RelativeTime, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

pub const REPEATERS_TABLE: &str = "repeaters";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct RepeaterRecord {
    start: u64,
    interval: u64,
}

fn load(store: &StoreVariant, id: u64) -> TimerResult<RepeaterRecord> {
    let bytes = store
        .get(REPEATERS_TABLE, &u64_key(id))?
        .ok_or(TimerError::RepeaterNotFound(id))?;
    Ok(bincode::deserialize(&bytes)?)
}

fn save(store: &StoreVariant, id: u64, record: &RepeaterRecord) -> TimerResult<()> {
    let bytes = bincode::serialize(record)?;
    store.insert(REPEATERS_TABLE, &u64_key(id), &bytes)
}

/// Periodic wakeup at `start + k * interval`, controlled by `schedule`/`disable`.
///
/// The repeater owns a private cancel token; its ID is the repeater's ID.
#[derive(Clone)]
pub struct Repeater {
    service: TimerService,
    token: CancelToken,
    start: u64,
    interval: u64,
}

impl Repeater {
    pub fn id(&self) -> u64 {
        self.token.id()
    }

    pub fn start(&self) -> Timestamp {
        self.service.inner.stamp(self.start)
    }

    pub fn interval(&self) -> RelativeTime {
        RelativeTime::branded(self.interval, self.service.inner.brand)
    }

    /// Start waking `handler`. Returns the first scheduled time.
    ///
    /// Fails with [`TimerError::RepeaterAlreadyActive`] if already scheduled.
    #[instrument(level = "debug", skip(self, handler), fields(repeater = self.id()))]
    pub fn schedule(&self, handler: &WakerRef) -> TimerResult<Timestamp> {
        let inner = &self.service.inner;
        let mut state = inner.lock_state();
        let record = load(&inner.store, self.id())?;
        if state.cancels.lookup(&self.token)?.is_some() {
            return Err(TimerError::RepeaterAlreadyActive);
        }
        let first = inner.repeat_locked(
            &mut state,
            record.start,
            record.interval,
            handler,
            Some(self.token),
        )?;
        inner.commit(&state)?;
        Ok(inner.stamp(first))
    }

    /// Stop the repeater. No-op if it is not active.
    #[instrument(level = "debug", skip(self), fields(repeater = self.id()))]
    pub fn disable(&self) -> TimerResult<()> {
        let inner = &self.service.inner;
        let mut state = inner.lock_state();
        load(&inner.store, self.id())?;
        let cancelled = inner.cancel_locked(&mut state, &self.token)?;
        if cancelled == 0 {
            return Ok(());
        }
        inner.commit(&state)?;
        debug!(cancelled, "repeater disabled");
        Ok(())
    }

    /// Whether a tick is scheduled or the handler is still running.
    pub fn is_active(&self) -> TimerResult<bool> {
        let inner = &self.service.inner;
        let state = inner.lock_state();
        Ok(state.cancels.lookup(&self.token)?.is_some())
    }
}

impl fmt::Debug for Repeater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repeater")
            .field("id", &self.id())
            .field("start", &self.start)
            .field("interval", &self.interval)
            .finish()
    }
}

impl TimerService {
    /// Repeater starting at `now + delay`. Nothing is scheduled until
    /// [`Repeater::schedule`].
    #[instrument(level = "debug", skip(self))]
    pub fn make_repeater(&self, delay: RelativeTime, interval: RelativeTime) -> TimerResult<Repeater> {
        let inner = &self.inner;
        let delay = inner.accept_rel(delay)?;
        let interval = inner.accept_rel(interval)?;
        if interval == 0 {
            return Err(TimerError::InvalidArgument(
                "interval must be nonzero".to_string(),
            ));
        }
        let now = inner.now();
        let start = now.checked_add(delay).ok_or_else(|| {
            TimerError::Arithmetic(format!("repeater start overflows: now={now} delay={delay}"))
        })?;

        let _state = inner.lock_state();
        let token = CancelToken::new(inner.meta.allocate(meta::NEXT_TOKEN_ID)?, inner.brand);
        let record = RepeaterRecord { start, interval };
        save(&inner.store, token.id(), &record)?;
        inner.persist()?;
        debug!(repeater = token.id(), start, interval, "repeater created");

        Ok(Repeater {
            service: self.clone(),
            token,
            start,
            interval,
        })
    }

    /// Re-open a repeater created before a restart.
    pub fn open_repeater(&self, id: u64) -> TimerResult<Repeater> {
        let inner = &self.inner;
        let _state = inner.lock_state();
        let record = load(&inner.store, id)?;
        Ok(Repeater {
            service: self.clone(),
            token: CancelToken::new(id, inner.brand),
            start: record.start,
            interval: record.interval,
        })
    }
}
