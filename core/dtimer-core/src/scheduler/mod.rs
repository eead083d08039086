//! Scheduler — schedule, cancel index, event state machine
//!
//! 서비스 락 아래에서만 변경되는 테이블 묶음입니다.

pub mod bindings;
pub mod cancel_index;
pub mod event;
pub mod promises;
pub mod schedule;
pub mod wakeup;

pub use bindings::WakerBindings;
pub use cancel_index::CancelIndex;
pub use event::{
    EventId, EventKind, EventPhase, EventRecord, EventTable, FireEffect, ReplyRoute,
    next_fire_time,
};
pub use promises::{WakeupPromise, WakeupPromiseTable};
pub use schedule::Schedule;
pub use wakeup::WakeupCoordinator;

use crate::storage::StoreVariant;
use crate::time::{TimerBrand, Timestamp};

/// Everything an event transition may touch.
pub struct SchedulerState {
    pub schedule: Schedule,
    pub cancels: CancelIndex,
    pub events: EventTable,
    pub promises: WakeupPromiseTable,
    /// waker ID → live handler, held while events name it
    pub wakers: WakerBindings,
    pub brand: TimerBrand,
}

impl SchedulerState {
    pub fn new(store: StoreVariant, brand: TimerBrand) -> Self {
        Self {
            schedule: Schedule::new(store.clone()),
            cancels: CancelIndex::new(store.clone()),
            events: EventTable::new(store),
            promises: WakeupPromiseTable::new(),
            wakers: WakerBindings::new(),
            brand,
        }
    }

    /// Brand a raw device time with this service's brand.
    pub fn stamp(&self, value: u64) -> Timestamp {
        Timestamp::branded(value, self.brand)
    }
}
