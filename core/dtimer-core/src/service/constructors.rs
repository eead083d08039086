//! TimerService constructors

use super::{Inner, MetaTable, TimerService};
use crate::config::{DurabilityLevel, TimerConfig};
use crate::device::{TimerDevice, WakeupCallback, WakeupTarget};
use crate::error::TimerResult;
use crate::scheduler::SchedulerState;
use crate::storage::StoreVariant;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{info, instrument};

impl TimerService {
    /// 설정에 따라 저장소를 열고 서비스를 생성합니다.
    ///
    /// 기존 저장소라면 브랜드와 ID 카운터를 이어받고, 남아있는 이벤트에 맞춰
    /// 디바이스 알람을 다시 설정합니다.
    #[instrument(skip(device))]
    pub fn open(config: &TimerConfig, device: Arc<dyn TimerDevice>) -> TimerResult<Self> {
        info!("Opening timer service with {:?}", config.store);
        let store = StoreVariant::open(&config.store)?;
        Self::open_with_store(store, config.durability, device)
    }

    /// In-memory service; nothing survives the process.
    #[instrument(skip(device))]
    pub fn open_in_memory(device: Arc<dyn TimerDevice>) -> TimerResult<Self> {
        Self::open_with_store(StoreVariant::in_memory(), DurabilityLevel::Lazy, device)
    }

    /// Build a service over an already opened store.
    pub fn open_with_store(
        store: StoreVariant,
        durability: DurabilityLevel,
        device: Arc<dyn TimerDevice>,
    ) -> TimerResult<Self> {
        let meta = MetaTable::new(store.clone());
        let brand = meta.load_or_create_brand()?;
        let tables = SchedulerState::new(store.clone(), brand);

        let inner = Arc::new_cyclic(|this: &Weak<Inner>| {
            let target: Weak<dyn WakeupTarget> = this.clone();
            Inner {
                this: this.clone(),
                brand,
                device,
                callback: WakeupCallback::new(target),
                store,
                meta,
                durability,
                state: Mutex::new(tables),
            }
        });

        {
            let mut state = inner.lock_state();
            let interrupted = inner.restore_locked(&mut state)?;
            let pending = state.events.count()?;
            let armed = inner.commit(&state)?;
            info!(%brand, pending, interrupted, armed = ?armed, "timer service opened");
        }
        Ok(Self { inner })
    }
}
