//! Durable counters and the service brand

use crate::error::TimerResult;
use crate::storage::StoreVariant;
use crate::time::TimerBrand;
use tracing::info;

pub const META_TABLE: &str = "meta";

pub(crate) const NEXT_EVENT_ID: &[u8] = b"next_event_id";
pub(crate) const NEXT_PROMISE_ID: &[u8] = b"next_promise_id";
pub(crate) const NEXT_WAKER_ID: &[u8] = b"next_waker_id";
/// Cancel tokens and repeaters (a repeater's ID is its private token's ID)
pub(crate) const NEXT_TOKEN_ID: &[u8] = b"next_token_id";
const BRAND: &[u8] = b"brand";

/// 메타 테이블: ID 카운터는 재시작 후에도 재사용되지 않습니다.
#[derive(Clone)]
pub struct MetaTable {
    store: StoreVariant,
}

impl MetaTable {
    pub fn new(store: StoreVariant) -> Self {
        Self { store }
    }

    /// Stored brand, or a freshly generated one that is stored now.
    pub fn load_or_create_brand(&self) -> TimerResult<TimerBrand> {
        if let Some(id) = self.store.get_u64(META_TABLE, BRAND)? {
            return Ok(TimerBrand::from_id(id));
        }
        let brand = TimerBrand::generate();
        self.store.put_u64(META_TABLE, BRAND, brand.id())?;
        info!(%brand, "generated timer brand");
        Ok(brand)
    }

    /// Return the counter's current value and persist value + 1.
    pub fn allocate(&self, counter: &[u8]) -> TimerResult<u64> {
        let id = self.peek(counter)?;
        self.store.put_u64(META_TABLE, counter, id + 1)?;
        Ok(id)
    }

    /// Next value `allocate` would return.
    pub fn peek(&self, counter: &[u8]) -> TimerResult<u64> {
        Ok(self.store.get_u64(META_TABLE, counter)?.unwrap_or(0))
    }
}
