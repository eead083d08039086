//! CancelIndex — cancel token → guarded events

use super::event::EventId;
use crate::error::{TimerError, TimerResult};
use crate::refs::CancelToken;
use crate::storage::{StoreVariant, u64_key};

pub const CANCELS_TABLE: &str = "cancels";

/// 취소 토큰 역색인
///
/// 하나의 토큰이 여러 이벤트를 보호할 수 있고, 이벤트는 최대 하나의 토큰을 가집니다.
/// 보호 중인 이벤트가 하나도 남지 않으면 항목 자체가 삭제됩니다.
#[derive(Clone)]
pub struct CancelIndex {
    store: StoreVariant,
}

impl CancelIndex {
    pub fn new(store: StoreVariant) -> Self {
        Self { store }
    }

    fn key(token: &CancelToken) -> Vec<u8> {
        u64_key(token.id())
    }

    /// 토큰이 보호하는 이벤트 목록
    pub fn lookup(&self, token: &CancelToken) -> TimerResult<Option<Vec<EventId>>> {
        self.store
            .get(CANCELS_TABLE, &Self::key(token))?
            .map(|bytes| bincode::deserialize(&bytes).map_err(Into::into))
            .transpose()
    }

    /// 등록
    pub fn register(&self, token: &CancelToken, event: EventId) -> TimerResult<()> {
        let mut events = self.lookup(token)?.unwrap_or_default();
        events.push(event);
        let bytes = bincode::serialize(&events)?;
        self.store.insert(CANCELS_TABLE, &Self::key(token), &bytes)
    }

    /// 등록 해제: 토큰/이벤트가 없으면 무시. 토큰 없이 호출하면 사용 오류.
    pub fn unregister(&self, token: Option<&CancelToken>, event: EventId) -> TimerResult<()> {
        let token = token.ok_or(TimerError::MissingCancelToken)?;
        let Some(events) = self.lookup(token)? else {
            return Ok(());
        };
        let remaining: Vec<EventId> = events.iter().copied().filter(|e| *e != event).collect();
        if remaining.is_empty() {
            self.store.delete(CANCELS_TABLE, &Self::key(token))?;
        } else if remaining.len() < events.len() {
            let bytes = bincode::serialize(&remaining)?;
            self.store.insert(CANCELS_TABLE, &Self::key(token), &bytes)?;
        }
        Ok(())
    }
}
