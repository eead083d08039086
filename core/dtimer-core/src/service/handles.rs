//! Minting and rebinding of handler references and cancel tokens

use super::{TimerService, meta};
use crate::error::{TimerError, TimerResult};
use crate::refs::{CancelToken, TimerWaker, WakerRef};
use std::sync::Arc;
use tracing::{debug, info};

impl TimerService {
    /// Give `waker` a durable identity on this service.
    ///
    /// Events store only the returned ref's ID; the service holds the waker
    /// only while such events are alive. After a restart the ID must be
    /// re-attached with [`rebind_waker`](Self::rebind_waker).
    pub fn export_waker(&self, waker: Arc<dyn TimerWaker>) -> TimerResult<WakerRef> {
        let inner = &self.inner;
        let _state = inner.lock_state();
        let id = inner.meta.allocate(meta::NEXT_WAKER_ID)?;
        inner.persist()?;
        debug!(waker = id, "waker exported");
        Ok(WakerRef::new(id, inner.brand, waker))
    }

    /// Attach a live waker to an ID issued before a restart.
    ///
    /// Only waker IDs are accepted; cancel token and repeater IDs come from
    /// a separate counter.
    pub fn rebind_waker(&self, id: u64, waker: Arc<dyn TimerWaker>) -> TimerResult<WakerRef> {
        let inner = &self.inner;
        let mut state = inner.lock_state();
        if id >= inner.meta.peek(meta::NEXT_WAKER_ID)? {
            return Err(TimerError::InvalidArgument(format!(
                "waker id {id} was never issued by this service"
            )));
        }
        if state.wakers.rebind(id, &waker) {
            info!(waker = id, pending = state.wakers.live_events(id), "waker rebound");
        } else {
            debug!(waker = id, "waker rebound with no pending events");
        }
        Ok(WakerRef::new(id, inner.brand, waker))
    }

    /// Fresh token for grouping events under one `cancel`.
    pub fn make_cancel_token(&self) -> TimerResult<CancelToken> {
        let inner = &self.inner;
        let _state = inner.lock_state();
        let id = inner.meta.allocate(meta::NEXT_TOKEN_ID)?;
        inner.persist()?;
        Ok(CancelToken::new(id, inner.brand))
    }
}
