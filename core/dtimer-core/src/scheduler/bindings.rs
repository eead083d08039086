//! Live handler bindings, counted per durable waker ID
//!
//! 이벤트 레코드는 핸들러를 ID로만 저장합니다. 살아있는 `Arc<dyn TimerWaker>`는
//! 그 ID를 참조하는 이벤트가 하나라도 남아있는 동안만 여기에 보관됩니다.
//!
//! 해제된 waker는 바로 drop하지 않고 `retired`에 모읍니다. waker가 보관하던
//! 응답이 drop되면서 서비스 락을 다시 잡을 수 있으므로, 서비스는 락을 놓은 뒤에
//! [`WakerBindings::take_retired`]로 꺼내 drop합니다.

use crate::refs::TimerWaker;
use ahash::AHashMap;
use std::sync::Arc;

#[derive(Default)]
struct Binding {
    /// Live (scheduled or executing) events naming this waker
    events: usize,
    /// `None` after a restart until the waker is rebound
    waker: Option<Arc<dyn TimerWaker>>,
}

/// waker ID → (live event count, live handler)
#[derive(Default)]
pub struct WakerBindings {
    bindings: AHashMap<u64, Binding>,
    retired: Vec<Arc<dyn TimerWaker>>,
}

impl WakerBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new event now names `id`; keep `waker` alive for it.
    pub fn acquire(&mut self, id: u64, waker: &Arc<dyn TimerWaker>) {
        let binding = self.bindings.entry(id).or_default();
        binding.events += 1;
        if let Some(old) = binding.waker.replace(Arc::clone(waker)) {
            self.retired.push(old);
        }
    }

    /// Count an event loaded from the store. Its waker is unknown until rebound.
    pub fn restore(&mut self, id: u64) {
        self.bindings.entry(id).or_default().events += 1;
    }

    /// An event naming `id` was retired or cancelled. Unknown IDs are ignored.
    pub fn release(&mut self, id: u64) {
        if let Some(binding) = self.bindings.get_mut(&id) {
            binding.events = binding.events.saturating_sub(1);
            if binding.events == 0
                && let Some(waker) = self.bindings.remove(&id).and_then(|b| b.waker)
            {
                self.retired.push(waker);
            }
        }
    }

    /// Attach `waker` to restored events. Returns `false` if no live event names `id`.
    pub fn rebind(&mut self, id: u64, waker: &Arc<dyn TimerWaker>) -> bool {
        match self.bindings.get_mut(&id) {
            Some(binding) => {
                if let Some(old) = binding.waker.replace(Arc::clone(waker)) {
                    self.retired.push(old);
                }
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: u64) -> Option<&Arc<dyn TimerWaker>> {
        self.bindings.get(&id).and_then(|b| b.waker.as_ref())
    }

    /// Live events naming `id`.
    pub fn live_events(&self, id: u64) -> usize {
        self.bindings.get(&id).map_or(0, |b| b.events)
    }

    /// Wakers released since the last call. Drop them without the service lock held.
    pub fn take_retired(&mut self) -> Vec<Arc<dyn TimerWaker>> {
        std::mem::take(&mut self.retired)
    }

    /// 보관 중인 waker ID 수
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
