//! Timer brand — opaque identity of one logical clock.

use crate::service::TimerService;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque tag distinguishing values that belong to different clocks.
///
/// A brand is generated once per timer service and persisted with its
/// store, so a service reopened over the same store keeps its brand.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerBrand(u64);

impl TimerBrand {
    /// Generate a fresh random brand.
    pub fn generate() -> Self {
        Self(rand::random())
    }

    pub(crate) fn from_id(id: u64) -> Self {
        Self(id)
    }

    pub(crate) fn id(&self) -> u64 {
        self.0
    }

    /// Whether `candidate` is the timer service this brand was issued by.
    pub fn is_my_timer_service(&self, candidate: &TimerService) -> bool {
        candidate.get_timer_brand() == *self
    }
}

impl fmt::Debug for TimerBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimerBrand({:016x})", self.0)
    }
}

impl fmt::Display for TimerBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "brand#{:016x}", self.0)
    }
}
