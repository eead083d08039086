//! Clock — read-only facet of a timer service

use super::TimerService;
use crate::time::{TimerBrand, Timestamp};

/// 읽기 전용 시계. 예약/취소는 할 수 없습니다.
#[derive(Clone)]
pub struct Clock {
    service: TimerService,
}

impl Clock {
    pub(crate) fn new(service: TimerService) -> Self {
        Self { service }
    }

    pub fn get_current_timestamp(&self) -> Timestamp {
        self.service.get_current_timestamp()
    }

    pub fn get_timer_brand(&self) -> TimerBrand {
        self.service.get_timer_brand()
    }
}
