//! # dtimer — Durable Timer Service
//!
//! dtimer는 하나의 폴링 클럭 디바이스 알람 위에 여러 논리 타이머를 다중화하는
//! 내구성 타이머 서비스입니다. 대기 중인 이벤트는 정렬된 키-값 저장소(sled)에 기록되어
//! 프로세스 재시작 후에도 유지됩니다.
//!
//! ## 주요 특징
//!
//! - **One-shot 웨이크업**: `set_wakeup(when, handler)`
//! - **Promise 지연**: `wake_at(when)`, `delay(rel)` — `Future`로 await 가능
//! - **반복 타이머**: `repeat(start, interval, handler)`, 제어 객체 `make_repeater`
//! - **취소 토큰**: 하나의 토큰으로 여러 이벤트를 취소
//! - **브랜드**: 다른 서비스의 시간 값과 섞이는 것을 막음
//!
//! ## 빠른 시작
//!
//! ```rust
//! use dtimer_core::{ManualTimerDevice, RelativeTime, TimerService, Timestamp, waker_fn};
//! use std::sync::Arc;
//!
//! # fn main() -> dtimer_core::TimerResult<()> {
//! let device = Arc::new(ManualTimerDevice::new(0));
//! let timer = TimerService::open_in_memory(device.clone())?;
//!
//! // 10, 20, 30, ... 마다 깨우기
//! let tick = timer.export_waker(waker_fn(|_| Ok(())))?;
//! let token = timer.make_cancel_token()?;
//! timer.repeat(Timestamp::raw(10), RelativeTime::raw(10), &tick, Some(&token))?;
//!
//! // promise 지연
//! let mut done = timer.delay(RelativeTime::raw(15), None)?;
//! device.set_time(15);
//! device.poll();
//! assert_eq!(done.try_result().unwrap()?.abs_value(), 15);
//!
//! timer.cancel(&token)?;
//! assert_eq!(device.armed(), None);
//! # Ok(())
//! # }
//! ```
//!
//! ## 아키텍처
//!
//! ```text
//! client call → Event (OneShot | PromiseWakeup | Repeater)
//!            → Schedule / CancelIndex → WakeupCoordinator → device alarm
//! device wakeup → drain_up_to(now) → fired() → handler.wake(scheduled)
//! ```
//!
//! ## 모듈 구조
//!
//! - [`service`] — 공개 API ([`TimerService`], [`Repeater`], [`Clock`])
//! - [`scheduler`] — 스케줄, 취소 색인, 이벤트 상태 기계
//! - [`storage`] — sled / 인메모리 백엔드
//! - [`device`] — 클럭 디바이스 인터페이스
//! - [`time`] — 시간 값과 브랜드 검사 연산

pub mod config;
pub mod device;
pub mod error;
pub mod refs;
pub mod scheduler;
pub mod service;
pub mod storage;
pub mod time;

// Logging utilities
pub mod logging;

// Re-export commonly used types
pub use config::{DurabilityLevel, StoreConfig, TimerConfig};
pub use device::{ManualTimerDevice, TimerDevice, WakeupCallback};
pub use error::{TimerError, TimerResult};
pub use refs::{CancelToken, FnWaker, TimerWaker, WakeOutcome, WakeReply, WakerRef, waker_fn};
pub use scheduler::WakeupPromise;
pub use service::{Clock, Repeater, TimerService};
pub use time::{RelativeTime, TimerBrand, Timestamp};
