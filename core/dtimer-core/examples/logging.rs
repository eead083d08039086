//! 로깅 시스템 사용 예제
//!
//! 실행: RUST_LOG=debug cargo run --example logging --features logging

use dtimer_core::{ManualTimerDevice, RelativeTime, TimerService, Timestamp, waker_fn};
use std::sync::Arc;

fn main() -> dtimer_core::TimerResult<()> {
    // 로깅 초기화
    #[cfg(feature = "logging")]
    dtimer_core::logging::init();

    println!("=== dtimer 로깅 예제 ===\n");
    println!("환경 변수 RUST_LOG로 로그 레벨 조정 가능:");
    println!("  RUST_LOG=trace  - 알람 재설정까지 모두");
    println!("  RUST_LOG=debug  - 이벤트 상태 전이");
    println!("  RUST_LOG=info   - 서비스 열기/재바인딩 (기본값)\n");

    let device = Arc::new(ManualTimerDevice::new(0));
    let timer = TimerService::open_in_memory(device.clone())?;

    let handler = timer.export_waker(waker_fn(|t| {
        println!("  wake({t})");
        Ok(())
    }))?;

    println!("웨이크업 예약 중...");
    let token = timer.make_cancel_token()?;
    timer.set_wakeup(Timestamp::raw(10), &handler, None)?;
    timer.set_wakeup(Timestamp::raw(20), &handler, Some(&token))?;
    let mut promise = timer.delay(RelativeTime::raw(15), None)?;

    println!("\n20 취소 중...");
    timer.cancel(&token)?;

    println!("\n시간 15로 이동...");
    device.set_time(15);
    device.poll();
    println!("  promise: {:?}", promise.try_result());

    println!("\n=== 예제 완료 ===");
    println!("\n주의: logging feature가 활성화되어야 로그가 출력됩니다.");
    println!("실행: RUST_LOG=debug cargo run --example logging --features logging");

    Ok(())
}
