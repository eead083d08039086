//! 반복 타이머와 재시작 예제
//!
//! 실행: cargo run --example repeater

use dtimer_core::{ManualTimerDevice, RelativeTime, TimerConfig, TimerService, waker_fn};
use std::sync::Arc;

fn main() -> dtimer_core::TimerResult<()> {
    let dir = std::env::temp_dir().join(format!("dtimer-demo-{}", std::process::id()));
    let config = TimerConfig::at_path(&dir);

    // 첫 번째 "프로세스": 반복 타이머를 만들고 한 번 실행
    let (repeater_id, handler_id) = {
        let device = Arc::new(ManualTimerDevice::new(0));
        let timer = TimerService::open(&config, device.clone())?;
        let handler = timer.export_waker(waker_fn(|t| {
            println!("tick {t}");
            Ok(())
        }))?;

        let repeater = timer.make_repeater(RelativeTime::raw(5), RelativeTime::raw(10))?;
        println!("first tick at {}", repeater.schedule(&handler)?);

        device.set_time(5);
        device.poll();
        println!("armed for {:?} before shutdown", device.armed());
        (repeater.id(), handler.id())
    };

    // 두 번째 "프로세스": 같은 저장소를 다시 열고 핸들러를 재바인딩
    let device = Arc::new(ManualTimerDevice::new(40));
    let timer = TimerService::open(&config, device.clone())?;
    println!("re-armed for {:?} after restart", device.armed());

    timer.rebind_waker(
        handler_id,
        waker_fn(|t| {
            println!("tick {t} (after restart)");
            Ok(())
        }),
    )?;
    device.poll();
    println!("next tick at {:?}", device.armed());

    timer.open_repeater(repeater_id)?.disable()?;
    println!("disabled; armed = {:?}", device.armed());

    drop(timer);
    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}
