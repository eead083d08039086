// 재시작 테스트: sled 저장소를 다시 열었을 때의 동작

use dtimer_core::{
    ManualTimerDevice, RelativeTime, TimerConfig, TimerError, TimerResult, TimerService,
    TimerWaker, Timestamp, WakeReply, waker_fn,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn open_at(path: &Path, now: u64) -> TimerResult<(TimerService, Arc<ManualTimerDevice>)> {
    let device = Arc::new(ManualTimerDevice::new(now));
    let timer = TimerService::open(&TimerConfig::at_path(path), device.clone())?;
    Ok((timer, device))
}

fn recorder() -> (Arc<Mutex<Vec<u64>>>, Arc<dyn dtimer_core::TimerWaker>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let waker = waker_fn(move |t| {
        sink.lock().push(t.abs_value());
        Ok(())
    });
    (seen, waker)
}

#[test]
fn test_restart_rearms_and_rebinds() -> TimerResult<()> {
    let dir = tempdir()?;

    let (handler_id, brand, mut promise) = {
        let (timer, device) = open_at(dir.path(), 0)?;
        let (_, waker) = recorder();
        let handler = timer.export_waker(waker)?;
        timer.set_wakeup(Timestamp::raw(30), &handler, None)?;
        let promise = timer.wake_at(Timestamp::raw(40), None)?;
        assert_eq!(device.armed(), Some(30));
        (handler.id(), timer.get_timer_brand(), promise)
    };

    // 이전 프로세스의 promise는 끊어짐
    assert!(matches!(promise.try_result(), Some(Err(TimerError::Disconnected))));

    let (timer, device) = open_at(dir.path(), 0)?;
    assert_eq!(timer.get_timer_brand(), brand);
    assert_eq!(device.armed(), Some(30));
    assert_eq!(timer.pending_events()?, 2);

    let (seen, waker) = recorder();
    let rebound = timer.rebind_waker(handler_id, waker)?;
    assert_eq!(rebound.id(), handler_id);

    // 고아 promise 이벤트는 조용히 사라짐
    device.set_time(45);
    assert!(device.poll());
    assert_eq!(*seen.lock(), vec![30]);
    assert_eq!(timer.pending_events()?, 0);
    assert_eq!(device.armed(), None);

    // ID 카운터는 이어짐
    let (_, fresh) = recorder();
    assert!(timer.export_waker(fresh)?.id() > handler_id);
    Ok(())
}

#[test]
fn test_unbound_handlers_after_restart() -> TimerResult<()> {
    let dir = tempdir()?;
    {
        let (timer, _device) = open_at(dir.path(), 0)?;
        let (_, waker) = recorder();
        let handler = timer.export_waker(waker)?;
        timer.set_wakeup(Timestamp::raw(10), &handler, None)?;
        timer.repeat(Timestamp::raw(10), RelativeTime::raw(10), &handler, None)?;
    }

    let (timer, device) = open_at(dir.path(), 0)?;
    assert_eq!(timer.pending_events()?, 2);

    // 다시 바인딩하지 않은 핸들러: one-shot은 버려지고 반복은 취소됨
    device.set_time(10);
    device.poll();
    assert_eq!(timer.pending_events()?, 0);
    assert_eq!(device.armed(), None);
    Ok(())
}

#[test]
fn test_repeater_survives_restart() -> TimerResult<()> {
    let dir = tempdir()?;
    let (repeater_id, handler_id) = {
        let (timer, _device) = open_at(dir.path(), 0)?;
        let (_, waker) = recorder();
        let handler = timer.export_waker(waker)?;
        let repeater = timer.make_repeater(RelativeTime::raw(5), RelativeTime::raw(10))?;
        repeater.schedule(&handler)?;
        (repeater.id(), handler.id())
    };

    let (timer, device) = open_at(dir.path(), 0)?;
    let repeater = timer.open_repeater(repeater_id)?;
    assert!(repeater.is_active()?);
    assert_eq!(repeater.start().abs_value(), 5);
    assert_eq!(device.armed(), Some(5));

    let (seen, waker) = recorder();
    timer.rebind_waker(handler_id, waker)?;
    device.set_time(5);
    device.poll();
    assert_eq!(*seen.lock(), vec![5]);
    assert_eq!(device.armed(), Some(15));

    repeater.disable()?;
    assert_eq!(device.armed(), None);
    assert!(!timer.open_repeater(repeater_id)?.is_active()?);
    Ok(())
}

/// Keeps every reply without settling it.
#[derive(Default)]
struct HoldingWaker {
    replies: Mutex<Vec<WakeReply>>,
}

impl TimerWaker for HoldingWaker {
    fn wake(&self, _scheduled: Timestamp, reply: WakeReply) {
        self.replies.lock().push(reply);
    }
}

#[test]
fn test_executing_repeater_cancelled_on_restart() -> TimerResult<()> {
    let dir = tempdir()?;
    let holder = Arc::new(HoldingWaker::default());

    let (repeater_id, handler_id) = {
        let (timer, device) = open_at(dir.path(), 0)?;
        let handler = timer.export_waker(holder.clone())?;
        let repeater = timer.make_repeater(RelativeTime::raw(5), RelativeTime::raw(10))?;
        repeater.schedule(&handler)?;
        device.set_time(5);
        assert!(device.poll());
        // 응답을 기다리는 중에 프로세스 종료
        assert_eq!(holder.replies.lock().len(), 1);
        assert_eq!(device.armed(), None);
        (repeater.id(), handler.id())
    };

    let (timer, device) = open_at(dir.path(), 1_000)?;
    assert_eq!(timer.pending_events()?, 0);
    assert_eq!(device.armed(), None);

    let repeater = timer.open_repeater(repeater_id)?;
    assert!(!repeater.is_active()?);
    let (seen, waker) = recorder();
    let handler = timer.rebind_waker(handler_id, waker)?;
    assert_eq!(repeater.schedule(&handler)?.abs_value(), 1_005);
    assert_eq!(device.armed(), Some(1_005));

    // 이전 프로세스의 응답은 아무 영향 없음
    holder.replies.lock().remove(0).fulfill();
    assert_eq!(timer.pending_events()?, 1);
    assert_eq!(device.armed(), Some(1_005));

    device.set_time(1_005);
    assert!(device.poll());
    assert_eq!(*seen.lock(), vec![1_005]);
    assert_eq!(device.armed(), Some(1_015));
    Ok(())
}

#[test]
fn test_rebind_unknown_id_fails() -> TimerResult<()> {
    let dir = tempdir()?;
    let (timer, _device) = open_at(dir.path(), 0)?;
    let (_, waker) = recorder();
    assert!(matches!(
        timer.rebind_waker(1_000, waker),
        Err(TimerError::InvalidArgument(_))
    ));
    Ok(())
}

#[test]
fn test_cancel_token_survives_restart() -> TimerResult<()> {
    let dir = tempdir()?;
    let token = {
        let (timer, _device) = open_at(dir.path(), 0)?;
        let token = timer.make_cancel_token()?;
        let _pending = timer.wake_at(Timestamp::raw(50), Some(&token))?;
        token
    };

    let (timer, device) = open_at(dir.path(), 0)?;
    assert_eq!(device.armed(), Some(50));
    timer.cancel(&token)?;
    assert_eq!(device.armed(), None);
    assert_eq!(timer.pending_events()?, 0);
    Ok(())
}

#[test]
fn test_open_from_config_file_with_lazy_durability() -> TimerResult<()> {
    let dir = tempdir()?;
    let config_path = dir.path().join("timer.json");
    TimerConfig::at_path(dir.path().join("store"))
        .with_durability(dtimer_core::DurabilityLevel::Lazy)
        .save_to_file(&config_path)?;

    let config = TimerConfig::load_from_file(&config_path)?;
    {
        let device = Arc::new(ManualTimerDevice::new(0));
        let timer = TimerService::open(&config, device)?;
        let _pending = timer.delay(RelativeTime::raw(10), None)?;
        timer.flush()?;
    }

    let device = Arc::new(ManualTimerDevice::new(0));
    let timer = TimerService::open(&config, device.clone())?;
    assert_eq!(device.armed(), Some(10));
    assert_eq!(timer.pending_events()?, 1);
    Ok(())
}
