// 스케줄 성능 벤치마크
//
// Section 1: Schedule insert / drain_up_to (인메모리 vs sled)
// Section 2: TimerService set_wakeup + device poll

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use dtimer_core::scheduler::{EventId, Schedule};
use dtimer_core::storage::StoreVariant;
use dtimer_core::{ManualTimerDevice, StoreConfig, TimerService, Timestamp, waker_fn};
use std::sync::Arc;

// ═══════════════════════════════════════════════════════════════════════════
// Section 1: Schedule
// ═══════════════════════════════════════════════════════════════════════════

fn filled(store: StoreVariant, n: u64) -> Schedule {
    let schedule = Schedule::new(store);
    for i in 0..n {
        // 시간이 겹치도록 (i * 7) % n
        schedule.insert((i * 7) % n, EventId(i)).unwrap();
    }
    schedule
}

fn bench_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule");

    group.bench_function("insert_in_memory", |b| {
        let schedule = Schedule::new(StoreVariant::in_memory());
        let mut counter = 0u64;
        b.iter(|| {
            schedule
                .insert(black_box(counter % 1_000), EventId(counter))
                .unwrap();
            counter += 1;
        })
    });

    group.bench_function("first_key_10k", |b| {
        let schedule = filled(StoreVariant::in_memory(), 10_000);
        b.iter(|| black_box(schedule.first_key().unwrap()))
    });

    group.bench_function("drain_100_of_10k_in_memory", |b| {
        b.iter_batched(
            || filled(StoreVariant::in_memory(), 10_000),
            |schedule| black_box(schedule.drain_up_to(99).unwrap()),
            BatchSize::LargeInput,
        )
    });

    let dir = tempfile::tempdir().unwrap();
    let sled_store = StoreVariant::open(&StoreConfig::Path(dir.path().to_path_buf())).unwrap();
    group.bench_function("insert_sled", |b| {
        let schedule = Schedule::new(sled_store.clone());
        let mut counter = 0u64;
        b.iter(|| {
            schedule
                .insert(black_box(counter % 1_000), EventId(counter))
                .unwrap();
            counter += 1;
        })
    });

    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// Section 2: TimerService
// ═══════════════════════════════════════════════════════════════════════════

fn bench_service(c: &mut Criterion) {
    let mut group = c.benchmark_group("service");

    group.bench_function("set_wakeup_then_fire_100", |b| {
        b.iter_batched(
            || {
                let device = Arc::new(ManualTimerDevice::new(0));
                let timer = TimerService::open_in_memory(device.clone()).unwrap();
                let handler = timer.export_waker(waker_fn(|_| Ok(()))).unwrap();
                (timer, device, handler)
            },
            |(timer, device, handler)| {
                for when in 1..=100 {
                    timer
                        .set_wakeup(Timestamp::raw(when), &handler, None)
                        .unwrap();
                }
                device.set_time(100);
                black_box(device.poll());
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_schedule, bench_service);
criterion_main!(benches);
