//! Seeded random events over every class, for property runs.

#![allow(dead_code)]

use std::time::Duration;

use resmeter_core::{
    AllocEvent, BufferPoolEvent, CacheEvent, CacheOp, DumpEvent, Event, FetchEvent, LaborEvent,
    QueueEvent, WorkerEvent, WorkerStatus,
};

pub const BUCKETS: &[&str] = &["b0", "b1", "b2"];
pub const REASONS: &[&str] = &["size", "interval", "force"];

fn pick<T: Copy>(rng: &mut fastrand::Rng, items: &[T]) -> T {
    items[rng.usize(..items.len())]
}

pub fn random_event(rng: &mut fastrand::Rng) -> Event<'static> {
    let size = rng.u64(1..8192);
    let duration = Duration::from_nanos(rng.u64(..5_000_000));
    let idx = rng.u32(..4);

    match rng.u8(..8) {
        0 => Event::Worker(match rng.u8(..6) {
            0 => WorkerEvent::Setup {
                active: rng.u32(..4),
                sleep: rng.u32(..4),
                idle: rng.u32(..4),
            },
            1 => WorkerEvent::Init { idx },
            2 => WorkerEvent::Sleep { idx },
            3 => WorkerEvent::Wakeup { idx },
            4 => WorkerEvent::Wait {
                idx,
                delay: duration,
            },
            _ => WorkerEvent::Stop {
                idx,
                forced: rng.bool(),
                prior: pick(
                    rng,
                    &[WorkerStatus::Idle, WorkerStatus::Active, WorkerStatus::Sleep],
                ),
            },
        }),
        1 => Event::Queue(pick(
            rng,
            &[
                QueueEvent::Put,
                QueueEvent::Pull,
                QueueEvent::Retry,
                QueueEvent::Leak,
                QueueEvent::Lost,
            ],
        )),
        2 => Event::Dump(match rng.u8(..4) {
            0 => DumpEvent::Dump { size },
            1 => DumpEvent::Flush {
                reason: pick(rng, REASONS).into(),
                size,
            },
            2 => DumpEvent::Restore { size },
            _ => DumpEvent::Fail {
                reason: pick(rng, REASONS).into(),
            },
        }),
        3 => Event::Alloc(match rng.u8(..3) {
            0 => AllocEvent::Alloc { cap: size },
            1 => AllocEvent::Grow {
                old_cap: size,
                new_cap: rng.u64(1..8192),
            },
            _ => AllocEvent::Free { cap: size },
        }),
        4 => Event::BufferPool(if rng.bool() {
            BufferPoolEvent::Acquire { cap: size }
        } else {
            BufferPoolEvent::Release { cap: size }
        }),
        5 => {
            let op = match rng.u8(..14) {
                0 => CacheOp::ArenaAlloc { size },
                1 => CacheOp::ArenaFill { size },
                2 => CacheOp::ArenaReset { size },
                3 => CacheOp::ArenaRelease { size },
                4 => CacheOp::Set { duration },
                5 => CacheOp::Evict { alive: rng.bool() },
                6 => CacheOp::Miss,
                7 => CacheOp::Hit { duration },
                8 => CacheOp::Expire,
                9 => CacheOp::Corrupt,
                10 => CacheOp::Collision,
                11 => CacheOp::NoSpace,
                12 => CacheOp::Dump,
                _ => CacheOp::Load,
            };
            Event::Cache(CacheEvent::new(pick(rng, BUCKETS), op))
        }
        6 => Event::Fetch(match rng.u8(..8) {
            0 => FetchEvent::Fetch,
            1 => FetchEvent::Ok { duration },
            2 => FetchEvent::NotFound,
            3 => FetchEvent::Timeout,
            4 => FetchEvent::Fail,
            5 => FetchEvent::Batch,
            6 => FetchEvent::BatchOk { duration },
            _ => FetchEvent::BatchFail,
        }),
        _ => Event::Labor(match rng.u8(..3) {
            0 => LaborEvent::Hire {
                unknown: rng.bool(),
            },
            1 => LaborEvent::Fire,
            _ => LaborEvent::Retire,
        }),
    }
}

pub fn random_sequence(seed: u64, len: usize) -> Vec<Event<'static>> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..len).map(|_| random_event(&mut rng)).collect()
}
