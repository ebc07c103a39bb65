//! Accounting table: which series each event touches, and by how much.
//!
//! This is the single definition of the bookkeeping rules. Every accounting
//! backend (the aggregating sink, the ledger) applies [`Accounted::effects`]
//! verbatim, so backends cannot drift apart.
//!
//! Paired gauges:
//!
//! | gauge | in | out |
//! |---|---|---|
//! | `queue_workers_active` | init, wakeup | sleep, forced stop from active |
//! | `queue_workers_sleep` | sleep | wakeup, graceful stop, forced stop from sleep |
//! | `queue_workers_idle` | any stop except forced stop from idle | init |
//! | `queue_size` | put | pull, leak, lost |
//! | `dlqdump_pending_bytes` | dump | restore |
//! | `cbyte_mem` | alloc, grow up | free, grow down |
//! | `cbytebuf_pool`, `cbytebuf_pool_mem` | release | acquire |
//! | `cbytecache_arena_total` | arena alloc | arena release |
//! | `cbytecache_arena_used` | arena fill | arena reset, arena release (bounded) |
//! | `cbytecache_entries` | set | evict |
//! | `batch_query_inflight` | fetch | ok, not found, timeout, fail |
//! | `batch_query_batch_inflight` | batch | batch ok, batch fail |
//! | `laborpool_size` | fire | hire of a known worker |
//!
//! Arena events carry no arena id, so a release cannot say how much of the
//! released arena was still filled. It lowers `cbytecache_arena_used` to the
//! remaining `cbytecache_arena_total` of the bucket: only bytes that no longer
//! fit in what stays allocated are taken out, and a reset or never filled
//! arena releases nothing from `used`.
//!
//! Worker transitions move exactly one unit between two of the three worker
//! gauges, so `active + sleep + idle` stays equal to the last setup total.

use std::time::Duration;

use crate::catalog::Series;
use crate::event::{
    AllocEvent, BufferPoolEvent, CacheEvent, CacheOp, DumpEvent, Event, FetchEvent, LaborEvent,
    QueueEvent, WorkerEvent, WorkerStatus,
};

/// One registry operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Overwrite a gauge.
    Set(Series, i64),
    /// Adjust a gauge by a signed delta.
    Add(Series, i64),
    /// Increment a counter.
    Inc(Series, u64),
    /// Record a duration into a histogram.
    Observe(Series, Duration),
    /// Lower a gauge to at most the current value of another gauge under the
    /// same label values.
    Bound(Series, Series),
}

impl Effect {
    pub fn series(&self) -> Series {
        match *self {
            Effect::Set(s, _)
            | Effect::Add(s, _)
            | Effect::Inc(s, _)
            | Effect::Observe(s, _)
            | Effect::Bound(s, _) => s,
        }
    }
}

/// Upper bound of effects produced by a single event.
pub const MAX_EFFECTS: usize = 4;

/// Effects of one event, stored inline (no allocation on the hot path).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Effects {
    items: [Option<Effect>; MAX_EFFECTS],
    len: usize,
}

impl Effects {
    fn with(mut self, effect: Effect) -> Self {
        if let Some(slot) = self.items.get_mut(self.len) {
            *slot = Some(effect);
            self.len += 1;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Effect> + '_ {
        self.items.iter().flatten().copied()
    }
}

fn signed(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn one(effect: Effect) -> Effects {
    Effects::default().with(effect)
}

fn two(a: Effect, b: Effect) -> Effects {
    Effects::default().with(a).with(b)
}

fn three(a: Effect, b: Effect, c: Effect) -> Effects {
    Effects::default().with(a).with(b).with(c)
}

/// An event the accounting table knows how to book.
pub trait Accounted {
    fn effects(&self) -> Effects;

    /// Second label value, for series whose schema has one.
    fn sub_dimension(&self) -> Option<&str> {
        None
    }
}

impl Accounted for WorkerEvent {
    fn effects(&self) -> Effects {
        use Effect::{Add, Observe, Set};
        use Series::{WorkerWait, WorkersActive, WorkersIdle, WorkersSleep};

        match *self {
            WorkerEvent::Setup {
                active,
                sleep,
                idle,
            } => three(
                Set(WorkersActive, i64::from(active)),
                Set(WorkersSleep, i64::from(sleep)),
                Set(WorkersIdle, i64::from(idle)),
            ),
            WorkerEvent::Init { .. } => two(Add(WorkersActive, 1), Add(WorkersIdle, -1)),
            WorkerEvent::Sleep { .. } => two(Add(WorkersSleep, 1), Add(WorkersActive, -1)),
            WorkerEvent::Wakeup { .. } => two(Add(WorkersActive, 1), Add(WorkersSleep, -1)),
            WorkerEvent::Wait { delay, .. } => one(Observe(WorkerWait, delay)),
            WorkerEvent::Stop { forced: false, .. } => {
                two(Add(WorkersIdle, 1), Add(WorkersSleep, -1))
            }
            WorkerEvent::Stop {
                forced: true,
                prior,
                ..
            } => match prior {
                WorkerStatus::Active => two(Add(WorkersIdle, 1), Add(WorkersActive, -1)),
                WorkerStatus::Sleep => two(Add(WorkersIdle, 1), Add(WorkersSleep, -1)),
                // already stopped: nothing moves
                WorkerStatus::Idle => Effects::default(),
            },
        }
    }
}

impl Accounted for QueueEvent {
    fn effects(&self) -> Effects {
        use Effect::{Add, Inc};
        use Series::*;

        match self {
            QueueEvent::Put => two(Inc(QueueIn, 1), Add(QueueSize, 1)),
            QueueEvent::Pull => two(Inc(QueueOut, 1), Add(QueueSize, -1)),
            QueueEvent::Retry => one(Inc(QueueRetry, 1)),
            QueueEvent::Leak => two(Inc(QueueLeak, 1), Add(QueueSize, -1)),
            QueueEvent::Lost => two(Inc(QueueLost, 1), Add(QueueSize, -1)),
        }
    }
}

impl Accounted for DumpEvent<'_> {
    fn effects(&self) -> Effects {
        use Effect::{Add, Inc};
        use Series::*;

        match *self {
            DumpEvent::Dump { size } => three(
                Inc(DumpSizeIn, 1),
                Inc(DumpBytesIn, size),
                Add(DumpPendingBytes, signed(size)),
            ),
            DumpEvent::Flush { size, .. } => one(Inc(DumpBytesFlush, size)),
            DumpEvent::Restore { size } => three(
                Inc(DumpSizeOut, 1),
                Inc(DumpBytesOut, size),
                Add(DumpPendingBytes, -signed(size)),
            ),
            DumpEvent::Fail { .. } => one(Inc(DumpFail, 1)),
        }
    }

    fn sub_dimension(&self) -> Option<&str> {
        match self {
            DumpEvent::Flush { reason, .. } | DumpEvent::Fail { reason } => Some(&**reason),
            _ => None,
        }
    }
}

impl Accounted for AllocEvent {
    fn effects(&self) -> Effects {
        use Effect::{Add, Inc};
        use Series::*;

        match *self {
            AllocEvent::Alloc { cap } => two(Inc(AllocCount, 1), Add(AllocMem, signed(cap))),
            AllocEvent::Grow { old_cap, new_cap } => two(
                Inc(GrowCount, 1),
                Add(AllocMem, signed(new_cap).saturating_sub(signed(old_cap))),
            ),
            AllocEvent::Free { cap } => two(Inc(FreeCount, 1), Add(AllocMem, -signed(cap))),
        }
    }
}

impl Accounted for BufferPoolEvent {
    fn effects(&self) -> Effects {
        use Effect::{Add, Inc};
        use Series::*;

        match *self {
            BufferPoolEvent::Acquire { cap } => three(
                Inc(PoolAcquire, 1),
                Add(PoolSize, -1),
                Add(PoolMem, -signed(cap)),
            ),
            BufferPoolEvent::Release { cap } => three(
                Inc(PoolRelease, 1),
                Add(PoolSize, 1),
                Add(PoolMem, signed(cap)),
            ),
        }
    }
}

impl Accounted for CacheEvent<'_> {
    fn effects(&self) -> Effects {
        use Effect::{Add, Bound, Inc, Observe};
        use Series::*;

        match self.op {
            CacheOp::ArenaAlloc { size } => {
                two(Inc(ArenaAllocCount, 1), Add(ArenaTotal, signed(size)))
            }
            CacheOp::ArenaFill { size } => two(Inc(ArenaFillCount, 1), Add(ArenaUsed, signed(size))),
            CacheOp::ArenaReset { size } => {
                two(Inc(ArenaResetCount, 1), Add(ArenaUsed, -signed(size)))
            }
            CacheOp::ArenaRelease { size } => three(
                Inc(ArenaReleaseCount, 1),
                Add(ArenaTotal, -signed(size)),
                Bound(ArenaUsed, ArenaTotal),
            ),
            CacheOp::Set { duration } => three(
                Inc(CacheSet, 1),
                Add(CacheEntries, 1),
                Observe(CacheSetDuration, duration),
            ),
            CacheOp::Evict { alive: false } => two(Inc(CacheEvict, 1), Add(CacheEntries, -1)),
            CacheOp::Evict { alive: true } => three(
                Inc(CacheEvict, 1),
                Inc(CacheEvictAlive, 1),
                Add(CacheEntries, -1),
            ),
            CacheOp::Miss => one(Inc(CacheMiss, 1)),
            CacheOp::Hit { duration } => two(Inc(CacheHit, 1), Observe(CacheHitDuration, duration)),
            CacheOp::Expire => one(Inc(CacheExpire, 1)),
            CacheOp::Corrupt => one(Inc(CacheCorrupt, 1)),
            CacheOp::Collision => one(Inc(CacheCollision, 1)),
            CacheOp::NoSpace => one(Inc(CacheNoSpace, 1)),
            CacheOp::Dump => one(Inc(CacheDump, 1)),
            CacheOp::Load => one(Inc(CacheLoad, 1)),
        }
    }

    fn sub_dimension(&self) -> Option<&str> {
        Some(&*self.bucket)
    }
}

impl Accounted for FetchEvent {
    fn effects(&self) -> Effects {
        use Effect::{Add, Inc, Observe};
        use Series::*;

        match *self {
            FetchEvent::Fetch => two(Inc(FetchIn, 1), Add(FetchInflight, 1)),
            FetchEvent::Ok { duration } => three(
                Inc(FetchOk, 1),
                Add(FetchInflight, -1),
                Observe(FetchDuration, duration),
            ),
            FetchEvent::NotFound => two(Inc(FetchNotFound, 1), Add(FetchInflight, -1)),
            FetchEvent::Timeout => two(Inc(FetchTimeout, 1), Add(FetchInflight, -1)),
            FetchEvent::Fail => two(Inc(FetchFail, 1), Add(FetchInflight, -1)),
            FetchEvent::Batch => two(Inc(BatchIn, 1), Add(BatchInflight, 1)),
            FetchEvent::BatchOk { duration } => three(
                Inc(BatchOk, 1),
                Add(BatchInflight, -1),
                Observe(BatchDuration, duration),
            ),
            FetchEvent::BatchFail => two(Inc(BatchFail, 1), Add(BatchInflight, -1)),
        }
    }
}

impl Accounted for LaborEvent {
    fn effects(&self) -> Effects {
        use Effect::{Add, Inc};
        use Series::*;

        match *self {
            LaborEvent::Hire { unknown: true } => one(Inc(LaborHire, 1)),
            LaborEvent::Hire { unknown: false } => two(Inc(LaborHire, 1), Add(LaborSize, -1)),
            LaborEvent::Fire => two(Inc(LaborFire, 1), Add(LaborSize, 1)),
            LaborEvent::Retire => one(Inc(LaborRetire, 1)),
        }
    }
}

impl Accounted for Event<'_> {
    fn effects(&self) -> Effects {
        match self {
            Event::Worker(e) => e.effects(),
            Event::Queue(e) => e.effects(),
            Event::Dump(e) => e.effects(),
            Event::Alloc(e) => e.effects(),
            Event::BufferPool(e) => e.effects(),
            Event::Cache(e) => e.effects(),
            Event::Fetch(e) => e.effects(),
            Event::Labor(e) => e.effects(),
        }
    }

    fn sub_dimension(&self) -> Option<&str> {
        match self {
            Event::Dump(e) => e.sub_dimension(),
            Event::Cache(e) => e.sub_dimension(),
            _ => None,
        }
    }
}

/// True for events that move a worker from one state to another.
pub fn is_worker_transition(event: &WorkerEvent) -> bool {
    !matches!(event, WorkerEvent::Setup { .. } | WorkerEvent::Wait { .. })
}
