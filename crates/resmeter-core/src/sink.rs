//! Sink interfaces, one trait per manager class.
//!
//! A manager holds exactly one sink (shared as `Arc<dyn ...>`), chosen at
//! construction. Methods return `()` and must never block, panic or fail the
//! caller; a backend that cannot record an observation drops it.
//!
//! Backends usually implement [`EventSink`] only: one `record` method that
//! receives every event as a value. Blanket impls turn any `EventSink` into
//! every class trait, building the event from the method arguments.
//!
//! [`NoopSink`] implements every trait and is the default for managers that
//! are not observed.

use std::sync::Arc;
use std::time::Duration;

use crate::event::{
    AllocEvent, BufferPoolEvent, CacheEvent, CacheOp, DumpEvent, Event, FetchEvent, LaborEvent,
    QueueEvent, WorkerEvent, WorkerStatus,
};

/// Behavior shared by every sink.
pub trait Sink: Send + Sync {
    /// Identity of the observed manager (first label of every series).
    fn identity(&self) -> &str;

    /// Retire the identity: drop every derived series it owns. Called when the
    /// manager is torn down, to bound label cardinality.
    fn forget(&self) {}
}

/// Worker pool of a queue.
pub trait WorkerMetrics: Sink {
    fn worker_setup(&self, active: u32, sleep: u32, idle: u32);
    fn worker_init(&self, idx: u32);
    fn worker_sleep(&self, idx: u32);
    fn worker_wakeup(&self, idx: u32);
    fn worker_wait(&self, idx: u32, delay: Duration);
    fn worker_stop(&self, idx: u32, forced: bool, prior: WorkerStatus);
}

/// Bounded queue.
pub trait QueueMetrics: Sink {
    fn queue_put(&self);
    fn queue_pull(&self);
    fn queue_retry(&self);
    fn queue_leak(&self);
    fn queue_lost(&self);
}

/// Dead-letter dump queue.
pub trait DumpMetrics: Sink {
    fn dump(&self, size: u64);
    fn flush(&self, reason: &str, size: u64);
    fn restore(&self, size: u64);
    fn fail(&self, reason: &str);
}

/// Raw byte allocator.
pub trait AllocMetrics: Sink {
    fn alloc(&self, cap: u64);
    fn grow(&self, old_cap: u64, new_cap: u64);
    fn free(&self, cap: u64);
}

/// Pool of reusable byte buffers.
pub trait BufferPoolMetrics: Sink {
    fn pool_acquire(&self, cap: u64);
    fn pool_release(&self, cap: u64);
}

/// Arena-based byte cache. Every call names the bucket.
pub trait CacheMetrics: Sink {
    fn arena_alloc(&self, bucket: &str, size: u64);
    fn arena_fill(&self, bucket: &str, size: u64);
    fn arena_reset(&self, bucket: &str, size: u64);
    fn arena_release(&self, bucket: &str, size: u64);
    fn set(&self, bucket: &str, duration: Duration);
    fn evict(&self, bucket: &str, alive: bool);
    fn miss(&self, bucket: &str);
    fn hit(&self, bucket: &str, duration: Duration);
    fn expire(&self, bucket: &str);
    fn corrupt(&self, bucket: &str);
    fn collision(&self, bucket: &str);
    fn no_space(&self, bucket: &str);
    fn cache_dump(&self, bucket: &str);
    fn cache_load(&self, bucket: &str);
}

/// Single/batch fetch helper.
pub trait FetchMetrics: Sink {
    fn fetch(&self);
    fn fetch_ok(&self, duration: Duration);
    fn fetch_not_found(&self);
    fn fetch_timeout(&self);
    fn fetch_fail(&self);
    fn batch(&self);
    fn batch_ok(&self, duration: Duration);
    fn batch_fail(&self);
}

/// Labor pool.
pub trait LaborMetrics: Sink {
    fn hire(&self, unknown: bool);
    fn fire(&self);
    fn retire(&self);
}

/// A backend that observes every class.
pub trait FullSink:
    WorkerMetrics
    + QueueMetrics
    + DumpMetrics
    + AllocMetrics
    + BufferPoolMetrics
    + CacheMetrics
    + FetchMetrics
    + LaborMetrics
{
}

impl<T> FullSink for T where
    T: WorkerMetrics
        + QueueMetrics
        + DumpMetrics
        + AllocMetrics
        + BufferPoolMetrics
        + CacheMetrics
        + FetchMetrics
        + LaborMetrics
        + ?Sized
{
}

/// Backend that consumes events as values.
pub trait EventSink: Sink {
    fn record(&self, event: &Event<'_>);
}

impl<T: EventSink + ?Sized> WorkerMetrics for T {
    fn worker_setup(&self, active: u32, sleep: u32, idle: u32) {
        self.record(&Event::Worker(WorkerEvent::Setup {
            active,
            sleep,
            idle,
        }));
    }

    fn worker_init(&self, idx: u32) {
        self.record(&Event::Worker(WorkerEvent::Init { idx }));
    }

    fn worker_sleep(&self, idx: u32) {
        self.record(&Event::Worker(WorkerEvent::Sleep { idx }));
    }

    fn worker_wakeup(&self, idx: u32) {
        self.record(&Event::Worker(WorkerEvent::Wakeup { idx }));
    }

    fn worker_wait(&self, idx: u32, delay: Duration) {
        self.record(&Event::Worker(WorkerEvent::Wait { idx, delay }));
    }

    fn worker_stop(&self, idx: u32, forced: bool, prior: WorkerStatus) {
        self.record(&Event::Worker(WorkerEvent::Stop { idx, forced, prior }));
    }
}

impl<T: EventSink + ?Sized> QueueMetrics for T {
    fn queue_put(&self) {
        self.record(&Event::Queue(QueueEvent::Put));
    }

    fn queue_pull(&self) {
        self.record(&Event::Queue(QueueEvent::Pull));
    }

    fn queue_retry(&self) {
        self.record(&Event::Queue(QueueEvent::Retry));
    }

    fn queue_leak(&self) {
        self.record(&Event::Queue(QueueEvent::Leak));
    }

    fn queue_lost(&self) {
        self.record(&Event::Queue(QueueEvent::Lost));
    }
}

impl<T: EventSink + ?Sized> DumpMetrics for T {
    fn dump(&self, size: u64) {
        self.record(&Event::Dump(DumpEvent::Dump { size }));
    }

    fn flush(&self, reason: &str, size: u64) {
        self.record(&Event::Dump(DumpEvent::Flush {
            reason: reason.into(),
            size,
        }));
    }

    fn restore(&self, size: u64) {
        self.record(&Event::Dump(DumpEvent::Restore { size }));
    }

    fn fail(&self, reason: &str) {
        self.record(&Event::Dump(DumpEvent::Fail {
            reason: reason.into(),
        }));
    }
}

impl<T: EventSink + ?Sized> AllocMetrics for T {
    fn alloc(&self, cap: u64) {
        self.record(&Event::Alloc(AllocEvent::Alloc { cap }));
    }

    fn grow(&self, old_cap: u64, new_cap: u64) {
        self.record(&Event::Alloc(AllocEvent::Grow { old_cap, new_cap }));
    }

    fn free(&self, cap: u64) {
        self.record(&Event::Alloc(AllocEvent::Free { cap }));
    }
}

impl<T: EventSink + ?Sized> BufferPoolMetrics for T {
    fn pool_acquire(&self, cap: u64) {
        self.record(&Event::BufferPool(BufferPoolEvent::Acquire { cap }));
    }

    fn pool_release(&self, cap: u64) {
        self.record(&Event::BufferPool(BufferPoolEvent::Release { cap }));
    }
}

impl<T: EventSink + ?Sized> CacheMetrics for T {
    fn arena_alloc(&self, bucket: &str, size: u64) {
        self.record(&Event::Cache(CacheEvent::new(bucket, CacheOp::ArenaAlloc { size })));
    }

    fn arena_fill(&self, bucket: &str, size: u64) {
        self.record(&Event::Cache(CacheEvent::new(bucket, CacheOp::ArenaFill { size })));
    }

    fn arena_reset(&self, bucket: &str, size: u64) {
        self.record(&Event::Cache(CacheEvent::new(bucket, CacheOp::ArenaReset { size })));
    }

    fn arena_release(&self, bucket: &str, size: u64) {
        self.record(&Event::Cache(CacheEvent::new(
            bucket,
            CacheOp::ArenaRelease { size },
        )));
    }

    fn set(&self, bucket: &str, duration: Duration) {
        self.record(&Event::Cache(CacheEvent::new(bucket, CacheOp::Set { duration })));
    }

    fn evict(&self, bucket: &str, alive: bool) {
        self.record(&Event::Cache(CacheEvent::new(bucket, CacheOp::Evict { alive })));
    }

    fn miss(&self, bucket: &str) {
        self.record(&Event::Cache(CacheEvent::new(bucket, CacheOp::Miss)));
    }

    fn hit(&self, bucket: &str, duration: Duration) {
        self.record(&Event::Cache(CacheEvent::new(bucket, CacheOp::Hit { duration })));
    }

    fn expire(&self, bucket: &str) {
        self.record(&Event::Cache(CacheEvent::new(bucket, CacheOp::Expire)));
    }

    fn corrupt(&self, bucket: &str) {
        self.record(&Event::Cache(CacheEvent::new(bucket, CacheOp::Corrupt)));
    }

    fn collision(&self, bucket: &str) {
        self.record(&Event::Cache(CacheEvent::new(bucket, CacheOp::Collision)));
    }

    fn no_space(&self, bucket: &str) {
        self.record(&Event::Cache(CacheEvent::new(bucket, CacheOp::NoSpace)));
    }

    fn cache_dump(&self, bucket: &str) {
        self.record(&Event::Cache(CacheEvent::new(bucket, CacheOp::Dump)));
    }

    fn cache_load(&self, bucket: &str) {
        self.record(&Event::Cache(CacheEvent::new(bucket, CacheOp::Load)));
    }
}

impl<T: EventSink + ?Sized> FetchMetrics for T {
    fn fetch(&self) {
        self.record(&Event::Fetch(FetchEvent::Fetch));
    }

    fn fetch_ok(&self, duration: Duration) {
        self.record(&Event::Fetch(FetchEvent::Ok { duration }));
    }

    fn fetch_not_found(&self) {
        self.record(&Event::Fetch(FetchEvent::NotFound));
    }

    fn fetch_timeout(&self) {
        self.record(&Event::Fetch(FetchEvent::Timeout));
    }

    fn fetch_fail(&self) {
        self.record(&Event::Fetch(FetchEvent::Fail));
    }

    fn batch(&self) {
        self.record(&Event::Fetch(FetchEvent::Batch));
    }

    fn batch_ok(&self, duration: Duration) {
        self.record(&Event::Fetch(FetchEvent::BatchOk { duration }));
    }

    fn batch_fail(&self) {
        self.record(&Event::Fetch(FetchEvent::BatchFail));
    }
}

impl<T: EventSink + ?Sized> LaborMetrics for T {
    fn hire(&self, unknown: bool) {
        self.record(&Event::Labor(LaborEvent::Hire { unknown }));
    }

    fn fire(&self) {
        self.record(&Event::Labor(LaborEvent::Fire));
    }

    fn retire(&self) {
        self.record(&Event::Labor(LaborEvent::Retire));
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl NoopSink {
    pub fn shared() -> Arc<NoopSink> {
        Arc::new(NoopSink)
    }
}

impl Sink for NoopSink {
    fn identity(&self) -> &str {
        ""
    }
}

impl EventSink for NoopSink {
    #[inline]
    fn record(&self, _event: &Event<'_>) {}
}
