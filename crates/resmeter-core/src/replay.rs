//! Replay of recorded or synthetic event sequences.
//!
//! `deliver` routes an event value through a sink's public methods, exactly as
//! an instrumented manager would call them. A [`Replay`] is an identity plus an
//! ordered event list, usually loaded from JSON.

use serde::{Deserialize, Serialize};

use crate::error::{ResmeterError, Result};
use crate::event::{
    AllocEvent, BufferPoolEvent, CacheEvent, CacheOp, DumpEvent, Event, FetchEvent, LaborEvent,
    QueueEvent, WorkerEvent,
};
use crate::sink::{
    AllocMetrics, BufferPoolMetrics, CacheMetrics, DumpMetrics, FetchMetrics, FullSink,
    LaborMetrics, QueueMetrics, WorkerMetrics,
};

impl WorkerEvent {
    pub fn deliver<S: WorkerMetrics + ?Sized>(&self, sink: &S) {
        match *self {
            WorkerEvent::Setup {
                active,
                sleep,
                idle,
            } => sink.worker_setup(active, sleep, idle),
            WorkerEvent::Init { idx } => sink.worker_init(idx),
            WorkerEvent::Sleep { idx } => sink.worker_sleep(idx),
            WorkerEvent::Wakeup { idx } => sink.worker_wakeup(idx),
            WorkerEvent::Wait { idx, delay } => sink.worker_wait(idx, delay),
            WorkerEvent::Stop { idx, forced, prior } => sink.worker_stop(idx, forced, prior),
        }
    }
}

impl QueueEvent {
    pub fn deliver<S: QueueMetrics + ?Sized>(&self, sink: &S) {
        match self {
            QueueEvent::Put => sink.queue_put(),
            QueueEvent::Pull => sink.queue_pull(),
            QueueEvent::Retry => sink.queue_retry(),
            QueueEvent::Leak => sink.queue_leak(),
            QueueEvent::Lost => sink.queue_lost(),
        }
    }
}

impl DumpEvent<'_> {
    pub fn deliver<S: DumpMetrics + ?Sized>(&self, sink: &S) {
        match self {
            DumpEvent::Dump { size } => sink.dump(*size),
            DumpEvent::Flush { reason, size } => sink.flush(reason, *size),
            DumpEvent::Restore { size } => sink.restore(*size),
            DumpEvent::Fail { reason } => sink.fail(reason),
        }
    }
}

impl AllocEvent {
    pub fn deliver<S: AllocMetrics + ?Sized>(&self, sink: &S) {
        match *self {
            AllocEvent::Alloc { cap } => sink.alloc(cap),
            AllocEvent::Grow { old_cap, new_cap } => sink.grow(old_cap, new_cap),
            AllocEvent::Free { cap } => sink.free(cap),
        }
    }
}

impl BufferPoolEvent {
    pub fn deliver<S: BufferPoolMetrics + ?Sized>(&self, sink: &S) {
        match *self {
            BufferPoolEvent::Acquire { cap } => sink.pool_acquire(cap),
            BufferPoolEvent::Release { cap } => sink.pool_release(cap),
        }
    }
}

impl CacheEvent<'_> {
    pub fn deliver<S: CacheMetrics + ?Sized>(&self, sink: &S) {
        let bucket: &str = &self.bucket;
        match self.op {
            CacheOp::ArenaAlloc { size } => sink.arena_alloc(bucket, size),
            CacheOp::ArenaFill { size } => sink.arena_fill(bucket, size),
            CacheOp::ArenaReset { size } => sink.arena_reset(bucket, size),
            CacheOp::ArenaRelease { size } => sink.arena_release(bucket, size),
            CacheOp::Set { duration } => sink.set(bucket, duration),
            CacheOp::Evict { alive } => sink.evict(bucket, alive),
            CacheOp::Miss => sink.miss(bucket),
            CacheOp::Hit { duration } => sink.hit(bucket, duration),
            CacheOp::Expire => sink.expire(bucket),
            CacheOp::Corrupt => sink.corrupt(bucket),
            CacheOp::Collision => sink.collision(bucket),
            CacheOp::NoSpace => sink.no_space(bucket),
            CacheOp::Dump => sink.cache_dump(bucket),
            CacheOp::Load => sink.cache_load(bucket),
        }
    }
}

impl FetchEvent {
    pub fn deliver<S: FetchMetrics + ?Sized>(&self, sink: &S) {
        match *self {
            FetchEvent::Fetch => sink.fetch(),
            FetchEvent::Ok { duration } => sink.fetch_ok(duration),
            FetchEvent::NotFound => sink.fetch_not_found(),
            FetchEvent::Timeout => sink.fetch_timeout(),
            FetchEvent::Fail => sink.fetch_fail(),
            FetchEvent::Batch => sink.batch(),
            FetchEvent::BatchOk { duration } => sink.batch_ok(duration),
            FetchEvent::BatchFail => sink.batch_fail(),
        }
    }
}

impl LaborEvent {
    pub fn deliver<S: LaborMetrics + ?Sized>(&self, sink: &S) {
        match *self {
            LaborEvent::Hire { unknown } => sink.hire(unknown),
            LaborEvent::Fire => sink.fire(),
            LaborEvent::Retire => sink.retire(),
        }
    }
}

impl Event<'_> {
    pub fn deliver<S: FullSink + ?Sized>(&self, sink: &S) {
        match self {
            Event::Worker(e) => e.deliver(sink),
            Event::Queue(e) => e.deliver(sink),
            Event::Dump(e) => e.deliver(sink),
            Event::Alloc(e) => e.deliver(sink),
            Event::BufferPool(e) => e.deliver(sink),
            Event::Cache(e) => e.deliver(sink),
            Event::Fetch(e) => e.deliver(sink),
            Event::Labor(e) => e.deliver(sink),
        }
    }
}

/// An ordered event sequence for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Replay {
    pub identity: String,
    #[serde(default)]
    pub description: String,
    pub events: Vec<Event<'static>>,
}

impl Replay {
    pub fn new(identity: impl Into<String>, events: Vec<Event<'static>>) -> Self {
        Self {
            identity: identity.into(),
            description: String::new(),
            events,
        }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| ResmeterError::BadConfig(format!("invalid replay: {e}")))
    }

    /// Feed every event, in order, into `sink`.
    pub fn run<S: FullSink + ?Sized>(&self, sink: &S) {
        for event in &self.events {
            event.deliver(sink);
        }
    }
}
