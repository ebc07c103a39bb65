//! Event taxonomy: one closed enum per manager class.
//!
//! Events are plain data. They carry the facts a manager already knows at a
//! transition (sizes, durations, reasons) and never carry behavior. Every enum
//! is `serde`-(de)serializable so synthetic sequences can be stored as JSON
//! and replayed (see [`crate::replay`]).
//!
//! JSON shape (externally tagged by class, internally tagged by kind):
//! ```text
//! {"worker": {"kind": "stop", "idx": 3, "forced": true, "prior": "sleep"}}
//! {"cache":  {"bucket": "b0", "op": {"kind": "hit", "duration_ns": 120}}}
//! ```

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::ManagerClass;

/// State a worker was in when it received a stop signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    /// Stopped / not running.
    Idle,
    Active,
    Sleep,
}

impl WorkerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerStatus::Idle => "idle",
            WorkerStatus::Active => "active",
            WorkerStatus::Sleep => "sleep",
        }
    }
}

/// Worker pool transitions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkerEvent {
    /// Initial (or re-declared) worker distribution.
    Setup { active: u32, sleep: u32, idle: u32 },
    /// Idle worker started.
    Init { idx: u32 },
    /// Active worker parked.
    Sleep { idx: u32 },
    /// Sleeping worker resumed.
    Wakeup { idx: u32 },
    /// Worker delayed execution of an item.
    Wait {
        idx: u32,
        #[serde(rename = "delay_ns", with = "nanos")]
        delay: Duration,
    },
    /// Worker stopped. `prior` only matters for forced stops.
    Stop {
        idx: u32,
        forced: bool,
        prior: WorkerStatus,
    },
}

/// Bounded queue admission and drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueueEvent {
    Put,
    Pull,
    Retry,
    /// Dropped because the queue is full.
    Leak,
    /// Discarded by a forced shutdown.
    Lost,
}

/// Dead-letter dump queue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DumpEvent<'a> {
    Dump { size: u64 },
    Flush { reason: Cow<'a, str>, size: u64 },
    Restore { size: u64 },
    Fail { reason: Cow<'a, str> },
}

/// Raw byte allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllocEvent {
    Alloc { cap: u64 },
    Grow { old_cap: u64, new_cap: u64 },
    Free { cap: u64 },
}

/// Pooled byte buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BufferPoolEvent {
    /// Buffer taken out of the pool.
    Acquire { cap: u64 },
    /// Buffer parked back in the pool.
    Release { cap: u64 },
}

/// Arena cache operation; always paired with a bucket in [`CacheEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheOp {
    ArenaAlloc { size: u64 },
    ArenaFill { size: u64 },
    ArenaReset { size: u64 },
    ArenaRelease { size: u64 },
    Set {
        #[serde(rename = "duration_ns", with = "nanos")]
        duration: Duration,
    },
    /// Entry evicted; `alive` when it had not expired yet.
    Evict { alive: bool },
    Miss,
    Hit {
        #[serde(rename = "duration_ns", with = "nanos")]
        duration: Duration,
    },
    Expire,
    Corrupt,
    Collision,
    NoSpace,
    Dump,
    Load,
}

/// Arena cache event. The bucket is part of the type, so a cache event
/// cannot be emitted without its sub-dimension.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheEvent<'a> {
    pub bucket: Cow<'a, str>,
    pub op: CacheOp,
}

impl<'a> CacheEvent<'a> {
    pub fn new(bucket: &'a str, op: CacheOp) -> Self {
        Self {
            bucket: Cow::Borrowed(bucket),
            op,
        }
    }
}

/// Single/batch fetch helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchEvent {
    Fetch,
    Ok {
        #[serde(rename = "duration_ns", with = "nanos")]
        duration: Duration,
    },
    NotFound,
    Timeout,
    Fail,
    Batch,
    BatchOk {
        #[serde(rename = "duration_ns", with = "nanos")]
        duration: Duration,
    },
    BatchFail,
}

/// Labor pool (parked workers waiting to be hired).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LaborEvent {
    /// Worker hired; `unknown` when it was created rather than taken from the pool.
    Hire { unknown: bool },
    /// Worker returned to the pool.
    Fire,
    /// Worker left the pool for good.
    Retire,
}

/// Any event of any class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Event<'a> {
    Worker(WorkerEvent),
    Queue(QueueEvent),
    Dump(DumpEvent<'a>),
    Alloc(AllocEvent),
    BufferPool(BufferPoolEvent),
    Cache(CacheEvent<'a>),
    Fetch(FetchEvent),
    Labor(LaborEvent),
}

impl Event<'_> {
    pub fn class(&self) -> ManagerClass {
        match self {
            Event::Worker(_) => ManagerClass::Worker,
            Event::Queue(_) => ManagerClass::Queue,
            Event::Dump(_) => ManagerClass::Dump,
            Event::Alloc(_) => ManagerClass::Alloc,
            Event::BufferPool(_) => ManagerClass::BufferPool,
            Event::Cache(_) => ManagerClass::Cache,
            Event::Fetch(_) => ManagerClass::Fetch,
            Event::Labor(_) => ManagerClass::Labor,
        }
    }
}

impl fmt::Display for WorkerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerEvent::Setup {
                active,
                sleep,
                idle,
            } => write!(
                f,
                "setup workers {active} active, {sleep} sleep and {idle} idle"
            ),
            WorkerEvent::Init { idx } => write!(f, "worker {idx} caught init signal"),
            WorkerEvent::Sleep { idx } => write!(f, "worker {idx} caught sleep signal"),
            WorkerEvent::Wakeup { idx } => write!(f, "worker {idx} caught wakeup signal"),
            WorkerEvent::Wait { idx, delay } => write!(f, "worker {idx} waits {delay:?}"),
            WorkerEvent::Stop {
                idx,
                forced: true,
                prior,
            } => write!(
                f,
                "worker {idx} caught force stop signal (current status {})",
                prior.as_str()
            ),
            WorkerEvent::Stop { idx, .. } => write!(f, "worker {idx} caught stop signal"),
        }
    }
}

impl fmt::Display for QueueEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QueueEvent::Put => "new item come to the queue",
            QueueEvent::Pull => "item leave the queue",
            QueueEvent::Retry => "retry item processing due to fail",
            QueueEvent::Leak => "queue leak",
            QueueEvent::Lost => "queue lost",
        })
    }
}

impl fmt::Display for DumpEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpEvent::Dump { size } => write!(f, "{size} bytes come to the queue"),
            DumpEvent::Flush { reason, size } => {
                write!(f, "flush {size} bytes due to reason {reason}")
            }
            DumpEvent::Restore { size } => write!(f, "{size} bytes restored from dump"),
            DumpEvent::Fail { reason } => write!(f, "restore failed with reason '{reason}'"),
        }
    }
}

impl fmt::Display for AllocEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocEvent::Alloc { cap } => write!(f, "alloc {cap} bytes"),
            AllocEvent::Grow { old_cap, new_cap } => {
                write!(f, "grow from {old_cap} to {new_cap} bytes")
            }
            AllocEvent::Free { cap } => write!(f, "free {cap} bytes"),
        }
    }
}

impl fmt::Display for BufferPoolEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferPoolEvent::Acquire { cap } => write!(f, "acquire buffer of {cap} bytes"),
            BufferPoolEvent::Release { cap } => write!(f, "release buffer of {cap} bytes"),
        }
    }
}

impl fmt::Display for CacheOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheOp::ArenaAlloc { size } => write!(f, "alloc arena of {size} bytes"),
            CacheOp::ArenaFill { size } => write!(f, "fill arena with {size} bytes"),
            CacheOp::ArenaReset { size } => write!(f, "reset arena of {size} bytes"),
            CacheOp::ArenaRelease { size } => write!(f, "release arena of {size} bytes"),
            CacheOp::Set { duration } => write!(f, "set new entry in {duration:?}"),
            CacheOp::Evict { alive: true } => f.write_str("evict alive entry"),
            CacheOp::Evict { alive: false } => f.write_str("evict entry"),
            CacheOp::Miss => f.write_str("cache miss"),
            CacheOp::Hit { duration } => write!(f, "cache hit in {duration:?}"),
            CacheOp::Expire => f.write_str("hit expired entry"),
            CacheOp::Corrupt => f.write_str("hit corrupted entry"),
            CacheOp::Collision => f.write_str("keys collision"),
            CacheOp::NoSpace => f.write_str("no space available to set new entry"),
            CacheOp::Dump => f.write_str("dump entries"),
            CacheOp::Load => f.write_str("load entries"),
        }
    }
}

impl fmt::Display for CacheEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bucket {}: {}", self.bucket, self.op)
    }
}

impl fmt::Display for FetchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchEvent::Fetch => f.write_str("new item income"),
            FetchEvent::Ok { duration } => write!(f, "item found in {duration:?}"),
            FetchEvent::NotFound => f.write_str("item not found"),
            FetchEvent::Timeout => f.write_str("item timed out"),
            FetchEvent::Fail => f.write_str("item processing fail"),
            FetchEvent::Batch => f.write_str("new batch completed"),
            FetchEvent::BatchOk { duration } => write!(f, "batch processed in {duration:?}"),
            FetchEvent::BatchFail => f.write_str("batch failed"),
        }
    }
}

impl fmt::Display for LaborEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LaborEvent::Hire { unknown: true } => "new unknown worker hired",
            LaborEvent::Hire { unknown: false } => "worker hired",
            LaborEvent::Fire => "worker fired",
            LaborEvent::Retire => "worker retired",
        })
    }
}

impl fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Worker(e) => fmt::Display::fmt(e, f),
            Event::Queue(e) => fmt::Display::fmt(e, f),
            Event::Dump(e) => fmt::Display::fmt(e, f),
            Event::Alloc(e) => fmt::Display::fmt(e, f),
            Event::BufferPool(e) => fmt::Display::fmt(e, f),
            Event::Cache(e) => fmt::Display::fmt(e, f),
            Event::Fetch(e) => fmt::Display::fmt(e, f),
            Event::Labor(e) => fmt::Display::fmt(e, f),
        }
    }
}

/// Durations are stored as integer nanoseconds in JSON.
mod nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_nanos)
    }
}
