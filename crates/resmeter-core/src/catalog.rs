//! Series catalog: stable names, kinds and label schemas.
//!
//! This table is the exposed wire contract. Names and label schemas must not
//! change shape once published; new series are added, existing ones are never
//! relabeled. The first label of every schema is the manager identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Manager classes that emit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerClass {
    Worker,
    Queue,
    Dump,
    Alloc,
    BufferPool,
    Cache,
    Fetch,
    Labor,
}

impl ManagerClass {
    pub const ALL: [ManagerClass; 8] = [
        ManagerClass::Worker,
        ManagerClass::Queue,
        ManagerClass::Dump,
        ManagerClass::Alloc,
        ManagerClass::BufferPool,
        ManagerClass::Cache,
        ManagerClass::Fetch,
        ManagerClass::Labor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ManagerClass::Worker => "worker",
            ManagerClass::Queue => "queue",
            ManagerClass::Dump => "dump",
            ManagerClass::Alloc => "alloc",
            ManagerClass::BufferPool => "buffer_pool",
            ManagerClass::Cache => "cache",
            ManagerClass::Fetch => "fetch",
            ManagerClass::Labor => "labor",
        }
    }

    /// Series owned by this class.
    pub fn series(self) -> &'static [Series] {
        use Series::*;
        match self {
            ManagerClass::Worker => &[WorkersActive, WorkersSleep, WorkersIdle, WorkerWait],
            ManagerClass::Queue => &[QueueSize, QueueIn, QueueOut, QueueRetry, QueueLeak, QueueLost],
            ManagerClass::Dump => &[
                DumpSizeIn,
                DumpSizeOut,
                DumpBytesIn,
                DumpBytesOut,
                DumpBytesFlush,
                DumpFail,
                DumpPendingBytes,
            ],
            ManagerClass::Alloc => &[AllocCount, GrowCount, FreeCount, AllocMem],
            ManagerClass::BufferPool => &[PoolAcquire, PoolRelease, PoolSize, PoolMem],
            ManagerClass::Cache => &[
                ArenaTotal,
                ArenaUsed,
                CacheEntries,
                ArenaAllocCount,
                ArenaFillCount,
                ArenaResetCount,
                ArenaReleaseCount,
                CacheSet,
                CacheEvict,
                CacheEvictAlive,
                CacheMiss,
                CacheHit,
                CacheExpire,
                CacheCorrupt,
                CacheCollision,
                CacheNoSpace,
                CacheDump,
                CacheLoad,
                CacheSetDuration,
                CacheHitDuration,
            ],
            ManagerClass::Fetch => &[
                FetchIn,
                FetchOk,
                FetchNotFound,
                FetchTimeout,
                FetchFail,
                BatchIn,
                BatchOk,
                BatchFail,
                FetchInflight,
                BatchInflight,
                FetchDuration,
                BatchDuration,
            ],
            ManagerClass::Labor => &[LaborSize, LaborHire, LaborFire, LaborRetire],
        }
    }
}

impl fmt::Display for ManagerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metric type of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    Counter,
    Gauge,
    Histogram,
}

impl SeriesKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SeriesKind::Counter => "counter",
            SeriesKind::Gauge => "gauge",
            SeriesKind::Histogram => "histogram",
        }
    }
}

/// Upper bucket bounds for duration histograms, in precision units.
/// A zero observation always lands in the first bucket.
pub const DURATION_BUCKETS: &[u64] = &[
    1, 2, 5, 10, 15, 20, 30, 40, 50, 100, 150, 200, 250, 500, 1_000, 1_500, 2_000, 3_000, 5_000,
];

const QUEUE: &[&str] = &["queue"];
const QUEUE_REASON: &[&str] = &["queue", "reason"];
const ALLOCATOR: &[&str] = &["allocator"];
const POOL: &[&str] = &["pool"];
const CACHE_BUCKET: &[&str] = &["cache", "bucket"];
const QUERY: &[&str] = &["query"];

/// Shape of a registered series. Catalog entries produce one via
/// [`Series::spec`]; registries also accept hand-built specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesSpec {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: SeriesKind,
    pub labels: &'static [&'static str],
    /// Empty unless `kind` is `Histogram`.
    pub buckets: &'static [u64],
}

/// Every series known to resmeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Series {
    // worker pool
    WorkersActive,
    WorkersSleep,
    WorkersIdle,
    WorkerWait,
    // bounded queue
    QueueSize,
    QueueIn,
    QueueOut,
    QueueRetry,
    QueueLeak,
    QueueLost,
    // dump queue
    DumpSizeIn,
    DumpSizeOut,
    DumpBytesIn,
    DumpBytesOut,
    DumpBytesFlush,
    DumpFail,
    DumpPendingBytes,
    // byte allocator
    AllocCount,
    GrowCount,
    FreeCount,
    AllocMem,
    // pooled buffers
    PoolAcquire,
    PoolRelease,
    PoolSize,
    PoolMem,
    // arena cache
    ArenaTotal,
    ArenaUsed,
    CacheEntries,
    ArenaAllocCount,
    ArenaFillCount,
    ArenaResetCount,
    ArenaReleaseCount,
    CacheSet,
    CacheEvict,
    CacheEvictAlive,
    CacheMiss,
    CacheHit,
    CacheExpire,
    CacheCorrupt,
    CacheCollision,
    CacheNoSpace,
    CacheDump,
    CacheLoad,
    CacheSetDuration,
    CacheHitDuration,
    // fetch helper
    FetchIn,
    FetchOk,
    FetchNotFound,
    FetchTimeout,
    FetchFail,
    BatchIn,
    BatchOk,
    BatchFail,
    FetchInflight,
    BatchInflight,
    FetchDuration,
    BatchDuration,
    // labor pool
    LaborSize,
    LaborHire,
    LaborFire,
    LaborRetire,
}

impl Series {
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn kind(self) -> SeriesKind {
        self.spec().kind
    }

    pub fn labels(self) -> &'static [&'static str] {
        self.spec().labels
    }

    /// True when the schema carries a sub-dimension after the identity.
    pub fn has_sub_dimension(self) -> bool {
        self.labels().len() > 1
    }

    pub fn class(self) -> ManagerClass {
        use Series::*;
        match self {
            WorkersActive | WorkersSleep | WorkersIdle | WorkerWait => ManagerClass::Worker,
            QueueSize | QueueIn | QueueOut | QueueRetry | QueueLeak | QueueLost => {
                ManagerClass::Queue
            }
            DumpSizeIn | DumpSizeOut | DumpBytesIn | DumpBytesOut | DumpBytesFlush | DumpFail
            | DumpPendingBytes => ManagerClass::Dump,
            AllocCount | GrowCount | FreeCount | AllocMem => ManagerClass::Alloc,
            PoolAcquire | PoolRelease | PoolSize | PoolMem => ManagerClass::BufferPool,
            FetchIn | FetchOk | FetchNotFound | FetchTimeout | FetchFail | BatchIn | BatchOk
            | BatchFail | FetchInflight | BatchInflight | FetchDuration | BatchDuration => {
                ManagerClass::Fetch
            }
            LaborSize | LaborHire | LaborFire | LaborRetire => ManagerClass::Labor,
            _ => ManagerClass::Cache,
        }
    }

    /// Full catalog entry.
    pub fn spec(self) -> SeriesSpec {
        use Series::*;
        use SeriesKind::{Counter, Gauge, Histogram};

        let (name, help, kind, labels) = match self {
            WorkersActive => ("queue_workers_active", "Indicates how many workers active.", Gauge, QUEUE),
            WorkersSleep => ("queue_workers_sleep", "Indicates how many workers sleep.", Gauge, QUEUE),
            WorkersIdle => ("queue_workers_idle", "Indicates how many workers idle.", Gauge, QUEUE),
            WorkerWait => ("queue_wait", "How long workers wait due to delayed execution.", Histogram, QUEUE),

            QueueSize => ("queue_size", "Actual queue size.", Gauge, QUEUE),
            QueueIn => ("queue_in", "How many items come to the queue.", Counter, QUEUE),
            QueueOut => ("queue_out", "How many items leave the queue.", Counter, QUEUE),
            QueueRetry => ("queue_retry", "How many retries occur.", Counter, QUEUE),
            QueueLeak => ("queue_leak", "How many items dropped because the queue is full.", Counter, QUEUE),
            QueueLost => ("queue_lost", "How many items discarded by a forced close.", Counter, QUEUE),

            DumpSizeIn => ("dlqdump_size_in", "How many items dumped.", Counter, QUEUE),
            DumpSizeOut => ("dlqdump_size_out", "How many items restored.", Counter, QUEUE),
            DumpBytesIn => ("dlqdump_bytes_in", "How many bytes come to the dump queue.", Counter, QUEUE),
            DumpBytesOut => ("dlqdump_bytes_out", "How many bytes restored from the dump queue.", Counter, QUEUE),
            DumpBytesFlush => ("dlqdump_bytes_flush", "How many bytes flushed, by reason.", Counter, QUEUE_REASON),
            DumpFail => ("dlqdump_fail", "Restore failures, by reason.", Counter, QUEUE_REASON),
            DumpPendingBytes => ("dlqdump_pending_bytes", "Bytes dumped and not yet restored.", Gauge, QUEUE),

            AllocCount => ("cbyte_alloc", "Count of alloc calls.", Counter, ALLOCATOR),
            GrowCount => ("cbyte_grow", "Count of realloc (grow) calls.", Counter, ALLOCATOR),
            FreeCount => ("cbyte_free", "Count of free calls.", Counter, ALLOCATOR),
            AllocMem => ("cbyte_mem", "Bytes managed by the allocator.", Gauge, ALLOCATOR),

            PoolAcquire => ("cbytebuf_acq", "Count of pool acquire.", Counter, POOL),
            PoolRelease => ("cbytebuf_rel", "Count of pool release.", Counter, POOL),
            PoolSize => ("cbytebuf_pool", "Buffers parked in the pool.", Gauge, POOL),
            PoolMem => ("cbytebuf_pool_mem", "Capacity of parked buffers in bytes.", Gauge, POOL),

            ArenaTotal => ("cbytecache_arena_total", "Bytes allocated for arenas.", Gauge, CACHE_BUCKET),
            ArenaUsed => ("cbytecache_arena_used", "Bytes of filled arenas.", Gauge, CACHE_BUCKET),
            CacheEntries => ("cbytecache_entries", "Live entries.", Gauge, CACHE_BUCKET),
            ArenaAllocCount => ("cbytecache_arena_alloc", "Count of arena allocations.", Counter, CACHE_BUCKET),
            ArenaFillCount => ("cbytecache_arena_fill", "Count of filled arenas.", Counter, CACHE_BUCKET),
            ArenaResetCount => ("cbytecache_arena_reset", "Count of arena resets.", Counter, CACHE_BUCKET),
            ArenaReleaseCount => ("cbytecache_arena_release", "Count of released arenas.", Counter, CACHE_BUCKET),
            CacheSet => ("cbytecache_set", "Count cache set calls.", Counter, CACHE_BUCKET),
            CacheEvict => ("cbytecache_evict", "Count cache evict calls.", Counter, CACHE_BUCKET),
            CacheEvictAlive => ("cbytecache_evict_alive", "Count evictions of unexpired entries.", Counter, CACHE_BUCKET),
            CacheMiss => ("cbytecache_miss", "Count cache misses.", Counter, CACHE_BUCKET),
            CacheHit => ("cbytecache_hit", "Count cache hits.", Counter, CACHE_BUCKET),
            CacheExpire => ("cbytecache_expire", "Count expired entries.", Counter, CACHE_BUCKET),
            CacheCorrupt => ("cbytecache_corrupt", "Count corrupted entries.", Counter, CACHE_BUCKET),
            CacheCollision => ("cbytecache_collision", "Count keys collisions.", Counter, CACHE_BUCKET),
            CacheNoSpace => ("cbytecache_no_space", "Count sets rejected for lack of space.", Counter, CACHE_BUCKET),
            CacheDump => ("cbytecache_dump", "Count dump operations.", Counter, CACHE_BUCKET),
            CacheLoad => ("cbytecache_load", "Count load operations.", Counter, CACHE_BUCKET),
            CacheSetDuration => ("cbytecache_set_duration", "Set latency.", Histogram, CACHE_BUCKET),
            CacheHitDuration => ("cbytecache_hit_duration", "Hit latency.", Histogram, CACHE_BUCKET),

            FetchIn => ("batch_query_fetch", "Items requested.", Counter, QUERY),
            FetchOk => ("batch_query_ok", "Items found.", Counter, QUERY),
            FetchNotFound => ("batch_query_not_found", "Items not found.", Counter, QUERY),
            FetchTimeout => ("batch_query_timeout", "Items timed out.", Counter, QUERY),
            FetchFail => ("batch_query_fail", "Items failed.", Counter, QUERY),
            BatchIn => ("batch_query_batch", "Batches started.", Counter, QUERY),
            BatchOk => ("batch_query_batch_ok", "Batches processed.", Counter, QUERY),
            BatchFail => ("batch_query_batch_fail", "Batches failed.", Counter, QUERY),
            FetchInflight => ("batch_query_inflight", "Items waiting for an outcome.", Gauge, QUERY),
            BatchInflight => ("batch_query_batch_inflight", "Batches waiting for an outcome.", Gauge, QUERY),
            FetchDuration => ("batch_query_fetch_duration", "Item latency.", Histogram, QUERY),
            BatchDuration => ("batch_query_batch_duration", "Batch latency.", Histogram, QUERY),

            LaborSize => ("laborpool_size", "Indicates how many workers idle waiting for hire.", Gauge, POOL),
            LaborHire => ("laborpool_hire", "How many workers hired.", Counter, POOL),
            LaborFire => ("laborpool_fire", "How many workers fired.", Counter, POOL),
            LaborRetire => ("laborpool_retire", "How many workers retired.", Counter, POOL),
        };

        let buckets = if kind == Histogram { DURATION_BUCKETS } else { &[] };
        SeriesSpec {
            name,
            help,
            kind,
            labels,
            buckets,
        }
    }

    /// Reverse lookup by exposed name.
    pub fn by_name(name: &str) -> Option<Series> {
        Series::all().find(|s| s.name() == name)
    }

    /// Iterate the whole catalog, class by class.
    pub fn all() -> impl Iterator<Item = Series> {
        ManagerClass::ALL
            .into_iter()
            .flat_map(|class| class.series().iter().copied())
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
