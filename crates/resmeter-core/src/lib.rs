//! resmeter core: event taxonomy, series catalog, sink traits and the
//! accounting table shared by every backend.
//!
//! Managers (queues, pools, caches, allocators) hold one sink per class and
//! report transitions through it. This crate carries no exporter or runtime
//! dependencies so managers can depend on it without pulling in a stack.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Sink methods never fail the caller; wiring errors surface as
//! `ResmeterError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod accounting;
pub mod catalog;
pub mod error;
pub mod event;
pub mod ledger;
pub mod precision;
pub mod replay;
pub mod sink;

/// Shared result type.
pub use error::{ErrorCode, ResmeterError, Result};

pub use accounting::{Accounted, Effect, Effects};
pub use catalog::{ManagerClass, Series, SeriesKind, SeriesSpec, DURATION_BUCKETS};
pub use event::{
    AllocEvent, BufferPoolEvent, CacheEvent, CacheOp, DumpEvent, Event, FetchEvent, LaborEvent,
    QueueEvent, WorkerEvent, WorkerStatus,
};
pub use ledger::{LedgerSink, LedgerState, SeriesKey, Violation};
pub use precision::{Precision, PrecisionUnit};
pub use replay::Replay;
pub use sink::{
    AllocMetrics, BufferPoolMetrics, CacheMetrics, DumpMetrics, EventSink, FetchMetrics,
    FullSink, LaborMetrics, NoopSink, QueueMetrics, Sink, WorkerMetrics,
};
