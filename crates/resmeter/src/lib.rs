//! Top-level facade crate for resmeter.
//!
//! Re-exports the core contract and the backends so users can depend on a
//! single crate.

pub mod core {
    pub use resmeter_core::*;
}

pub mod sinks {
    pub use resmeter_sinks::*;
}

pub use resmeter_core::{
    AllocMetrics, BufferPoolMetrics, CacheMetrics, DumpMetrics, EventSink, FetchMetrics, FullSink,
    LaborMetrics, NoopSink, QueueMetrics, Sink, WorkerMetrics,
};
pub use resmeter_sinks::{AggregateSink, LogSink, MetricsRegistry, SinkSet};
