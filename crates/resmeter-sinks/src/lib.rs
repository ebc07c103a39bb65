//! resmeter backends: the metrics registry, the aggregating and log sinks,
//! config loading, the config-driven sink factory and the pull exporter.
//!
//! Intended to be consumed by the exporter binary (`main.rs`), by services
//! embedding the registry, and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod aggregate;
pub mod config;
pub mod exporter;
pub mod factory;
pub mod log;
pub mod registry;

pub use aggregate::AggregateSink;
pub use factory::{Backend, ConfiguredSink, SinkSet};
pub use log::LogSink;
pub use registry::{HistogramSnapshot, MetricsRegistry};
