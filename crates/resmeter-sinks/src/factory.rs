//! Config-driven sink construction.
//!
//! `SinkSet::build` turns the `sinks` section into one shared sink per
//! `(class, identity)`. Managers look their sink up by identity; an
//! unconfigured identity gets the no-op sink.

use std::collections::HashMap;
use std::sync::Arc;

use resmeter_core::catalog::ManagerClass;
use resmeter_core::error::Result;
use resmeter_core::event::Event;
use resmeter_core::sink::{
    AllocMetrics, BufferPoolMetrics, CacheMetrics, DumpMetrics, EventSink, FetchMetrics,
    LaborMetrics, NoopSink, QueueMetrics, Sink, WorkerMetrics,
};

use crate::aggregate::AggregateSink;
use crate::config::{BackendKind, ResmeterConfig};
use crate::log::LogSink;
use crate::registry::MetricsRegistry;

/// Backend behind a configured sink.
pub enum Backend {
    Aggregate(AggregateSink),
    Log(LogSink),
    Noop(String),
}

/// A sink built from one `sinks` entry. Retiring it only drops what this
/// manager wrote, even when other classes share its identity.
pub struct ConfiguredSink {
    class: ManagerClass,
    backend: Backend,
}

impl ConfiguredSink {
    pub fn new(class: ManagerClass, backend: Backend) -> Self {
        Self { class, backend }
    }

    pub fn class(&self) -> ManagerClass {
        self.class
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn kind(&self) -> BackendKind {
        match self.backend {
            Backend::Aggregate(_) => BackendKind::Aggregate,
            Backend::Log(_) => BackendKind::Log,
            Backend::Noop(_) => BackendKind::Noop,
        }
    }
}

impl Sink for ConfiguredSink {
    fn identity(&self) -> &str {
        match &self.backend {
            Backend::Aggregate(s) => s.identity(),
            Backend::Log(s) => s.identity(),
            Backend::Noop(identity) => identity,
        }
    }

    fn forget(&self) {
        match &self.backend {
            Backend::Aggregate(s) => s.forget(),
            Backend::Log(s) => s.forget(),
            Backend::Noop(_) => {}
        }
        tracing::debug!(class = %self.class, identity = %self.identity(), "sink retired");
    }
}

impl EventSink for ConfiguredSink {
    fn record(&self, event: &Event<'_>) {
        match &self.backend {
            Backend::Aggregate(s) => s.record(event),
            Backend::Log(s) => s.record(event),
            Backend::Noop(_) => {}
        }
    }
}

pub struct SinkSet {
    registry: Arc<MetricsRegistry>,
    sinks: HashMap<(ManagerClass, String), Arc<ConfiguredSink>>,
    noop: Arc<NoopSink>,
}

impl SinkSet {
    pub fn build(cfg: &ResmeterConfig, registry: Arc<MetricsRegistry>) -> Result<Self> {
        registry.register_catalog()?;

        let mut sinks = HashMap::new();
        for s in &cfg.sinks {
            let backend = match s.backend {
                BackendKind::Aggregate => Backend::Aggregate(AggregateSink::new(
                    Arc::clone(&registry),
                    s.identity.clone(),
                    cfg.precision_of(s),
                )?),
                BackendKind::Log => Backend::Log(LogSink::new(s.identity.clone())),
                BackendKind::Noop => Backend::Noop(s.identity.clone()),
            };
            let sink = ConfiguredSink::new(s.class, backend);
            tracing::info!(
                class = %s.class,
                identity = %s.identity,
                backend = ?s.backend,
                "sink configured"
            );
            sinks.insert((s.class, s.identity.clone()), Arc::new(sink));
        }

        Ok(Self {
            registry,
            sinks,
            noop: NoopSink::shared(),
        })
    }

    pub fn registry(&self) -> &Arc<MetricsRegistry> {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn get(&self, class: ManagerClass, identity: &str) -> Option<Arc<ConfiguredSink>> {
        self.sinks.get(&(class, identity.to_string())).cloned()
    }

    pub fn worker(&self, identity: &str) -> Arc<dyn WorkerMetrics> {
        match self.get(ManagerClass::Worker, identity) {
            Some(s) => s,
            None => self.noop.clone(),
        }
    }

    pub fn queue(&self, identity: &str) -> Arc<dyn QueueMetrics> {
        match self.get(ManagerClass::Queue, identity) {
            Some(s) => s,
            None => self.noop.clone(),
        }
    }

    pub fn dump(&self, identity: &str) -> Arc<dyn DumpMetrics> {
        match self.get(ManagerClass::Dump, identity) {
            Some(s) => s,
            None => self.noop.clone(),
        }
    }

    pub fn alloc(&self, identity: &str) -> Arc<dyn AllocMetrics> {
        match self.get(ManagerClass::Alloc, identity) {
            Some(s) => s,
            None => self.noop.clone(),
        }
    }

    pub fn buffer_pool(&self, identity: &str) -> Arc<dyn BufferPoolMetrics> {
        match self.get(ManagerClass::BufferPool, identity) {
            Some(s) => s,
            None => self.noop.clone(),
        }
    }

    pub fn cache(&self, identity: &str) -> Arc<dyn CacheMetrics> {
        match self.get(ManagerClass::Cache, identity) {
            Some(s) => s,
            None => self.noop.clone(),
        }
    }

    pub fn fetch(&self, identity: &str) -> Arc<dyn FetchMetrics> {
        match self.get(ManagerClass::Fetch, identity) {
            Some(s) => s,
            None => self.noop.clone(),
        }
    }

    pub fn labor(&self, identity: &str) -> Arc<dyn LaborMetrics> {
        match self.get(ManagerClass::Labor, identity) {
            Some(s) => s,
            None => self.noop.clone(),
        }
    }

    /// Retire the series one configured sink wrote. Sinks of other classes
    /// under the same identity keep theirs. Returns false for unknown sinks.
    pub fn retire(&self, class: ManagerClass, identity: &str) -> bool {
        match self.get(class, identity) {
            Some(s) => {
                s.forget();
                true
            }
            None => false,
        }
    }
}
