//! Aggregating backend: books the accounting table into a shared registry.
//!
//! Every catalog series is registered when the sink is built, and the
//! families are resolved once into a local table, so recording never touches
//! the registry's name index. Cells are created lazily per label tuple.
//!
//! Several sinks may share one identity (a worker pool and its queue are
//! usually named alike). Each sink remembers which series it has written,
//! and `forget` only drops the identity's cells in those series.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use resmeter_core::accounting::{Accounted, Effect};
use resmeter_core::catalog::Series;
use resmeter_core::error::Result;
use resmeter_core::event::Event;
use resmeter_core::precision::Precision;
use resmeter_core::sink::{EventSink, Sink};

use crate::registry::{Family, MetricsRegistry};

struct Slot {
    family: Family,
    written: AtomicBool,
}

impl Slot {
    fn mark(&self) {
        // read first: the flag is set once and then only read
        if !self.written.load(Ordering::Relaxed) {
            self.written.store(true, Ordering::Relaxed);
        }
    }
}

pub struct AggregateSink {
    identity: String,
    precision: Precision,
    registry: Arc<MetricsRegistry>,
    slots: HashMap<Series, Slot>,
}

impl AggregateSink {
    pub fn new(
        registry: Arc<MetricsRegistry>,
        identity: impl Into<String>,
        precision: Precision,
    ) -> Result<Self> {
        let mut slots = HashMap::new();
        for series in Series::all() {
            let family = registry.register(series)?;
            slots.insert(
                series,
                Slot {
                    family,
                    written: AtomicBool::new(false),
                },
            );
        }
        Ok(Self {
            identity: identity.into(),
            precision,
            registry,
            slots,
        })
    }

    pub fn registry(&self) -> &Arc<MetricsRegistry> {
        &self.registry
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Series this sink has written since it was built or last retired.
    pub fn written(&self) -> Vec<Series> {
        let mut out: Vec<Series> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.written.load(Ordering::Relaxed))
            .map(|(&series, _)| series)
            .collect();
        out.sort();
        out
    }

    fn gauge_of(&self, series: Series, labels: &[&str]) -> i64 {
        match self.slots.get(&series).map(|s| &s.family) {
            Some(Family::Gauge(g)) => g.get(labels).unwrap_or(0),
            _ => 0,
        }
    }

    fn apply<A: Accounted>(&self, event: &A) {
        let id = self.identity.as_str();
        let sub = event.sub_dimension().filter(|s| !s.is_empty());

        for effect in event.effects().iter() {
            let series = effect.series();
            let values: [&str; 2];
            let labels: &[&str] = if series.has_sub_dimension() {
                let Some(sub) = sub else {
                    tracing::warn!(identity = id, %series, "missing sub-dimension; observation dropped");
                    continue;
                };
                values = [id, sub];
                &values
            } else {
                values = [id, ""];
                &values[..1]
            };

            let Some(slot) = self.slots.get(&series) else {
                tracing::warn!(%series, "series not registered");
                continue;
            };
            slot.mark();
            match (effect, &slot.family) {
                (Effect::Set(_, v), Family::Gauge(g)) => g.set(labels, v),
                (Effect::Add(_, delta), Family::Gauge(g)) => g.add(labels, delta),
                (Effect::Bound(_, bound), Family::Gauge(g)) => {
                    g.lower_to(labels, self.gauge_of(bound, labels))
                }
                (Effect::Inc(_, v), Family::Counter(c)) => c.add(labels, v),
                (Effect::Observe(_, d), Family::Histogram(h)) => {
                    h.observe(labels, self.precision.scale(d))
                }
                _ => tracing::warn!(%series, "effect does not match the registered family"),
            }
        }
    }
}

impl Sink for AggregateSink {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn forget(&self) {
        let series: Vec<Series> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.written.swap(false, Ordering::Relaxed))
            .map(|(&series, _)| series)
            .collect();
        let removed = self.registry.forget_series(&self.identity, &series);
        tracing::debug!(identity = %self.identity, series = series.len(), removed, "identity retired");
    }
}

impl EventSink for AggregateSink {
    fn record(&self, event: &Event<'_>) {
        self.apply(event);
    }
}
