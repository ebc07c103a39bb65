//! In-memory accounting ledger with invariant checks.
//!
//! `LedgerSink` receives every class of event, books the accounting table
//! into plain maps and checks the invariants after each event:
//! - no gauge goes negative;
//! - worker gauges sum to the last declared setup total;
//! - series with a sub-dimension always receive one.
//!
//! Violations are recorded, never raised: misuse by a manager is a caller
//! defect and must not take the process down. The ledger takes one lock per
//! event, so it is meant for replay harnesses and debugging rather than hot
//! paths.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::accounting::{is_worker_transition, Accounted, Effect};
use crate::catalog::Series;
use crate::event::{Event, WorkerEvent};
use crate::precision::Precision;
use crate::sink::{EventSink, Sink};

/// Series plus optional sub-dimension value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesKey {
    pub series: Series,
    pub sub: Option<String>,
}

impl SeriesKey {
    pub fn new(series: Series, sub: Option<&str>) -> Self {
        Self {
            series,
            sub: sub.map(str::to_string),
        }
    }
}

/// Broken invariant, tagged with the 1-based index of the offending event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    NegativeGauge { key: SeriesKey, value: i64, event: u64 },
    WorkerImbalance { declared: i64, actual: i64, event: u64 },
    /// Worker transition before any setup.
    UndeclaredWorkers { event: u64 },
    MissingSubDimension { series: Series, event: u64 },
}

impl Violation {
    pub fn code(&self) -> &'static str {
        match self {
            Violation::NegativeGauge { .. } => "NEGATIVE_GAUGE",
            Violation::WorkerImbalance { .. } => "WORKER_IMBALANCE",
            Violation::UndeclaredWorkers { .. } => "UNDECLARED_WORKERS",
            Violation::MissingSubDimension { .. } => "MISSING_SUB_DIMENSION",
        }
    }

    /// 1-based index of the event that broke the invariant.
    pub fn event(&self) -> u64 {
        match *self {
            Violation::NegativeGauge { event, .. }
            | Violation::WorkerImbalance { event, .. }
            | Violation::UndeclaredWorkers { event }
            | Violation::MissingSubDimension { event, .. } => event,
        }
    }
}

/// Derived state booked so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    pub gauges: BTreeMap<SeriesKey, i64>,
    pub counters: BTreeMap<SeriesKey, u64>,
    /// Observations in precision units, in arrival order.
    pub observations: BTreeMap<SeriesKey, Vec<u64>>,
    pub declared_workers: Option<i64>,
    pub events: u64,
    pub violations: Vec<Violation>,
}

impl LedgerState {
    pub fn gauge(&self, series: Series, sub: Option<&str>) -> i64 {
        self.gauges
            .get(&SeriesKey::new(series, sub))
            .copied()
            .unwrap_or(0)
    }

    pub fn counter(&self, series: Series, sub: Option<&str>) -> u64 {
        self.counters
            .get(&SeriesKey::new(series, sub))
            .copied()
            .unwrap_or(0)
    }

    pub fn observations(&self, series: Series, sub: Option<&str>) -> &[u64] {
        self.observations
            .get(&SeriesKey::new(series, sub))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `active + sleep + idle`.
    pub fn worker_total(&self) -> i64 {
        self.gauge(Series::WorkersActive, None)
            + self.gauge(Series::WorkersSleep, None)
            + self.gauge(Series::WorkersIdle, None)
    }

    fn book<A: Accounted>(&mut self, event: &A, precision: Precision) {
        self.events += 1;
        let n = self.events;
        let sub = event.sub_dimension().filter(|s| !s.is_empty());

        for effect in event.effects().iter() {
            let series = effect.series();
            let key = if series.has_sub_dimension() {
                match sub {
                    Some(s) => SeriesKey::new(series, Some(s)),
                    None => {
                        self.violate(Violation::MissingSubDimension { series, event: n });
                        continue;
                    }
                }
            } else {
                SeriesKey::new(series, None)
            };

            match effect {
                Effect::Set(_, v) => {
                    self.gauges.insert(key.clone(), v);
                    self.check_gauge(key, n);
                }
                Effect::Add(_, delta) => {
                    let g = self.gauges.entry(key.clone()).or_insert(0);
                    *g = g.saturating_add(delta);
                    self.check_gauge(key, n);
                }
                Effect::Bound(_, bound) => {
                    let limit = self.gauge(bound, key.sub.as_deref());
                    let g = self.gauges.entry(key.clone()).or_insert(0);
                    *g = (*g).min(limit);
                    self.check_gauge(key, n);
                }
                Effect::Inc(_, v) => {
                    let c = self.counters.entry(key).or_insert(0);
                    *c = c.saturating_add(v);
                }
                Effect::Observe(_, d) => {
                    self.observations
                        .entry(key)
                        .or_default()
                        .push(precision.scale(d));
                }
            }
        }
    }

    fn violate(&mut self, violation: Violation) {
        tracing::warn!(?violation, "accounting invariant broken");
        self.violations.push(violation);
    }

    fn check_gauge(&mut self, key: SeriesKey, event: u64) {
        let value = self.gauges.get(&key).copied().unwrap_or(0);
        if value < 0 {
            self.violate(Violation::NegativeGauge { key, value, event });
        }
    }

    fn book_worker(&mut self, event: &WorkerEvent, precision: Precision) {
        self.book(event, precision);

        if let WorkerEvent::Setup {
            active,
            sleep,
            idle,
        } = *event
        {
            self.declared_workers = Some(i64::from(active) + i64::from(sleep) + i64::from(idle));
            return;
        }
        if !is_worker_transition(event) {
            return;
        }
        match self.declared_workers {
            None => self.violate(Violation::UndeclaredWorkers { event: self.events }),
            Some(declared) => {
                let actual = self.worker_total();
                if actual != declared {
                    self.violate(Violation::WorkerImbalance {
                        declared,
                        actual,
                        event: self.events,
                    });
                }
            }
        }
    }
}

/// Accounting sink that checks invariants as it books.
#[derive(Debug)]
pub struct LedgerSink {
    identity: String,
    precision: Precision,
    state: Mutex<LedgerState>,
}

impl LedgerSink {
    pub fn new(identity: impl Into<String>) -> Self {
        Self::with_precision(identity, Precision::NANOS)
    }

    pub fn with_precision(identity: impl Into<String>, precision: Precision) -> Self {
        Self {
            identity: identity.into(),
            precision,
            state: Mutex::new(LedgerState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> LedgerState {
        self.lock().clone()
    }

    pub fn gauge(&self, series: Series, sub: Option<&str>) -> i64 {
        self.lock().gauge(series, sub)
    }

    pub fn counter(&self, series: Series, sub: Option<&str>) -> u64 {
        self.lock().counter(series, sub)
    }

    pub fn violations(&self) -> Vec<Violation> {
        self.lock().violations.clone()
    }

    pub fn is_clean(&self) -> bool {
        self.lock().violations.is_empty()
    }
}

impl Sink for LedgerSink {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn forget(&self) {
        *self.lock() = LedgerState::default();
    }
}

impl EventSink for LedgerSink {
    fn record(&self, event: &Event<'_>) {
        let mut state = self.lock();
        match event {
            Event::Worker(e) => state.book_worker(e, self.precision),
            other => state.book(other, self.precision),
        }
    }
}
