//! Explicit metrics registry.
//!
//! Counter/gauge/histogram families keyed by series name, each holding one
//! atomic cell per label tuple in a `DashMap`. Label values are stored in
//! schema order, so the key of a series is just its value vector. Histogram
//! values are integers already scaled by the caller's precision; buckets are
//! cumulative and fixed at registration.
//!
//! Registration is idempotent: re-registering the same shape is a no-op,
//! a different shape under the same name is a `SchemaConflict`.

use std::borrow::Borrow;
use std::fmt::Write;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use resmeter_core::catalog::{ManagerClass, Series, SeriesKind, SeriesSpec};
use resmeter_core::error::{ResmeterError, Result};

/// Owned label tuple of one cell, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Labels(Box<[Box<str>]>);

impl Labels {
    fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|v| &**v)
    }
}

impl From<&[&str]> for Labels {
    fn from(values: &[&str]) -> Self {
        Labels(values.iter().map(|&v| Box::from(v)).collect())
    }
}

/// Label tuple as seen by the map's hasher. Lets a borrowed `&[&str]` find
/// an existing cell without building an owned key.
trait LabelView {
    fn arity(&self) -> usize;
    fn at(&self, i: usize) -> &str;
}

impl LabelView for Labels {
    fn arity(&self) -> usize {
        self.0.len()
    }

    fn at(&self, i: usize) -> &str {
        self.0.get(i).map_or("", |v| &**v)
    }
}

impl LabelView for &[&str] {
    fn arity(&self) -> usize {
        self.len()
    }

    fn at(&self, i: usize) -> &str {
        self.get(i).copied().unwrap_or("")
    }
}

impl<'a> Hash for dyn LabelView + 'a {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.arity());
        for i in 0..self.arity() {
            self.at(i).hash(state);
        }
    }
}

impl<'a> PartialEq for dyn LabelView + 'a {
    fn eq(&self, other: &Self) -> bool {
        self.arity() == other.arity() && (0..self.arity()).all(|i| self.at(i) == other.at(i))
    }
}

impl<'a> Eq for dyn LabelView + 'a {}

// must hash exactly like the borrowed view
impl Hash for Labels {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self as &dyn LabelView).hash(state);
    }
}

impl<'a> Borrow<dyn LabelView + 'a> for Labels {
    fn borrow(&self) -> &(dyn LabelView + 'a) {
        self
    }
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn arity_ok(spec: &SeriesSpec, values: &[&str]) -> bool {
    if values.len() != spec.labels.len() {
        tracing::warn!(
            series = spec.name,
            expected = spec.labels.len(),
            got = values.len(),
            "label arity mismatch; observation dropped"
        );
        return false;
    }
    true
}

/// Apply `f` to the cell for `values`, creating it with `init` on first use.
/// Existing cells are reached through a shared shard lock.
fn with_cell<V, R>(
    map: &DashMap<Labels, V>,
    values: &[&str],
    init: impl FnOnce() -> V,
    f: impl FnOnce(&V) -> R,
) -> R {
    let view: &dyn LabelView = &values;
    if let Some(cell) = map.get(view) {
        return f(cell.value());
    }
    let cell = map.entry(Labels::from(values)).or_insert_with(init).downgrade();
    f(cell.value())
}

fn lookup<V, R>(map: &DashMap<Labels, V>, values: &[&str], f: impl FnOnce(&V) -> R) -> Option<R> {
    let view: &dyn LabelView = &values;
    map.get(view).map(|cell| f(cell.value()))
}

fn label_str(spec: &SeriesSpec, values: &Labels) -> String {
    spec.labels
        .iter()
        .zip(values.iter())
        .map(|(k, v)| format!("{k}=\"{}\"", escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn owned_by(values: &Labels, identity: &str) -> bool {
    values.iter().next() == Some(identity)
}

fn forget_owned<V>(map: &DashMap<Labels, V>, identity: &str) -> usize {
    let mut removed = 0;
    map.retain(|k, _| {
        let keep = !owned_by(k, identity);
        removed += usize::from(!keep);
        keep
    });
    removed
}

fn sorted<V, T>(map: &DashMap<Labels, V>, f: impl Fn(&V) -> T) -> Vec<(Labels, T)> {
    let mut rows: Vec<_> = map.iter().map(|r| (r.key().clone(), f(r.value()))).collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows
}

pub struct CounterVec {
    spec: SeriesSpec,
    map: DashMap<Labels, AtomicU64>,
}

impl CounterVec {
    fn new(spec: SeriesSpec) -> Self {
        Self {
            spec,
            map: DashMap::new(),
        }
    }

    pub fn spec(&self) -> &SeriesSpec {
        &self.spec
    }

    /// Increment by 1.
    pub fn inc(&self, values: &[&str]) {
        self.add(values, 1);
    }

    pub fn add(&self, values: &[&str], v: u64) {
        if !arity_ok(&self.spec, values) {
            return;
        }
        with_cell(&self.map, values, || AtomicU64::new(0), |c| {
            c.fetch_add(v, Ordering::Relaxed);
        });
    }

    pub fn get(&self, values: &[&str]) -> Option<u64> {
        lookup(&self.map, values, |c| c.load(Ordering::Relaxed))
    }

    fn forget(&self, identity: &str) -> usize {
        forget_owned(&self.map, identity)
    }

    fn render(&self, out: &mut String) {
        for (values, v) in sorted(&self.map, |c| c.load(Ordering::Relaxed)) {
            let _ = writeln!(out, "{}{{{}}} {}", self.spec.name, label_str(&self.spec, &values), v);
        }
    }
}

pub struct GaugeVec {
    spec: SeriesSpec,
    map: DashMap<Labels, AtomicI64>,
}

impl GaugeVec {
    fn new(spec: SeriesSpec) -> Self {
        Self {
            spec,
            map: DashMap::new(),
        }
    }

    pub fn spec(&self) -> &SeriesSpec {
        &self.spec
    }

    /// Overwrite the value.
    pub fn set(&self, values: &[&str], v: i64) {
        if !arity_ok(&self.spec, values) {
            return;
        }
        with_cell(&self.map, values, || AtomicI64::new(0), |g| g.store(v, Ordering::Relaxed));
    }

    /// Add an arbitrary signed delta.
    pub fn add(&self, values: &[&str], v: i64) {
        if !arity_ok(&self.spec, values) {
            return;
        }
        with_cell(&self.map, values, || AtomicI64::new(0), |g| {
            g.fetch_add(v, Ordering::Relaxed);
        });
    }

    /// Lower the value to at most `bound`.
    pub fn lower_to(&self, values: &[&str], bound: i64) {
        if !arity_ok(&self.spec, values) {
            return;
        }
        with_cell(&self.map, values, || AtomicI64::new(0), |g| {
            g.fetch_min(bound, Ordering::Relaxed);
        });
    }

    pub fn inc(&self, values: &[&str]) {
        self.add(values, 1);
    }

    pub fn dec(&self, values: &[&str]) {
        self.add(values, -1);
    }

    pub fn get(&self, values: &[&str]) -> Option<i64> {
        lookup(&self.map, values, |g| g.load(Ordering::Relaxed))
    }

    fn forget(&self, identity: &str) -> usize {
        forget_owned(&self.map, identity)
    }

    fn render(&self, out: &mut String) {
        for (values, v) in sorted(&self.map, |g| g.load(Ordering::Relaxed)) {
            let _ = writeln!(out, "{}{{{}}} {}", self.spec.name, label_str(&self.spec, &values), v);
        }
    }
}

struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    /// Cumulative: `buckets[i]` counts observations `<= bounds[i]`.
    buckets: Box<[AtomicU64]>,
}

impl AtomicHistogram {
    fn new(bounds: usize) -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: AtomicU64::new(0),
            buckets: (0..bounds).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    fn snapshot(&self, bounds: &[u64]) -> HistogramSnapshot {
        HistogramSnapshot {
            buckets: bounds
                .iter()
                .zip(self.buckets.iter())
                .map(|(&le, c)| (le, c.load(Ordering::Relaxed)))
                .collect(),
            count: self.count.load(Ordering::Relaxed),
            sum: self.sum.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of one histogram cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramSnapshot {
    /// `(upper bound, cumulative count)` per bucket.
    pub buckets: Vec<(u64, u64)>,
    pub count: u64,
    pub sum: u64,
}

impl HistogramSnapshot {
    /// Observations above the last bound.
    pub fn overflow(&self) -> u64 {
        let last = self.buckets.last().map(|b| b.1).unwrap_or(0);
        self.count.saturating_sub(last)
    }
}

pub struct HistogramVec {
    spec: SeriesSpec,
    map: DashMap<Labels, AtomicHistogram>,
}

impl HistogramVec {
    fn new(spec: SeriesSpec) -> Self {
        Self {
            spec,
            map: DashMap::new(),
        }
    }

    pub fn spec(&self) -> &SeriesSpec {
        &self.spec
    }

    /// Record one value, already in precision units.
    pub fn observe(&self, values: &[&str], v: u64) {
        if !arity_ok(&self.spec, values) {
            return;
        }
        let bounds = self.spec.buckets;
        with_cell(
            &self.map,
            values,
            || AtomicHistogram::new(bounds.len()),
            |hist| {
                hist.count.fetch_add(1, Ordering::Relaxed);
                hist.sum.fetch_add(v, Ordering::Relaxed);
                for (bucket, &le) in hist.buckets.iter().zip(bounds) {
                    if v <= le {
                        bucket.fetch_add(1, Ordering::Relaxed);
                    }
                }
            },
        );
    }

    pub fn snapshot(&self, values: &[&str]) -> Option<HistogramSnapshot> {
        lookup(&self.map, values, |h| h.snapshot(self.spec.buckets))
    }

    fn forget(&self, identity: &str) -> usize {
        forget_owned(&self.map, identity)
    }

    fn render(&self, out: &mut String) {
        let name = self.spec.name;
        for (values, snap) in sorted(&self.map, |h| h.snapshot(self.spec.buckets)) {
            let labels = label_str(&self.spec, &values);
            let prefix = if labels.is_empty() {
                String::new()
            } else {
                format!("{labels},")
            };
            for (le, count) in &snap.buckets {
                let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"{le}\"}} {count}");
            }
            let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"+Inf\"}} {}", snap.count);
            let _ = writeln!(out, "{name}_sum{{{labels}}} {}", snap.sum);
            let _ = writeln!(out, "{name}_count{{{labels}}} {}", snap.count);
        }
    }
}

/// A registered family.
#[derive(Clone)]
pub enum Family {
    Counter(Arc<CounterVec>),
    Gauge(Arc<GaugeVec>),
    Histogram(Arc<HistogramVec>),
}

impl Family {
    fn new(spec: SeriesSpec) -> Self {
        match spec.kind {
            SeriesKind::Counter => Family::Counter(Arc::new(CounterVec::new(spec))),
            SeriesKind::Gauge => Family::Gauge(Arc::new(GaugeVec::new(spec))),
            SeriesKind::Histogram => Family::Histogram(Arc::new(HistogramVec::new(spec))),
        }
    }

    pub fn spec(&self) -> &SeriesSpec {
        match self {
            Family::Counter(c) => c.spec(),
            Family::Gauge(g) => g.spec(),
            Family::Histogram(h) => h.spec(),
        }
    }

    fn same_shape(&self, other: &SeriesSpec) -> bool {
        let spec = self.spec();
        spec.kind == other.kind && spec.labels == other.labels && spec.buckets == other.buckets
    }

    fn forget(&self, identity: &str) -> usize {
        match self {
            Family::Counter(c) => c.forget(identity),
            Family::Gauge(g) => g.forget(identity),
            Family::Histogram(h) => h.forget(identity),
        }
    }

    fn render(&self, out: &mut String) {
        let spec = self.spec();
        let _ = writeln!(out, "# HELP {} {}", spec.name, spec.help);
        let _ = writeln!(out, "# TYPE {} {}", spec.name, spec.kind.as_str());
        match self {
            Family::Counter(c) => c.render(out),
            Family::Gauge(g) => g.render(out),
            Family::Histogram(h) => h.render(out),
        }
    }
}

/// Process-wide set of families, shared by every backend through `Arc`.
#[derive(Default)]
pub struct MetricsRegistry {
    families: DashMap<&'static str, Family>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hand-built spec. Idempotent for identical shapes.
    pub fn register_spec(&self, spec: SeriesSpec) -> Result<Family> {
        if let Some(existing) = self.families.get(spec.name) {
            if existing.same_shape(&spec) {
                return Ok(existing.clone());
            }
            tracing::warn!(series = spec.name, "conflicting series registration");
            return Err(ResmeterError::SchemaConflict {
                name: spec.name.to_string(),
            });
        }

        let family = self
            .families
            .entry(spec.name)
            .or_insert_with(|| {
                tracing::debug!(series = spec.name, kind = spec.kind.as_str(), "series registered");
                Family::new(spec)
            })
            .clone();
        // lost a registration race against a different shape
        if !family.same_shape(&spec) {
            return Err(ResmeterError::SchemaConflict {
                name: spec.name.to_string(),
            });
        }
        Ok(family)
    }

    pub fn register(&self, series: Series) -> Result<Family> {
        self.register_spec(series.spec())
    }

    pub fn register_class(&self, class: ManagerClass) -> Result<()> {
        for &series in class.series() {
            self.register(series)?;
        }
        Ok(())
    }

    pub fn register_catalog(&self) -> Result<()> {
        for class in ManagerClass::ALL {
            self.register_class(class)?;
        }
        Ok(())
    }

    pub fn family(&self, name: &str) -> Option<Family> {
        self.families.get(name).map(|f| f.clone())
    }

    pub fn counter_value(&self, name: &str, values: &[&str]) -> Option<u64> {
        match self.family(name)? {
            Family::Counter(c) => c.get(values),
            _ => None,
        }
    }

    pub fn gauge_value(&self, name: &str, values: &[&str]) -> Option<i64> {
        match self.family(name)? {
            Family::Gauge(g) => g.get(values),
            _ => None,
        }
    }

    pub fn histogram(&self, name: &str, values: &[&str]) -> Option<HistogramSnapshot> {
        match self.family(name)? {
            Family::Histogram(h) => h.snapshot(values),
            _ => None,
        }
    }

    /// Drop the label tuples owned by `identity` in the given series only.
    /// Returns how many cells were removed.
    pub fn forget_series(&self, identity: &str, series: &[Series]) -> usize {
        series
            .iter()
            .filter_map(|s| self.family(s.name()))
            .map(|f| f.forget(identity))
            .sum()
    }

    /// Drop every label tuple owned by `identity`, across all families.
    pub fn forget_all(&self, identity: &str) -> usize {
        let families: Vec<Family> = self.families.iter().map(|f| f.value().clone()).collect();
        families.iter().map(|f| f.forget(identity)).sum()
    }

    /// Render every family in Prometheus text exposition format, sorted by
    /// name and label values.
    pub fn render(&self) -> String {
        let mut families: Vec<Family> = self.families.iter().map(|f| f.value().clone()).collect();
        families.sort_by_key(|f| f.spec().name);

        let mut out = String::new();
        for f in &families {
            f.render(&mut out);
        }
        out
    }
}
