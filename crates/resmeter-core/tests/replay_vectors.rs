//! Ledger replay vectors.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use resmeter_core::{EventSink, LedgerSink, Replay};

mod vector_loader;
use vector_loader::{load, series, ReplayVector};

const FILES: &[&str] = &[
    "worker_jobs.json",
    "worker_forced_stop_sleep.json",
    "worker_forced_stop_idle.json",
    "worker_undeclared.json",
    "worker_wait.json",
    "queue_drain.json",
    "queue_pull_without_put.json",
    "dump_flush_restore.json",
    "alloc_grow.json",
    "buffer_pool.json",
    "cache_edge_arena.json",
    "cache_arena_reset_release.json",
    "cache_arena_unfilled_release.json",
    "cache_arena_shared_bucket.json",
    "cache_entries.json",
    "cache_empty_bucket.json",
    "fetch_inflight.json",
    "labor_pool.json",
];

fn check(v: &ReplayVector, ledger: &LedgerSink) {
    let state = ledger.snapshot();
    let d = &v.description;

    for g in &v.expect.gauges {
        let got = state.gauge(series(&g.series), g.sub.as_deref());
        assert_eq!(got, g.value, "gauge {} vector={d}", g.series);
    }
    for c in &v.expect.counters {
        let got = state.counter(series(&c.series), c.sub.as_deref());
        assert_eq!(got, c.value, "counter {} vector={d}", c.series);
    }
    for o in &v.expect.observations {
        let got = state.observations(series(&o.series), o.sub.as_deref());
        assert_eq!(got, o.values.as_slice(), "histogram {} vector={d}", o.series);
    }

    let codes: Vec<&str> = state.violations.iter().map(|v| v.code()).collect();
    assert_eq!(codes, v.expect.violations, "vector={d}");
    assert_eq!(state.events, v.events.len() as u64, "vector={d}");
}

#[test]
fn replay_vectors_through_sink_methods() {
    for f in FILES {
        let v = load(f);
        let ledger = LedgerSink::new(v.identity.clone());
        Replay::new(v.identity.clone(), v.events.clone()).run(&ledger);
        check(&v, &ledger);
    }
}

#[test]
fn replay_vectors_through_record() {
    for f in FILES {
        let v = load(f);
        let ledger = LedgerSink::new(v.identity.clone());
        for e in &v.events {
            ledger.record(e);
        }
        check(&v, &ledger);
    }
}

#[test]
fn both_paths_book_identical_state() {
    for f in FILES {
        let v = load(f);
        let a = LedgerSink::new(v.identity.clone());
        let b = LedgerSink::new(v.identity.clone());
        Replay::new(v.identity.clone(), v.events.clone()).run(&a);
        for e in &v.events {
            b.record(e);
        }
        assert_eq!(a.snapshot(), b.snapshot(), "vector={}", v.description);
    }
}

#[test]
fn replay_parses_from_json() {
    let r = Replay::from_json(
        r#"{"identity":"jobs","events":[{"worker":{"kind":"setup","active":1,"sleep":0,"idle":1}},{"worker":{"kind":"init","idx":1}}]}"#,
    )
    .unwrap();
    assert_eq!(r.identity, "jobs");
    assert_eq!(r.events.len(), 2);

    let ledger = LedgerSink::new("jobs");
    r.run(&ledger);
    assert!(ledger.is_clean());
    assert_eq!(ledger.snapshot().worker_total(), 2);
}

#[test]
fn replay_rejects_unknown_fields() {
    let err = Replay::from_json(r#"{"identity":"jobs","events":[],"extra":1}"#).unwrap_err();
    assert_eq!(err.code().as_str(), "BAD_CONFIG");

    let err = Replay::from_json(r#"{"identity":"jobs","events":[{"worker":{"kind":"jump"}}]}"#)
        .unwrap_err();
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}
