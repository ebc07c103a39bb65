#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use resmeter_core::{ManagerClass, Series, SeriesKind, SeriesSpec, DURATION_BUCKETS};
use resmeter_sinks::registry::{Family, MetricsRegistry};

#[test]
fn registration_is_idempotent() {
    let r = MetricsRegistry::new();
    r.register_catalog().unwrap();
    r.register_catalog().unwrap();
    r.register_class(ManagerClass::Cache).unwrap();
    assert!(matches!(r.family("queue_size"), Some(Family::Gauge(_))));
    assert!(matches!(r.family("queue_in"), Some(Family::Counter(_))));
    assert!(matches!(r.family("queue_wait"), Some(Family::Histogram(_))));
}

#[test]
fn conflicting_shape_is_rejected() {
    let r = MetricsRegistry::new();
    r.register(Series::QueueSize).unwrap();

    let as_counter = SeriesSpec {
        kind: SeriesKind::Counter,
        ..Series::QueueSize.spec()
    };
    let err = r.register_spec(as_counter).err().unwrap();
    assert_eq!(err.code().as_str(), "SCHEMA_CONFLICT");

    let relabeled = SeriesSpec {
        labels: &["queue", "shard"],
        ..Series::QueueSize.spec()
    };
    assert!(r.register_spec(relabeled).is_err());

    // help text is not part of the shape
    let reworded = SeriesSpec {
        help: "something else",
        ..Series::QueueSize.spec()
    };
    assert!(r.register_spec(reworded).is_ok());
}

#[test]
fn wrong_arity_is_dropped() {
    let r = MetricsRegistry::new();
    let Family::Counter(c) = r.register(Series::CacheHit).unwrap() else {
        panic!("expected counter");
    };
    c.inc(&["edge"]);
    c.inc(&["edge", "b0", "extra"]);
    assert_eq!(c.get(&["edge", "b0"]), None);

    c.inc(&["edge", "b0"]);
    assert_eq!(c.get(&["edge", "b0"]), Some(1));
    assert_eq!(r.counter_value("cbytecache_hit", &["edge", "b0"]), Some(1));
}

#[test]
fn gauges_set_and_add() {
    let r = MetricsRegistry::new();
    let Family::Gauge(g) = r.register(Series::QueueSize).unwrap() else {
        panic!("expected gauge");
    };
    g.set(&["q"], 10);
    g.add(&["q"], -3);
    g.inc(&["q"]);
    g.dec(&["q"]);
    assert_eq!(g.get(&["q"]), Some(7));
    // value lookups are typed
    assert_eq!(r.counter_value("queue_size", &["q"]), None);
}

#[test]
fn histogram_buckets_are_cumulative() {
    let r = MetricsRegistry::new();
    let Family::Histogram(h) = r.register(Series::WorkerWait).unwrap() else {
        panic!("expected histogram");
    };
    for v in [0, 1, 2, 7, 5_000, 9_999] {
        h.observe(&["jobs"], v);
    }
    let snap = h.snapshot(&["jobs"]).unwrap();
    assert_eq!(snap.count, 6);
    assert_eq!(snap.sum, 15_009);
    assert_eq!(snap.buckets.len(), DURATION_BUCKETS.len());
    assert_eq!(snap.buckets[0], (1, 2));
    assert_eq!(snap.buckets[1], (2, 3));
    assert_eq!(snap.buckets[3], (10, 4));
    assert_eq!(snap.buckets.last(), Some(&(5_000, 5)));
    assert_eq!(snap.overflow(), 1);
}

#[test]
fn render_exposition_format() {
    let r = MetricsRegistry::new();
    r.register(Series::QueueIn).unwrap();
    r.register(Series::DumpFail).unwrap();
    r.register(Series::FetchDuration).unwrap();

    let Some(Family::Counter(c)) = r.family("queue_in") else {
        panic!()
    };
    c.add(&["zeta"], 2);
    c.add(&["alpha"], 5);
    let Some(Family::Counter(f)) = r.family("dlqdump_fail") else {
        panic!()
    };
    f.inc(&["orders", "bad \"json\"\n"]);
    let Some(Family::Histogram(h)) = r.family("batch_query_fetch_duration") else {
        panic!()
    };
    h.observe(&["users"], 3);

    let out = r.render();
    let expected_order = [
        "# HELP batch_query_fetch_duration Item latency.",
        "# TYPE batch_query_fetch_duration histogram",
        "batch_query_fetch_duration_bucket{query=\"users\",le=\"1\"} 0",
        "batch_query_fetch_duration_bucket{query=\"users\",le=\"5\"} 1",
        "batch_query_fetch_duration_bucket{query=\"users\",le=\"+Inf\"} 1",
        "batch_query_fetch_duration_sum{query=\"users\"} 3",
        "batch_query_fetch_duration_count{query=\"users\"} 1",
        "# TYPE dlqdump_fail counter",
        "dlqdump_fail{queue=\"orders\",reason=\"bad \\\"json\\\"\\n\"} 1",
        "# TYPE queue_in counter",
        "queue_in{queue=\"alpha\"} 5",
        "queue_in{queue=\"zeta\"} 2",
    ];
    let mut at = 0;
    for line in expected_order {
        let found = out[at..]
            .find(line)
            .unwrap_or_else(|| panic!("missing or out of order: {line}\n{out}"));
        at += found + line.len();
    }
}

#[test]
fn forget_counts_removed_cells() {
    let r = MetricsRegistry::new();
    r.register_catalog().unwrap();
    let Some(Family::Gauge(g)) = r.family("queue_size") else {
        panic!()
    };
    let Some(Family::Counter(c)) = r.family("cbytecache_miss") else {
        panic!()
    };
    g.inc(&["x"]);
    g.inc(&["y"]);
    c.inc(&["x", "b0"]);
    c.inc(&["x", "b1"]);

    assert_eq!(r.forget_all("x"), 3);
    assert_eq!(r.forget_all("x"), 0);
    assert_eq!(g.get(&["y"]), Some(1));
}

#[test]
fn forget_series_leaves_other_series_of_the_identity() {
    let r = MetricsRegistry::new();
    r.register_catalog().unwrap();
    let Some(Family::Gauge(size)) = r.family("queue_size") else {
        panic!()
    };
    let Some(Family::Gauge(idle)) = r.family("queue_workers_idle") else {
        panic!()
    };
    size.add(&["jobs"], 2);
    idle.add(&["jobs"], 1);

    assert_eq!(r.forget_series("jobs", ManagerClass::Worker.series()), 1);
    assert_eq!(idle.get(&["jobs"]), None);
    assert_eq!(size.get(&["jobs"]), Some(2));
}

#[test]
fn lower_to_only_ever_lowers() {
    let r = MetricsRegistry::new();
    let Family::Gauge(g) = r.register(Series::ArenaUsed).unwrap() else {
        panic!()
    };
    g.add(&["edge", "b0"], 4096);
    g.lower_to(&["edge", "b0"], 8192);
    assert_eq!(g.get(&["edge", "b0"]), Some(4096));
    g.lower_to(&["edge", "b0"], 1024);
    assert_eq!(g.get(&["edge", "b0"]), Some(1024));

    // a missing cell starts at zero
    g.lower_to(&["edge", "b1"], 1024);
    assert_eq!(g.get(&["edge", "b1"]), Some(0));
}

#[test]
fn cells_are_found_by_borrowed_labels() {
    let r = MetricsRegistry::new();
    let Family::Counter(c) = r.register(Series::CacheHit).unwrap() else {
        panic!()
    };
    let bucket = String::from("b0");
    for _ in 0..3 {
        c.inc(&["edge", bucket.as_str()]);
    }
    assert_eq!(c.get(&["edge", "b0"]), Some(3));
    assert_eq!(c.get(&["edge", "b1"]), None);
    // tuples differ by split point, not by concatenation
    assert_eq!(c.get(&["edgeb", "0"]), None);
    assert_eq!(c.get(&["edge"]), None);
    assert_eq!(r.render().matches("cbytecache_hit{").count(), 1);
}
