#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use resmeter_core::{
    AllocMetrics, BufferPoolMetrics, CacheMetrics, DumpMetrics, FetchMetrics, LaborMetrics,
    ManagerClass, QueueMetrics, Sink, WorkerMetrics,
};
use resmeter_sinks::config::{self, BackendKind};
use resmeter_sinks::{MetricsRegistry, SinkSet};

const CFG: &str = r#"
version: 1
default_precision: us
sinks:
  - identity: "jobs"
    class: worker
  - identity: "jobs"
    class: queue
  - identity: "edge"
    class: cache
    precision: ns
  - identity: "debug"
    class: queue
    backend: log
  - identity: "quiet"
    class: labor
    backend: noop
"#;

fn build() -> SinkSet {
    let cfg = config::load_from_str(CFG).unwrap();
    SinkSet::build(&cfg, Arc::new(MetricsRegistry::new())).unwrap()
}

#[test]
fn configured_sinks_are_keyed_by_class_and_identity() {
    let set = build();
    assert_eq!(set.len(), 5);
    assert_eq!(
        set.get(ManagerClass::Queue, "debug").map(|s| s.kind()),
        Some(BackendKind::Log)
    );
    assert_eq!(
        set.get(ManagerClass::Labor, "quiet").map(|s| s.kind()),
        Some(BackendKind::Noop)
    );
    assert!(set.get(ManagerClass::Cache, "jobs").is_none());
}

#[test]
fn aggregate_sinks_write_to_the_shared_registry() {
    let set = build();
    let workers = set.worker("jobs");
    let queue = set.queue("jobs");

    workers.worker_setup(1, 0, 1);
    workers.worker_init(1);
    queue.queue_put();
    workers.worker_wait(1, Duration::from_micros(7));

    let r = set.registry();
    assert_eq!(r.gauge_value("queue_workers_active", &["jobs"]), Some(2));
    assert_eq!(r.gauge_value("queue_size", &["jobs"]), Some(1));
    // default precision is microseconds
    assert_eq!(r.histogram("queue_wait", &["jobs"]).unwrap().sum, 7);
}

#[test]
fn per_sink_precision_overrides_default() {
    let set = build();
    set.cache("edge").hit("b0", Duration::from_micros(2));
    let h = set.registry().histogram("cbytecache_hit_duration", &["edge", "b0"]).unwrap();
    assert_eq!(h.sum, 2_000);
}

#[test]
fn unconfigured_identities_get_the_noop_sink() {
    let set = build();
    let before = set.registry().render();

    set.queue("nobody").queue_put();
    set.alloc("nobody").alloc(10);
    set.buffer_pool("nobody").pool_release(10);
    set.dump("nobody").dump(10);
    set.fetch("nobody").fetch();
    set.labor("quiet").fire();
    assert_eq!(set.worker("nobody").identity(), "");

    assert_eq!(set.registry().render(), before);
}

const SHARED: &str = r#"
version: 1
sinks:
  - identity: "jobs"
    class: worker
  - identity: "jobs"
    class: queue
  - identity: "jobs"
    class: dump
  - identity: "jobs"
    class: cache
"#;

fn build_shared() -> SinkSet {
    let cfg = config::load_from_str(SHARED).unwrap();
    SinkSet::build(&cfg, Arc::new(MetricsRegistry::new())).unwrap()
}

#[test]
fn retire_drops_only_the_retired_sink_series() {
    let set = build();
    set.queue("jobs").queue_put();
    set.worker("jobs").worker_setup(0, 0, 1);

    assert!(set.retire(ManagerClass::Queue, "jobs"));
    assert!(!set.retire(ManagerClass::Queue, "nobody"));

    assert_eq!(set.registry().gauge_value("queue_size", &["jobs"]), None);
    assert_eq!(set.registry().gauge_value("queue_workers_idle", &["jobs"]), Some(1));
}

#[test]
fn retiring_one_class_leaves_live_managers_with_the_same_name_intact() {
    let set = build_shared();
    assert_eq!(set.get(ManagerClass::Dump, "jobs").map(|s| s.class()), Some(ManagerClass::Dump));

    set.worker("jobs").worker_setup(2, 0, 0);
    set.cache("jobs").set("b0", Duration::ZERO);
    set.dump("jobs").dump(64);
    let queue = set.queue("jobs");
    queue.queue_put();
    queue.queue_put();

    assert!(set.retire(ManagerClass::Dump, "jobs"));

    let r = set.registry();
    assert_eq!(r.gauge_value("dlqdump_pending_bytes", &["jobs"]), None);
    assert_eq!(r.counter_value("dlqdump_bytes_in", &["jobs"]), None);
    assert_eq!(r.gauge_value("queue_size", &["jobs"]), Some(2));
    assert_eq!(r.gauge_value("queue_workers_active", &["jobs"]), Some(2));
    assert_eq!(r.gauge_value("cbytecache_entries", &["jobs", "b0"]), Some(1));

    // the live queue keeps balancing against its own cell
    queue.queue_pull();
    queue.queue_pull();
    assert_eq!(r.gauge_value("queue_size", &["jobs"]), Some(0));
}
