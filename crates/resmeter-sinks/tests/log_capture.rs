//! Log backend output, captured through a fmt writer.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use resmeter_core::{CacheMetrics, DumpMetrics, Sink, WorkerMetrics, WorkerStatus};
use resmeter_sinks::LogSink;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture(f: impl FnOnce()) -> String {
    let buf = Capture::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = buf.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

#[test]
fn one_line_per_call() {
    let out = capture(|| {
        let s = LogSink::new("jobs");
        s.worker_setup(2, 0, 3);
        s.worker_stop(1, true, WorkerStatus::Sleep);
    });
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2, "{out}");
    assert!(lines[0].contains("setup workers 2 active, 0 sleep and 3 idle"));
    assert!(lines[0].contains("identity=jobs"));
    assert!(lines[0].contains("class=worker"));
    assert!(lines[1].contains("worker 1 caught force stop signal (current status sleep)"));
}

#[test]
fn sub_dimension_is_a_field() {
    let out = capture(|| {
        let s = LogSink::new("edge");
        s.hit("b0", Duration::from_micros(3));
        s.flush("size", 64);
    });
    assert!(out.contains("bucket b0: cache hit in 3µs"), "{out}");
    assert!(out.contains("sub_dimension"), "{out}");
    assert!(out.contains("b0"));
    assert!(out.contains("flush 64 bytes due to reason size"));
    assert!(out.contains("class=dump"));
}

#[test]
fn forget_is_logged() {
    let out = capture(|| LogSink::new("jobs").forget());
    assert!(out.contains("identity retired"));
    assert!(out.contains("identity=jobs"));
}
