//! Log backend: one `tracing` event per sink call.
//!
//! Debug only. Every observation costs a formatted log line, so do not wire
//! this into a hot manager in production.

use resmeter_core::accounting::Accounted;
use resmeter_core::event::Event;
use resmeter_core::sink::{EventSink, Sink};

#[derive(Debug, Clone)]
pub struct LogSink {
    identity: String,
}

impl LogSink {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
        }
    }
}

impl Sink for LogSink {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn forget(&self) {
        tracing::info!(identity = %self.identity, "identity retired");
    }
}

impl EventSink for LogSink {
    fn record(&self, event: &Event<'_>) {
        match event.sub_dimension() {
            Some(sub) => tracing::info!(
                identity = %self.identity,
                class = %event.class(),
                sub_dimension = sub,
                params = ?event,
                "{event}"
            ),
            None => tracing::info!(
                identity = %self.identity,
                class = %event.class(),
                params = ?event,
                "{event}"
            ),
        }
    }
}
