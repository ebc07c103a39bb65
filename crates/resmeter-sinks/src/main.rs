//! resmeter exporter
//!
//! Loads `resmeter.yaml` (or the path given as first argument), registers the
//! catalog, builds the configured sinks and serves the registry over HTTP.

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use resmeter_sinks::{config, exporter, factory::SinkSet, registry::MetricsRegistry};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "resmeter.yaml".into());
    let cfg = config::load_from_file(&path).expect("config load failed");
    let listen = cfg.exporter.socket_addr().expect("exporter.listen must be a valid SocketAddr");

    let registry = Arc::new(MetricsRegistry::new());
    let sinks = SinkSet::build(&cfg, Arc::clone(&registry)).expect("sink setup failed");
    tracing::info!(sinks = sinks.len(), "sinks ready");

    let app = exporter::build_router(registry, &cfg.exporter.path);

    tracing::info!(%listen, path = %cfg.exporter.path, "resmeter-exporter starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app).await.expect("server failed");
}
