//! Pull exporter: axum router serving the registry rendering.
//!
//! - `/healthz` : liveness
//! - `<path>`   : Prometheus text format (default `/metrics`)

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::registry::MetricsRegistry;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics(State(registry): State<Arc<MetricsRegistry>>) -> Response {
    let body = registry.render();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}

pub fn build_router(registry: Arc<MetricsRegistry>, path: &str) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(path, get(metrics))
        .with_state(registry)
}
