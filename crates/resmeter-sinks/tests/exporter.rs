#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use resmeter_core::{Precision, QueueMetrics};
use resmeter_sinks::{exporter, AggregateSink, MetricsRegistry};

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let res = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let ctype = res
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, ctype, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn serves_the_registry() {
    let registry = Arc::new(MetricsRegistry::new());
    let sink = AggregateSink::new(Arc::clone(&registry), "orders", Precision::NANOS).unwrap();
    sink.queue_put();
    sink.queue_put();

    let (status, ctype, body) = get(exporter::build_router(registry, "/metrics"), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(ctype.unwrap().starts_with("text/plain; version=0.0.4"));
    assert!(body.contains("# TYPE queue_size gauge"));
    assert!(body.contains("queue_size{queue=\"orders\"} 2"));
    assert!(body.contains("queue_in{queue=\"orders\"} 2"));
}

#[tokio::test]
async fn custom_path_and_health() {
    let registry = Arc::new(MetricsRegistry::new());
    let app = exporter::build_router(registry, "/stats");

    let (status, _, _) = get(app.clone(), "/stats").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = get(app.clone(), "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}
