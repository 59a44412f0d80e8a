#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use reqmeter_agent::config::AgentConfig;
use reqmeter_agent::payload::Payload;
use reqmeter_agent::sink::MetricSink;
use reqmeter_agent::{router, Reporter};
use reqmeter_core::error::Result;

struct NullSink;

#[async_trait]
impl MetricSink for NullSink {
    async fn deliver(&self, _payload: &Payload) -> Result<()> {
        Ok(())
    }
}

async fn get(app: &axum::Router, uri: &str) -> StatusCode {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.clone().oneshot(req).await.unwrap().status()
}

#[tokio::test]
async fn requests_are_tracked_by_route_pattern() {
    let reporter =
        Reporter::with_sink(AgentConfig::new("demo", "key"), Arc::new(NullSink)).unwrap();
    let app = router::build_router(reporter.clone());

    assert_eq!(get(&app, "/v1/echo/hello").await, StatusCode::OK);
    assert_eq!(get(&app, "/v1/echo/world").await, StatusCode::OK);
    assert_eq!(get(&app, "/v1/fail").await, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(get(&app, "/does-not-exist").await, StatusCode::NOT_FOUND);

    let collector = reporter.collector();
    let counts = collector.metrics()[0].export();
    assert_eq!(counts["Component/ReqPerEndpoint/v1/echo/:msg[requests]"], 2.0);
    assert_eq!(counts["Component/ReqPerEndpoint/v1/fail[requests]"], 1.0);
    assert_eq!(counts["Component/ReqPerEndpoint/other[requests]"], 1.0);
    assert_eq!(counts["Component/Req/overall[requests]"], 4.0);

    let errors = collector.metrics()[1].export();
    assert_eq!(errors["Component/ErrorRatePerEndpoint/v1/echo/:msg[percent]"], 0.0);
    assert_eq!(errors["Component/ErrorRatePerEndpoint/v1/fail[percent]"], 1.0);
    assert_eq!(errors["Component/ErrorRate/overall[percent]"], 0.5);
}

#[tokio::test]
async fn status_endpoint_reports_pending_snapshots() {
    let reporter =
        Reporter::with_sink(AgentConfig::new("demo", "key"), Arc::new(NullSink)).unwrap();
    let app = router::build_router(reporter.clone());

    assert_eq!(get(&app, "/healthz").await, StatusCode::OK);
    for m in reporter.collector().metrics() {
        let _ = m.export();
    }

    let req = Request::builder().uri("/status").body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["dispatcher"], "idle");
    assert_eq!(body["running"], false);
    assert_eq!(body["pending_snapshots"]["request_count"], 1);
}
