//! Delivery against a mocked ingestion API.
//!
//! - success clears every metric
//! - non-200 keeps the ledgers and the next cycle resends cumulative totals
//! - slow or unreachable endpoints count as failures
//! - disabled sending never touches the network

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use serde_json::Value;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reqmeter_agent::config::AgentConfig;
use reqmeter_agent::dispatch::CycleOutcome;
use reqmeter_agent::Reporter;
use reqmeter_core::{ErrorKind, ReqMeterError};

const INGEST_PATH: &str = "/platform/v1/metrics";
const LOG_REQUESTS: &str = "Component/ReqPerEndpoint/log[requests]";

fn config_for(server_uri: &str) -> AgentConfig {
    let mut cfg = AgentConfig::new("shop", "secret-license");
    cfg.host = Some("web-1".into());
    cfg.reporting.endpoint = format!("{server_uri}{INGEST_PATH}");
    cfg
}

fn hit(reporter: &Reporter, endpoint: &str, status: u16) {
    let rec = reporter.begin_request(endpoint);
    assert_eq!(reporter.end_request(rec, status), 0);
}

fn pending(reporter: &Reporter) -> usize {
    reporter
        .collector()
        .metrics()
        .iter()
        .map(|m| m.pending_snapshots())
        .sum()
}

async fn bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.body_json::<Value>().unwrap())
        .collect()
}

#[tokio::test]
async fn delivered_payload_has_expected_shape_and_clears() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INGEST_PATH))
        .and(header("X-License-Key", "secret-license"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"status\":\"ok\"}"))
        .expect(1)
        .mount(&server)
        .await;

    let reporter = Reporter::new(config_for(&server.uri())).unwrap();
    hit(&reporter, "log", 200);
    hit(&reporter, "log", 500);

    let outcome = reporter.flush().await;
    assert!(matches!(outcome, CycleOutcome::Delivered { .. }), "{outcome:?}");
    assert_eq!(pending(&reporter), 0);

    let body = &bodies(&server).await[0];
    assert_eq!(body["agent"]["host"], "web-1");
    assert_eq!(body["agent"]["pid"], std::process::id());
    assert_eq!(body["agent"]["version"], "1.0.0");

    let component = &body["components"][0];
    assert_eq!(component["name"], "shop");
    assert_eq!(component["guid"], "io.reqmeter.agent");
    assert_eq!(component["duration"], 60);

    let metrics = &component["metrics"];
    assert_eq!(metrics[LOG_REQUESTS], 2.0);
    assert_eq!(metrics["Component/ErrorRatePerEndpoint/log[percent]"], 0.5);
    assert!(metrics.get("Component/ResponseTime/overall[ms]").is_some());
}

#[tokio::test]
async fn rejected_payload_is_resent_with_new_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let reporter = Reporter::new(config_for(&server.uri())).unwrap();
    hit(&reporter, "log", 200);
    hit(&reporter, "log", 200);

    match reporter.flush().await {
        CycleOutcome::Failed {
            error: ReqMeterError::Rejected { status },
        } => assert_eq!(status, 503),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(pending(&reporter), 3);

    hit(&reporter, "log", 200);
    let outcome = reporter.flush().await;
    assert!(matches!(outcome, CycleOutcome::Delivered { .. }), "{outcome:?}");

    let sent = bodies(&server).await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["components"][0]["metrics"][LOG_REQUESTS], 2.0);
    assert_eq!(sent[1]["components"][0]["metrics"][LOG_REQUESTS], 3.0);
    assert_eq!(pending(&reporter), 0);
}

#[tokio::test]
async fn created_status_is_not_an_acknowledgment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let reporter = Reporter::new(config_for(&server.uri())).unwrap();
    hit(&reporter, "log", 200);

    let outcome = reporter.flush().await;
    assert!(matches!(outcome, CycleOutcome::Failed { .. }), "{outcome:?}");
    assert!(pending(&reporter) > 0);
}

#[tokio::test]
async fn slow_endpoint_times_out_and_keeps_metrics() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut cfg = config_for(&server.uri());
    cfg.reporting.timeout_secs = 1;
    let reporter = Reporter::new(cfg).unwrap();
    hit(&reporter, "log", 200);

    match reporter.flush().await {
        CycleOutcome::Failed { error } => assert_eq!(error.kind(), ErrorKind::DeliveryFailed),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(pending(&reporter) > 0);
}

#[tokio::test]
async fn unreachable_endpoint_is_a_delivery_failure() {
    let mut cfg = AgentConfig::new("shop", "secret-license");
    cfg.reporting.endpoint = "http://127.0.0.1:9/metrics".into();
    cfg.reporting.timeout_secs = 2;
    let reporter = Reporter::new(cfg).unwrap();
    hit(&reporter, "log", 200);

    match reporter.flush().await {
        CycleOutcome::Failed { error } => assert_eq!(error.kind(), ErrorKind::DeliveryFailed),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn disabled_sending_builds_but_never_posts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut cfg = config_for(&server.uri());
    cfg.reporting.send_metrics = false;
    let reporter = Reporter::new(cfg).unwrap();
    hit(&reporter, "log", 200);

    let outcome = reporter.flush().await;
    assert!(matches!(outcome, CycleOutcome::Skipped { .. }), "{outcome:?}");
    assert!(pending(&reporter) > 0);
}
