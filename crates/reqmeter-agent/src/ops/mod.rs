//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/status`  : dispatcher state and unacknowledged snapshots per metric

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Map, Value};

use crate::dispatch::DispatchState;
use crate::reporter::Reporter;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn status(State(reporter): State<Reporter>) -> impl IntoResponse {
    let mut pending = Map::new();
    for metric in reporter.collector().metrics() {
        pending.insert(metric.name().to_string(), Value::from(metric.pending_snapshots()));
    }
    let state = match reporter.dispatcher().state() {
        DispatchState::Idle => "idle",
        DispatchState::Exporting => "exporting",
    };

    Json(json!({
        "running": reporter.is_running(),
        "dispatcher": state,
        "pending_snapshots": pending,
    }))
}
