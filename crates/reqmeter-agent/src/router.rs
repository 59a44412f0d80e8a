//! Axum router wiring.
//!
//! `instrument` wraps any router with request tracking; `build_router` is the
//! demo service run by the binary.

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    routing::get,
    Router,
};

use crate::{middleware::track_requests, ops, reporter::Reporter};

/// Track every request handled by `router`.
pub fn instrument<S>(router: Router<S>, reporter: Reporter) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(reporter, track_requests))
}

pub fn build_router(reporter: Reporter) -> Router {
    let app = Router::new()
        .route("/v1/echo/:msg", get(echo))
        .route("/v1/fail", get(fail))
        .route("/healthz", get(ops::healthz))
        .route("/status", get(ops::status))
        .fallback(not_found)
        .with_state(reporter.clone());
    instrument(app, reporter)
}

async fn echo(Path(msg): Path<String>) -> String {
    msg
}

async fn fail() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "failure on purpose")
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "not found")
}
