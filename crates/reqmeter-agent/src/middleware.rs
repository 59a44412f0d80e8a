//! axum adapter: one request record per request.
//!
//! The matched route pattern without its leading slash (e.g. `v1/items/:id`)
//! is the endpoint identifier; unmatched requests are counted under
//! `"other"`. The response is passed through untouched.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use reqmeter_core::RequestRecord;

use crate::reporter::Reporter;

pub async fn track_requests(
    State(reporter): State<Reporter>,
    req: Request,
    next: Next,
) -> Response {
    let record = match req.extensions().get::<MatchedPath>() {
        Some(path) => reporter.begin_request(endpoint_id(path.as_str())),
        None => RequestRecord::unrouted(),
    };

    let response = next.run(req).await;
    reporter.end_request(record, response.status().as_u16());
    response
}

/// `/v1/items/:id` -> `v1/items/:id`, `/` -> `root`.
fn endpoint_id(route: &str) -> &str {
    match route.trim_start_matches('/') {
        "" => "root",
        id => id,
    }
}
