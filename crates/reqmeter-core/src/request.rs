//! Typed request-lifecycle record.
//!
//! A record is created when a request starts (endpoint + start time) and
//! enriched with the status code when it ends. Metrics read only the fields
//! they need and report a missing one as `MissingAttribute`.

use std::time::Instant;

/// Endpoint identifier used for records that carry no endpoint.
pub const UNKNOWN_ENDPOINT: &str = "other";

#[derive(Debug, Clone, Default)]
pub struct RequestRecord {
    endpoint: Option<String>,
    start_time: Option<Instant>,
    status_code: Option<u16>,
}

impl RequestRecord {
    /// Start tracking a request now.
    pub fn begin(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            start_time: Some(Instant::now()),
            status_code: None,
        }
    }

    /// Record for a request whose endpoint could not be resolved.
    pub fn unrouted() -> Self {
        Self {
            endpoint: None,
            start_time: Some(Instant::now()),
            status_code: None,
        }
    }

    /// Attach the final status code.
    pub fn finish(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_start_time(mut self, start: Instant) -> Self {
        self.start_time = Some(start);
        self
    }

    pub fn without_start_time(mut self) -> Self {
        self.start_time = None;
        self
    }

    /// Aggregation key; `"other"` when unset.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(UNKNOWN_ENDPOINT)
    }

    pub fn start_time(&self) -> Option<Instant> {
        self.start_time
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }
}
