//! Built-in tallies: request count, error rate, response time.

use crate::error::{ReqMeterError, Result};
use crate::metric::ledger::LedgerPolicy;
use crate::metric::tally::Tally;
use crate::metric::tracked::TallyMetric;
use crate::metric::MetricKind;
use crate::request::RequestRecord;

/// Status codes at or above this count as errors.
pub const ERROR_STATUS_THRESHOLD: u16 = 400;

/// Requests per endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestTally {
    pub count: u64,
}

impl Tally for RequestTally {
    fn sample(_record: &RequestRecord) -> Result<Self> {
        Ok(Self { count: 1 })
    }

    fn absorb(&mut self, other: &Self) {
        self.count += other.count;
    }

    fn value(&self) -> f64 {
        self.count as f64
    }
}

/// Requests and failed requests per endpoint. `errors <= requests` always.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorTally {
    pub requests: u64,
    pub errors: u64,
}

impl Tally for ErrorTally {
    fn sample(record: &RequestRecord) -> Result<Self> {
        let status = record
            .status_code()
            .ok_or(ReqMeterError::MissingAttribute("status_code"))?;
        Ok(Self {
            requests: 1,
            errors: u64::from(status >= ERROR_STATUS_THRESHOLD),
        })
    }

    fn absorb(&mut self, other: &Self) {
        self.requests += other.requests;
        self.errors += other.errors;
    }

    fn value(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        self.errors as f64 / self.requests as f64
    }
}

/// Requests and summed latency (ms) per endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencyTally {
    pub requests: u64,
    pub latency_sum_ms: f64,
}

impl Tally for LatencyTally {
    fn sample(record: &RequestRecord) -> Result<Self> {
        let start = record
            .start_time()
            .ok_or(ReqMeterError::MissingAttribute("start_time"))?;
        Ok(Self {
            requests: 1,
            latency_sum_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }

    fn absorb(&mut self, other: &Self) {
        self.requests += other.requests;
        self.latency_sum_ms += other.latency_sum_ms;
    }

    fn value(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        self.latency_sum_ms / self.requests as f64
    }
}

pub type RequestCount = TallyMetric<RequestTally>;
pub type ErrorRate = TallyMetric<ErrorTally>;
pub type ResponseTime = TallyMetric<LatencyTally>;

impl TallyMetric<RequestTally> {
    pub fn standard(policy: LedgerPolicy) -> Self {
        let kind = MetricKind::RequestCount;
        Self::with_names(kind.as_str(), kind.names(), policy)
    }
}

impl TallyMetric<ErrorTally> {
    pub fn standard(policy: LedgerPolicy) -> Self {
        let kind = MetricKind::ErrorRate;
        Self::with_names(kind.as_str(), kind.names(), policy)
    }
}

impl TallyMetric<LatencyTally> {
    pub fn standard(policy: LedgerPolicy) -> Self {
        let kind = MetricKind::ResponseTime;
        Self::with_names(kind.as_str(), kind.names(), policy)
    }
}
