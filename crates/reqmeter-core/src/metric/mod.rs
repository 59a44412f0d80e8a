//! Metric capability and the built-in metric kinds.
//!
//! Every metric implements [`Metric`]: `update` on each finished request,
//! `export` on each reporting cycle, `clear` once the exported values were
//! delivered. Exports are cumulative until cleared.

pub mod kinds;
pub mod ledger;
pub mod tally;
pub mod tracked;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::Result;
use crate::request::RequestRecord;

pub use kinds::{ErrorRate, ErrorTally, LatencyTally, RequestCount, RequestTally, ResponseTime};
pub use ledger::{Ledger, LedgerPolicy, Merge};
pub use tally::{EndpointTable, Tally};
pub use tracked::TallyMetric;

/// Metric name -> reported value. Rebuilt on every export.
pub type ExportMap = BTreeMap<String, f64>;

/// Capability shared by all metrics.
pub trait Metric: Send + Sync {
    /// Stable identifier used in logs.
    fn name(&self) -> &str;

    /// Account for one finished request.
    fn update(&self, record: &RequestRecord) -> Result<()>;

    /// Rotate live state into the ledger and report everything retained.
    fn export(&self) -> ExportMap;

    /// Drop retained snapshots after a confirmed delivery.
    fn clear(&self);

    /// Number of snapshots waiting for acknowledgment.
    fn pending_snapshots(&self) -> usize;
}

/// Naming triple: `<prefix><endpoint><unit>` and `<overall_prefix><unit>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricNames {
    pub prefix: String,
    pub overall_prefix: String,
    pub unit: String,
}

impl MetricNames {
    pub fn new(
        prefix: impl Into<String>,
        overall_prefix: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            overall_prefix: overall_prefix.into(),
            unit: unit.into(),
        }
    }

    pub fn endpoint_key(&self, endpoint: &str) -> String {
        format!("{}{}{}", self.prefix, endpoint, self.unit)
    }

    pub fn overall_key(&self) -> String {
        format!("{}{}", self.overall_prefix, self.unit)
    }
}

/// The closed set of built-in metric kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    RequestCount,
    ErrorRate,
    ResponseTime,
}

impl MetricKind {
    /// Registration order of the standard set.
    pub const ALL: [MetricKind; 3] = [
        MetricKind::RequestCount,
        MetricKind::ErrorRate,
        MetricKind::ResponseTime,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::RequestCount => "request_count",
            MetricKind::ErrorRate => "error_rate",
            MetricKind::ResponseTime => "response_time",
        }
    }

    /// Default naming triple for the kind.
    pub fn names(self) -> MetricNames {
        match self {
            MetricKind::RequestCount => MetricNames::new(
                "Component/ReqPerEndpoint/",
                "Component/Req/overall",
                "[requests]",
            ),
            MetricKind::ErrorRate => MetricNames::new(
                "Component/ErrorRatePerEndpoint/",
                "Component/ErrorRate/overall",
                "[percent]",
            ),
            MetricKind::ResponseTime => MetricNames::new(
                "Component/ResponseTimePerEndpoint/",
                "Component/ResponseTime/overall",
                "[ms]",
            ),
        }
    }

    pub fn build(self, policy: LedgerPolicy) -> Arc<dyn Metric> {
        match self {
            MetricKind::RequestCount => Arc::new(RequestCount::standard(policy)),
            MetricKind::ErrorRate => Arc::new(ErrorRate::standard(policy)),
            MetricKind::ResponseTime => Arc::new(ResponseTime::standard(policy)),
        }
    }
}
