//! Fan-out of finished requests to the registered metrics.

use std::sync::Arc;

use crate::metric::{LedgerPolicy, Metric, MetricKind};
use crate::request::RequestRecord;

/// Ordered set of metrics, fixed at construction.
pub struct Collector {
    metrics: Vec<Arc<dyn Metric>>,
}

impl Collector {
    pub fn new(metrics: Vec<Arc<dyn Metric>>) -> Self {
        Self { metrics }
    }

    /// Request count, error rate and response time, in that order.
    pub fn standard(policy: LedgerPolicy) -> Self {
        Self::from_kinds(&MetricKind::ALL, policy)
    }

    pub fn from_kinds(kinds: &[MetricKind], policy: LedgerPolicy) -> Self {
        Self::new(kinds.iter().map(|k| k.build(policy)).collect())
    }

    /// Update every metric in registration order.
    ///
    /// A failing metric is logged and skipped; the rest still see the record.
    /// Returns how many metrics rejected it.
    pub fn record(&self, record: &RequestRecord) -> usize {
        let mut failed = 0;
        for metric in &self.metrics {
            if let Err(e) = metric.update(record) {
                failed += 1;
                tracing::warn!(
                    metric = metric.name(),
                    endpoint = record.endpoint(),
                    code = e.kind().as_str(),
                    error = %e,
                    "metric update failed"
                );
            }
        }
        failed
    }

    pub fn metrics(&self) -> &[Arc<dyn Metric>] {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
