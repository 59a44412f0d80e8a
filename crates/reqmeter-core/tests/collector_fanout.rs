//! Collector fan-out: registration order, partial failures.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use reqmeter_core::metric::{ExportMap, Metric};
use reqmeter_core::{Collector, LedgerPolicy, MetricKind, ReqMeterError, RequestRecord, Result};

#[test]
fn standard_set_is_ordered() {
    let collector = Collector::standard(LedgerPolicy::default());
    let names: Vec<&str> = collector.metrics().iter().map(|m| m.name()).collect();
    assert_eq!(names, ["request_count", "error_rate", "response_time"]);
}

#[test]
fn failing_metric_does_not_block_the_others() {
    let collector = Collector::standard(LedgerPolicy::default());

    // no status code: error rate fails, count and latency still update
    let failed = collector.record(&RequestRecord::begin("log"));
    assert_eq!(failed, 1);

    let count = collector.metrics()[0].export();
    assert_eq!(count["Component/ReqPerEndpoint/log[requests]"], 1.0);
    let latency = collector.metrics()[2].export();
    assert!(latency.contains_key("Component/ResponseTimePerEndpoint/log[ms]"));
}

#[test]
fn subset_of_kinds() {
    let collector = Collector::from_kinds(&[MetricKind::ErrorRate], LedgerPolicy::default());
    assert_eq!(collector.len(), 1);
    assert_eq!(collector.record(&RequestRecord::begin("x").finish(503)), 0);
    let values = collector.metrics()[0].export();
    assert_eq!(values["Component/ErrorRate/overall[percent]"], 1.0);
}

struct Probe {
    label: &'static str,
    seen: Arc<AtomicUsize>,
    fail: bool,
}

impl Metric for Probe {
    fn name(&self) -> &str {
        self.label
    }

    fn update(&self, _record: &RequestRecord) -> Result<()> {
        self.seen.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ReqMeterError::MissingAttribute("probe"));
        }
        Ok(())
    }

    fn export(&self) -> ExportMap {
        ExportMap::new()
    }

    fn clear(&self) {}

    fn pending_snapshots(&self) -> usize {
        0
    }
}

#[test]
fn every_metric_sees_the_record_even_after_failures() {
    let seen = Arc::new(AtomicUsize::new(0));
    let probe = |label: &'static str, fail: bool| -> Arc<dyn Metric> {
        Arc::new(Probe {
            label,
            seen: Arc::clone(&seen),
            fail,
        })
    };
    let collector = Collector::new(vec![probe("a", true), probe("b", true), probe("c", false)]);

    let failed = collector.record(&RequestRecord::begin("log").finish(200));
    assert_eq!(failed, 2);
    assert_eq!(seen.load(Ordering::SeqCst), 3);
}
