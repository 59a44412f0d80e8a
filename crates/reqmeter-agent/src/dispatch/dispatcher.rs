use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use reqmeter_core::error::ReqMeterError;
use reqmeter_core::{Collector, ExportMap};

use crate::payload::PayloadTemplate;
use crate::sink::MetricSink;

/// Dispatcher state; `Exporting` while a cycle is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Exporting,
}

/// Result of one export cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Payload acknowledged; every exported metric was cleared.
    Delivered { metrics: usize },
    /// Payload built but sending is disabled; nothing was cleared.
    Skipped { metrics: usize },
    /// Delivery failed; ledgers are untouched and will be resent.
    Failed { error: ReqMeterError },
}

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub interval: Duration,
    pub delivery_timeout: Duration,
    pub send_metrics: bool,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            delivery_timeout: Duration::from_secs(10),
            send_metrics: true,
        }
    }
}

/// Periodically exports every metric, delivers one merged payload and clears
/// the metrics only once the sink acknowledged it.
pub struct Dispatcher {
    collector: Arc<Collector>,
    sink: Arc<dyn MetricSink>,
    template: PayloadTemplate,
    settings: DispatchSettings,
    state: Mutex<DispatchState>,
    // serializes export -> deliver -> clear between the loop and `flush`
    cycle: tokio::sync::Mutex<()>,
}

impl Dispatcher {
    pub fn new(
        collector: Arc<Collector>,
        sink: Arc<dyn MetricSink>,
        template: PayloadTemplate,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            collector,
            sink,
            template,
            settings,
            state: Mutex::new(DispatchState::Idle),
            cycle: tokio::sync::Mutex::new(()),
        }
    }

    pub fn state(&self) -> DispatchState {
        *self.state.lock()
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Run one export cycle now.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let _cycle = self.cycle.lock().await;
        let _state = StateGuard::enter(&self.state);

        let mut merged = ExportMap::new();
        for metric in self.collector.metrics() {
            merged.extend(metric.export());
        }
        let count = merged.len();
        let payload = self.template.build(merged);

        if !self.settings.send_metrics {
            tracing::debug!(metrics = count, "sending disabled, keeping metrics");
            return CycleOutcome::Skipped { metrics: count };
        }

        let limit = self.settings.delivery_timeout;
        let delivered = match timeout(limit, self.sink.deliver(&payload)).await {
            Ok(res) => res,
            Err(_) => Err(ReqMeterError::Timeout(limit)),
        };

        match delivered {
            Ok(()) => {
                for metric in self.collector.metrics() {
                    metric.clear();
                }
                CycleOutcome::Delivered { metrics: count }
            }
            Err(error) => CycleOutcome::Failed { error },
        }
    }

    /// Cycle wrapped in a fault boundary: a panic becomes `Failed`.
    pub async fn run_guarded(&self) -> CycleOutcome {
        match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                CycleOutcome::Failed {
                    error: ReqMeterError::Internal(format!("export cycle panicked: {msg}")),
                }
            }
        }
    }

    /// Spawn the periodic loop. It stops when `cancel` fires.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run_loop(cancel).await })
    }

    async fn run_loop(&self, cancel: CancellationToken) {
        let mut tick = tokio::time::interval(self.settings.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        tick.tick().await;

        tracing::info!(interval = ?self.settings.interval, "metric dispatcher started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("dispatcher cancelled");
                    break;
                }
                _ = tick.tick() => {
                    // an in-flight cycle runs to completion; delivery is bounded by its timeout
                    let outcome = self.run_guarded().await;
                    log_outcome(&outcome);
                }
            }
        }
        tracing::info!("metric dispatcher stopped");
    }
}

pub(crate) fn log_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Delivered { metrics } => {
            tracing::debug!(metrics, "metrics delivered");
        }
        CycleOutcome::Skipped { metrics } => {
            tracing::debug!(metrics, "metrics not sent");
        }
        CycleOutcome::Failed { error } => {
            tracing::warn!(
                code = error.kind().as_str(),
                error = %error,
                "metric delivery failed, will resend"
            );
        }
    }
}

/// Holds `Exporting` for the lifetime of a cycle, including unwinds.
struct StateGuard<'a> {
    state: &'a Mutex<DispatchState>,
}

impl<'a> StateGuard<'a> {
    fn enter(state: &'a Mutex<DispatchState>) -> Self {
        *state.lock() = DispatchState::Exporting;
        Self { state }
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock() = DispatchState::Idle;
    }
}
