//! Reporter handle: collector + dispatcher + lifecycle.
//!
//! The reporter is constructed explicitly and passed around (it is a cheap
//! clone). Several independent reporters can live in one process.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use reqmeter_core::error::{ReqMeterError, Result};
use reqmeter_core::{Collector, RequestRecord};

use crate::config::AgentConfig;
use crate::dispatch::{dispatcher::log_outcome, CycleOutcome, DispatchSettings, Dispatcher};
use crate::payload::PayloadTemplate;
use crate::sink::{HttpSink, MetricSink};

/// Extra time granted to the loop beyond one delivery timeout when stopping.
pub const STOP_GRACE: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct Reporter {
    inner: Arc<ReporterInner>,
}

struct ReporterInner {
    cfg: AgentConfig,
    collector: Arc<Collector>,
    dispatcher: Arc<Dispatcher>,
    cancel: Mutex<CancellationToken>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Reporter {
    /// Build a reporter delivering over HTTP to the configured endpoint.
    pub fn new(cfg: AgentConfig) -> Result<Self> {
        cfg.validate()?;
        let sink = HttpSink::from_config(&cfg)?;
        Self::with_sink(cfg, Arc::new(sink))
    }

    /// Build a reporter with a custom sink.
    pub fn with_sink(cfg: AgentConfig, sink: Arc<dyn MetricSink>) -> Result<Self> {
        cfg.validate()?;

        let collector = Arc::new(Collector::from_kinds(
            &cfg.metrics,
            cfg.reporting.ledger_policy(),
        ));
        let settings = DispatchSettings {
            interval: cfg.reporting.interval(),
            delivery_timeout: cfg.reporting.timeout(),
            send_metrics: cfg.reporting.send_metrics,
        };
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&collector),
            sink,
            PayloadTemplate::from_config(&cfg),
            settings,
        ));

        tracing::info!(
            app = %cfg.app_name,
            metrics = collector.len(),
            endpoint = %cfg.reporting.endpoint,
            "reporter created"
        );

        Ok(Self {
            inner: Arc::new(ReporterInner {
                cfg,
                collector,
                dispatcher,
                cancel: Mutex::new(CancellationToken::new()),
                task: Mutex::new(None),
            }),
        })
    }

    pub fn cfg(&self) -> &AgentConfig {
        &self.inner.cfg
    }

    pub fn collector(&self) -> Arc<Collector> {
        Arc::clone(&self.inner.collector)
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.inner.dispatcher)
    }

    /// Called when a request starts.
    pub fn begin_request(&self, endpoint: impl Into<String>) -> RequestRecord {
        RequestRecord::begin(endpoint)
    }

    /// Called when a request ends; feeds every metric.
    /// Returns the number of metrics that rejected the record.
    pub fn end_request(&self, record: RequestRecord, status_code: u16) -> usize {
        self.inner.collector.record(&record.finish(status_code))
    }

    /// Start the periodic dispatcher. Must be called inside a tokio runtime.
    pub fn start(&self) -> Result<()> {
        let mut task = self.inner.task.lock();
        if task.as_ref().is_some_and(|h| !h.is_finished()) {
            return Err(ReqMeterError::Internal("reporter already running".into()));
        }

        // fresh token so a stopped reporter can be restarted
        let cancel = CancellationToken::new();
        *self.inner.cancel.lock() = cancel.clone();

        *task = Some(Arc::clone(&self.inner.dispatcher).spawn(cancel));
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .task
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Export and deliver immediately, outside the timer.
    pub async fn flush(&self) -> CycleOutcome {
        let outcome = self.inner.dispatcher.run_guarded().await;
        log_outcome(&outcome);
        outcome
    }

    /// Stop the dispatcher, waiting for an in-flight cycle, then optionally
    /// flush what is still pending.
    pub async fn shutdown(&self) -> Result<()> {
        self.inner.cancel.lock().cancel();

        let handle = self.inner.task.lock().take();
        if let Some(mut handle) = handle {
            let bound = self.inner.dispatcher.settings().delivery_timeout + STOP_GRACE;
            match tokio::time::timeout(bound, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    return Err(ReqMeterError::Internal(format!("dispatcher task failed: {e}")));
                }
                Err(_) => {
                    tracing::warn!(?bound, "dispatcher did not stop in time, aborting");
                    handle.abort();
                    return Err(ReqMeterError::Timeout(bound));
                }
            }
        }

        if self.inner.cfg.reporting.flush_on_shutdown {
            if let CycleOutcome::Failed { error } = self.flush().await {
                return Err(error);
            }
        }
        Ok(())
    }
}
