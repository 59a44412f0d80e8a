//! Delivery of payloads to the ingestion endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use reqmeter_core::error::{ReqMeterError, Result};

use crate::config::AgentConfig;
use crate::payload::Payload;

/// Destination for metric payloads. `Ok` means the payload was acknowledged
/// and the exported metrics may be cleared.
#[async_trait]
pub trait MetricSink: Send + Sync {
    async fn deliver(&self, payload: &Payload) -> Result<()>;
}

/// POSTs JSON payloads to the ingestion API.
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
    license_key: String,
    verbose: bool,
}

impl HttpSink {
    pub fn new(
        endpoint: impl Into<String>,
        license_key: impl Into<String>,
        timeout: Duration,
        verbose: bool,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReqMeterError::Transport(format!("http client build failed: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            license_key: license_key.into(),
            verbose,
        })
    }

    pub fn from_config(cfg: &AgentConfig) -> Result<Self> {
        Self::new(
            cfg.reporting.endpoint.clone(),
            cfg.license_key.clone(),
            cfg.reporting.timeout(),
            cfg.verbose,
        )
    }
}

#[async_trait]
impl MetricSink for HttpSink {
    async fn deliver(&self, payload: &Payload) -> Result<()> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| ReqMeterError::Serialization(e.to_string()))?;

        if self.verbose {
            let pretty = serde_json::to_string_pretty(payload).unwrap_or_default();
            tracing::info!(endpoint = %self.endpoint, payload = %pretty, "sending metrics");
        }

        let resp = self
            .client
            .post(&self.endpoint)
            .header("X-License-Key", &self.license_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ReqMeterError::Transport(e.to_string()))?;

        let status = resp.status();
        if self.verbose {
            match resp.text().await {
                Ok(text) => {
                    tracing::info!(status = status.as_u16(), response = %text, "ingestion response")
                }
                Err(e) => tracing::warn!(error = %e, "reading ingestion response failed"),
            }
        }

        if status != StatusCode::OK {
            return Err(ReqMeterError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
