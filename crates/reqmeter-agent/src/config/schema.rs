use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use reqmeter_core::error::{ReqMeterError, Result};
use reqmeter_core::{LedgerPolicy, MetricKind};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub version: u32,

    pub app_name: String,

    pub license_key: String,

    #[serde(default = "default_guid")]
    pub guid: String,

    #[serde(default = "default_agent_version")]
    pub agent_version: String,

    /// Reported host name; falls back to `$HOSTNAME`.
    #[serde(default)]
    pub host: Option<String>,

    /// Log payloads and ingestion responses.
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub reporting: ReportingSection,

    #[serde(default = "default_metrics")]
    pub metrics: Vec<MetricKind>,

    #[serde(default)]
    pub server: ServerSection,
}

impl AgentConfig {
    /// Minimal config with defaults for everything optional.
    pub fn new(app_name: impl Into<String>, license_key: impl Into<String>) -> Self {
        Self {
            version: 1,
            app_name: app_name.into(),
            license_key: license_key.into(),
            guid: default_guid(),
            agent_version: default_agent_version(),
            host: None,
            verbose: false,
            reporting: ReportingSection::default(),
            metrics: default_metrics(),
            server: ServerSection::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ReqMeterError::InvalidConfig(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        if self.app_name.trim().is_empty() {
            return Err(ReqMeterError::InvalidConfig("app_name must not be empty".into()));
        }
        if self.license_key.trim().is_empty() {
            return Err(ReqMeterError::InvalidConfig("license_key must not be empty".into()));
        }
        if self.guid.trim().is_empty() {
            return Err(ReqMeterError::InvalidConfig("guid must not be empty".into()));
        }
        if self.metrics.is_empty() {
            return Err(ReqMeterError::InvalidConfig("metrics must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for kind in &self.metrics {
            if !seen.insert(kind) {
                return Err(ReqMeterError::InvalidConfig(format!(
                    "metric {} listed twice",
                    kind.as_str()
                )));
            }
        }

        self.reporting.validate()?;

        Ok(())
    }

    /// Host reported in the agent block.
    pub fn resolved_host(&self) -> String {
        self.host
            .clone()
            .or_else(|| std::env::var("HOSTNAME").ok())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportingSection {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// When false, payloads are built and logged but never sent.
    #[serde(default = "default_true")]
    pub send_metrics: bool,

    #[serde(default = "default_true")]
    pub flush_on_shutdown: bool,

    #[serde(default = "default_max_retained_snapshots")]
    pub max_retained_snapshots: usize,
}

impl Default for ReportingSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
            send_metrics: true,
            flush_on_shutdown: true,
            max_retained_snapshots: default_max_retained_snapshots(),
        }
    }
}

impl ReportingSection {
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ReqMeterError::InvalidConfig(
                "reporting.endpoint must be an http(s) URL".into(),
            ));
        }
        if !(1..=3600).contains(&self.interval_secs) {
            return Err(ReqMeterError::InvalidConfig(
                "reporting.interval_secs must be between 1 and 3600".into(),
            ));
        }
        if !(1..=120).contains(&self.timeout_secs) {
            return Err(ReqMeterError::InvalidConfig(
                "reporting.timeout_secs must be between 1 and 120".into(),
            ));
        }
        if self.timeout_secs >= self.interval_secs {
            return Err(ReqMeterError::InvalidConfig(
                "reporting.timeout_secs must be less than interval_secs".into(),
            ));
        }
        if self.max_retained_snapshots == 0 {
            return Err(ReqMeterError::InvalidConfig(
                "reporting.max_retained_snapshots must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn ledger_policy(&self) -> LedgerPolicy {
        LedgerPolicy::new(self.max_retained_snapshots)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_guid() -> String {
    "io.reqmeter.agent".into()
}
fn default_agent_version() -> String {
    "1.0.0".into()
}
fn default_endpoint() -> String {
    "https://platform-api.newrelic.com/platform/v1/metrics".into()
}
fn default_interval_secs() -> u64 {
    60
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_true() -> bool {
    true
}
fn default_max_retained_snapshots() -> usize {
    LedgerPolicy::DEFAULT_MAX_SNAPSHOTS
}
fn default_metrics() -> Vec<MetricKind> {
    MetricKind::ALL.to_vec()
}
fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
