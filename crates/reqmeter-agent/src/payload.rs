//! Wire format of the ingestion API.

use serde::Serialize;

use reqmeter_core::ExportMap;

use crate::config::AgentConfig;

#[derive(Debug, Clone, Serialize)]
pub struct Payload {
    pub agent: AgentInfo,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    pub host: String,
    pub pid: u32,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Component {
    pub name: String,
    pub guid: String,
    /// Reporting period in seconds.
    pub duration: u64,
    pub metrics: ExportMap,
}

/// Static part of every payload, resolved once at startup.
#[derive(Debug, Clone)]
pub struct PayloadTemplate {
    agent: AgentInfo,
    name: String,
    guid: String,
    duration: u64,
}

impl PayloadTemplate {
    pub fn from_config(cfg: &AgentConfig) -> Self {
        Self {
            agent: AgentInfo {
                host: cfg.resolved_host(),
                pid: std::process::id(),
                version: cfg.agent_version.clone(),
            },
            name: cfg.app_name.clone(),
            guid: cfg.guid.clone(),
            duration: cfg.reporting.interval_secs,
        }
    }

    pub fn build(&self, metrics: ExportMap) -> Payload {
        Payload {
            agent: self.agent.clone(),
            components: vec![Component {
                name: self.name.clone(),
                guid: self.guid.clone(),
                duration: self.duration,
                metrics,
            }],
        }
    }
}
