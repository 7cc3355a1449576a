//! Check result definitions
//!
//! A [`CheckResult`] is one immutable observation of a component. Its
//! constructors keep `error_message` present exactly when the status is
//! not [`ComponentStatus::Online`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ComponentKind;

/// Observed status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Reachable and answered every check-fatal query
    Online,
    /// Connection could not be established
    Offline,
    /// Connected, but a query failed or returned an unexpected shape
    Error,
    /// Never observed
    #[default]
    Unknown,
}

impl ComponentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentStatus::Online => "online",
            ComponentStatus::Offline => "offline",
            ComponentStatus::Error => "error",
            ComponentStatus::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "online" => Some(ComponentStatus::Online),
            "offline" => Some(ComponentStatus::Offline),
            "error" => Some(ComponentStatus::Error),
            "unknown" => Some(ComponentStatus::Unknown),
            _ => None,
        }
    }
}

/// Kind-specific facts gathered by a successful check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ComponentFacts {
    Database(DatabaseFacts),
    Proxy(ProxyFacts),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseFacts {
    pub version: String,
    pub is_in_recovery: bool,
    pub database: String,
    pub user: String,
    /// Bytes
    pub database_size: i64,
    pub active_connections: i64,
    pub total_connections: i64,
    pub replication: Replication,
}

/// Replication summary, depending on the detected role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Replication {
    Primary {
        replicas: u64,
    },
    /// Write-position markers are kept as reported, for display only
    Replica {
        receive_lsn: Option<String>,
        replay_lsn: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyFacts {
    pub version: String,
    pub database: String,
    /// Number of backend nodes the proxy reports
    pub pool_nodes: usize,
    pub active_connections: i64,
    pub nodes_info: Vec<PoolNode>,
}

/// One backend node as listed by the proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolNode {
    pub node_id: String,
    pub hostname: Option<String>,
    pub port: Option<String>,
    pub status: String,
    pub role: Option<String>,
}

/// One observation of one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub component_name: String,
    pub kind: ComponentKind,
    pub status: ComponentStatus,
    /// Wall-clock latency of the probe
    pub response_time_ms: u64,
    pub error_message: Option<String>,
    pub metadata: Option<ComponentFacts>,
    pub observed_at: DateTime<Utc>,
}

impl CheckResult {
    pub fn online(
        component_name: impl Into<String>,
        kind: ComponentKind,
        response_time_ms: u64,
        metadata: ComponentFacts,
    ) -> Self {
        Self {
            component_name: component_name.into(),
            kind,
            status: ComponentStatus::Online,
            response_time_ms,
            error_message: None,
            metadata: Some(metadata),
            observed_at: Utc::now(),
        }
    }

    pub fn offline(
        component_name: impl Into<String>,
        kind: ComponentKind,
        response_time_ms: u64,
        error_message: impl Into<String>,
    ) -> Self {
        Self::failed(component_name, kind, ComponentStatus::Offline, response_time_ms, error_message)
    }

    pub fn error(
        component_name: impl Into<String>,
        kind: ComponentKind,
        response_time_ms: u64,
        error_message: impl Into<String>,
    ) -> Self {
        Self::failed(component_name, kind, ComponentStatus::Error, response_time_ms, error_message)
    }

    fn failed(
        component_name: impl Into<String>,
        kind: ComponentKind,
        status: ComponentStatus,
        response_time_ms: u64,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            component_name: component_name.into(),
            kind,
            status,
            response_time_ms,
            error_message: Some(error_message.into()),
            metadata: None,
            observed_at: Utc::now(),
        }
    }

    /// Override the observation time
    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = at;
        self
    }

    pub fn is_online(&self) -> bool {
        self.status == ComponentStatus::Online
    }
}
