use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::health::AverageMode;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Scheduler, probe and event thresholds
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Persistent store location
    #[serde(default)]
    pub store: StoreConfig,
    /// Prometheus scrape endpoint
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Component registry (defaults to the pgpool + primary/replica topology)
    #[serde(default = "default_components")]
    pub components: Vec<ComponentConfig>,
}

// ============================================================================
// Monitor Configuration
// ============================================================================

/// Thresholds and timing for the monitoring pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Interval between passes (milliseconds), also the downtime penalty per failed check
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    /// Timeout for establishing a probe connection (milliseconds)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Timeout for each diagnostic query (milliseconds)
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    /// Online checks slower than this raise a slow_response event (milliseconds)
    #[serde(default = "default_slow_response_ms")]
    pub slow_response_ms: u64,
    /// Check and event rows older than this are purged
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// How long `stop()` waits for an in-flight pass (milliseconds)
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
    /// Maximum number of events returned with the cluster status
    #[serde(default = "default_recent_events_limit")]
    pub recent_events_limit: usize,
    /// How the daily average response time is folded
    #[serde(default)]
    pub average_mode: AverageMode,
}

fn default_check_interval_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_query_timeout_ms() -> u64 {
    10_000
}

fn default_slow_response_ms() -> u64 {
    1_000
}

fn default_retention_days() -> u32 {
    30
}

fn default_stop_timeout_ms() -> u64 {
    5_000
}

fn default_recent_events_limit() -> usize {
    10
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: default_check_interval_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            query_timeout_ms: default_query_timeout_ms(),
            slow_response_ms: default_slow_response_ms(),
            retention_days: default_retention_days(),
            stop_timeout_ms: default_stop_timeout_ms(),
            recent_events_limit: default_recent_events_limit(),
            average_mode: AverageMode::default(),
        }
    }
}

impl MonitorConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

// ============================================================================
// Store / Metrics Configuration
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_path() -> String {
    "cluster_status.db".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_addr")]
    pub listen_addr: String,
}

fn default_metrics_addr() -> String {
    "127.0.0.1:9187".to_string()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: default_metrics_addr(),
        }
    }
}

// ============================================================================
// Component Registry
// ============================================================================

/// Kind of a monitored component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    /// Connection-pool proxy (pgpool)
    #[serde(alias = "pgpool")]
    Proxy,
    /// Database engine node, primary or replica
    #[serde(alias = "postgres")]
    Database,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Proxy => "proxy",
            ComponentKind::Database => "database",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "proxy" => Some(ComponentKind::Proxy),
            "database" => Some(ComponentKind::Database),
            _ => None,
        }
    }
}

/// One monitored endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentConfig {
    /// Unique component name
    pub name: String,
    pub kind: ComponentKind,
    /// Hostname or IP
    pub host: String,
    pub port: u16,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_password")]
    pub password: String,
    /// Target database
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_user() -> String {
    std::env::var("PGPOOL_USER").unwrap_or_else(|_| "appuser".to_string())
}

fn default_password() -> String {
    std::env::var("PGPOOL_PASSWORD").unwrap_or_default()
}

fn default_database() -> String {
    std::env::var("PGPOOL_DB").unwrap_or_else(|_| "appdb".to_string())
}

impl ComponentConfig {
    pub fn new(name: impl Into<String>, kind: ComponentKind, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            kind,
            host: host.into(),
            port,
            user: default_user(),
            password: default_password(),
            database: default_database(),
        }
    }

    /// Get the address string (host:port)
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// pgpool in front of a primary/replica pair
fn default_components() -> Vec<ComponentConfig> {
    vec![
        ComponentConfig::new("pg-master", ComponentKind::Database, "pg-master", 6435),
        ComponentConfig::new("pg-replica", ComponentKind::Database, "pg-replica", 6435),
        ComponentConfig::new("pgpool", ComponentKind::Proxy, "pgpool", 5432),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            store: StoreConfig::default(),
            metrics: MetricsConfig::default(),
            components: default_components(),
        }
    }
}
