//! Integration test entry point
//!
//! Most tests drive a full monitor against an in-memory store and a scripted
//! in-process probe connector. The `live` tests need a real PostgreSQL:
//!
//! Run with: CLUSTERWATCH_RUN_INTEGRATION_TESTS=1 cargo test --test integration
//!
//! Environment variables:
//! - CLUSTERWATCH_RUN_INTEGRATION_TESTS: Set to "1" to enable live tests
//! - CLUSTERWATCH_TEST_PG_HOST: PostgreSQL host (default: 127.0.0.1)
//! - CLUSTERWATCH_TEST_PG_PORT: PostgreSQL port (default: 5432)
//! - PGPOOL_USER / PGPOOL_PASSWORD / PGPOOL_DB: credentials

mod live;
mod pipeline;
mod scheduler;

use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clusterwatch::config::{ComponentConfig, ComponentKind, MonitorConfig};
use clusterwatch::health::ComponentRegistry;
use clusterwatch::monitor::ClusterMonitor;
use clusterwatch::probe::{ConnectParams, ProbeConnection, ProbeConnector, ProbeError, Row};
use clusterwatch::store::Store;

/// Check if live integration tests should run
pub fn should_run_integration_tests() -> bool {
    env::var("CLUSTERWATCH_RUN_INTEGRATION_TESTS")
        .map(|v| v == "1")
        .unwrap_or(false)
}

/// Skip test if live integration tests are not enabled
#[macro_export]
macro_rules! skip_if_not_enabled {
    () => {
        if !crate::should_run_integration_tests() {
            eprintln!("Skipping integration test (set CLUSTERWATCH_RUN_INTEGRATION_TESTS=1 to run)");
            return;
        }
    };
}

/// How a scripted endpoint behaves, keyed by host
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Connects after `latency` and answers every query
    Online { latency: Duration },
    /// Refuses the connection
    Unreachable,
    /// Connects, then fails every query
    Broken,
}

pub struct ScriptedConnector {
    behaviors: HashMap<String, Behavior>,
}

impl ScriptedConnector {
    pub fn new<'a>(behaviors: impl IntoIterator<Item = (&'a str, Behavior)>) -> Self {
        Self {
            behaviors: behaviors
                .into_iter()
                .map(|(host, behavior)| (host.to_string(), behavior))
                .collect(),
        }
    }
}

#[async_trait]
impl ProbeConnector for ScriptedConnector {
    async fn connect(
        &self,
        params: &ConnectParams,
        _timeout: Duration,
    ) -> Result<Box<dyn ProbeConnection>, ProbeError> {
        match self.behaviors.get(&params.host).copied() {
            Some(Behavior::Online { latency }) => {
                tokio::time::sleep(latency).await;
                Ok(Box::new(ScriptedConnection { broken: false }))
            }
            Some(Behavior::Broken) => Ok(Box::new(ScriptedConnection { broken: true })),
            Some(Behavior::Unreachable) | None => Err(ProbeError::Connect(format!(
                "connection to server at \"{}\", port {} failed: Connection refused",
                params.host, params.port
            ))),
        }
    }
}

/// Answers like a pgpool proxy
struct ScriptedConnection {
    broken: bool,
}

#[async_trait]
impl ProbeConnection for ScriptedConnection {
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>, ProbeError> {
        if self.broken {
            return Err(ProbeError::Query("server closed the connection unexpectedly".into()));
        }
        if sql.starts_with("SELECT version()") {
            Ok(vec![Row::from_values([Some("PostgreSQL 16.2"), Some("appdb")])])
        } else if sql == "SHOW pool_nodes" {
            Ok(Vec::new())
        } else {
            Ok(vec![Row::from_values([Some("3")])])
        }
    }
}

/// A proxy component whose host doubles as its scripted behavior key
pub fn proxy(name: &str) -> ComponentConfig {
    ComponentConfig::new(name, ComponentKind::Proxy, name, 5432)
}

/// Build a monitor over an in-memory store
pub fn monitor(config: &MonitorConfig, scripted: &[(&str, Behavior)]) -> (ClusterMonitor, Arc<Store>) {
    let store = Arc::new(Store::open_in_memory().expect("in-memory store"));
    (monitor_on(store.clone(), config, scripted), store)
}

/// Build a monitor over a caller-provided store
pub fn monitor_on(store: Arc<Store>, config: &MonitorConfig, scripted: &[(&str, Behavior)]) -> ClusterMonitor {
    let registry = ComponentRegistry::new(scripted.iter().map(|(name, _)| proxy(name)).collect())
        .expect("unique component names");
    let connector = Arc::new(ScriptedConnector::new(scripted.iter().copied()));
    ClusterMonitor::new(config, registry, connector, store)
}

pub fn online(ms: u64) -> Behavior {
    Behavior::Online {
        latency: Duration::from_millis(ms),
    }
}
