//! Probes against a real PostgreSQL server

use std::env;
use std::sync::Arc;
use std::time::Duration;

use clusterwatch::config::{ComponentConfig, ComponentKind, MonitorConfig};
use clusterwatch::health::{ComponentFacts, ComponentRegistry, ComponentStatus};
use clusterwatch::monitor::ClusterMonitor;
use clusterwatch::probe::PgConnector;
use clusterwatch::store::Store;

use crate::skip_if_not_enabled;

fn live_component(name: &str, kind: ComponentKind) -> ComponentConfig {
    let host = env::var("CLUSTERWATCH_TEST_PG_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("CLUSTERWATCH_TEST_PG_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5432);
    ComponentConfig::new(name, kind, host, port)
}

fn live_monitor(components: Vec<ComponentConfig>) -> ClusterMonitor {
    let config = MonitorConfig::default();
    ClusterMonitor::new(
        &config,
        ComponentRegistry::new(components).unwrap(),
        Arc::new(PgConnector::new(config.query_timeout())),
        Arc::new(Store::open_in_memory().unwrap()),
    )
}

#[tokio::test]
async fn test_live_database_check() {
    skip_if_not_enabled!();

    let monitor = live_monitor(vec![live_component("pg", ComponentKind::Database)]);
    let results = monitor.run_once().await;

    assert_eq!(results[0].status, ComponentStatus::Online, "{:?}", results[0].error_message);
    assert!(matches!(results[0].metadata, Some(ComponentFacts::Database(_))));
}

#[tokio::test]
async fn test_live_proxy_check() {
    skip_if_not_enabled!();

    // Plain PostgreSQL rejects SHOW pool_nodes; the check still passes.
    let monitor = live_monitor(vec![live_component("pool", ComponentKind::Proxy)]);
    let results = monitor.run_once().await;

    assert_eq!(results[0].status, ComponentStatus::Online, "{:?}", results[0].error_message);
}

#[tokio::test]
async fn test_live_unreachable_port() {
    skip_if_not_enabled!();

    let mut component = live_component("nowhere", ComponentKind::Database);
    component.port = 1;
    let monitor = live_monitor(vec![component]);

    let started = std::time::Instant::now();
    let results = monitor.run_once().await;
    assert_eq!(results[0].status, ComponentStatus::Offline);
    assert!(started.elapsed() < Duration::from_secs(6));
}
