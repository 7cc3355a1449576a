use std::sync::Arc;

use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use clusterwatch::config::{self, Config};
use clusterwatch::health::ComponentRegistry;
use clusterwatch::metrics::start_metrics_server;
use clusterwatch::monitor::ClusterMonitor;
use clusterwatch::probe::PgConnector;
use clusterwatch::store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = load_or_default_config();

    let store = Arc::new(Store::open(&config.store.path)?);
    let registry = ComponentRegistry::new(config.components.clone())?;
    let connector = Arc::new(PgConnector::new(config.monitor.query_timeout()));

    info!(
        components = registry.len(),
        interval_ms = config.monitor.check_interval_ms,
        connect_timeout_ms = config.monitor.connect_timeout_ms,
        slow_response_ms = config.monitor.slow_response_ms,
        retention_days = config.monitor.retention_days,
        "Monitor configured"
    );
    if registry.is_empty() {
        warn!("No components configured, passes will record nothing");
    }

    let monitor = ClusterMonitor::new(&config.monitor, registry, connector, store);

    if config.metrics.enabled {
        let addr = config.metrics.listen_addr.clone();
        tokio::spawn(async move {
            if let Err(e) = start_metrics_server(&addr).await {
                error!(error = %e, "Metrics server failed");
            }
        });
    }

    monitor.start(config.monitor.check_interval())?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    monitor.stop().await;

    Ok(())
}

fn load_or_default_config() -> Config {
    // Try to load from config file
    let config_paths = ["config/clusterwatch.toml", "clusterwatch.toml"];

    for path in config_paths {
        match config::load_config(path) {
            Ok(config) => {
                info!(path = path, "Loaded configuration");
                return config;
            }
            Err(e) => {
                warn!(path = path, error = %e, "Failed to load config");
            }
        }
    }

    info!("Using default configuration");
    Config::default()
}
