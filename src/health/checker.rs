//! Component checker
//!
//! Turns one registry entry into one [`CheckResult`]. Probe failures never
//! escape: connection failures become `offline`, everything else `error`.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::{ComponentConfig, ComponentKind};
use crate::metrics::metrics;
use crate::probe::{ConnectParams, ProbeConnector, ProbeError};

use super::state::{CheckResult, ComponentFacts};
use super::{database, proxy};

/// Runs probes through a [`ProbeConnector`]
pub struct Checker {
    connector: Arc<dyn ProbeConnector>,
    connect_timeout: Duration,
}

impl Checker {
    pub fn new(connector: Arc<dyn ProbeConnector>, connect_timeout: Duration) -> Self {
        Self {
            connector,
            connect_timeout,
        }
    }

    /// Check one component
    ///
    /// `response_time_ms` covers the whole probe, up to success or failure.
    pub async fn check(&self, config: &ComponentConfig) -> CheckResult {
        let started = Instant::now();
        let outcome = self.probe(config).await;
        let elapsed = started.elapsed();
        let response_time_ms = elapsed.as_millis() as u64;

        let result = match outcome {
            Ok(facts) => {
                debug!(
                    component = %config.name,
                    response_time_ms = response_time_ms,
                    "Check passed"
                );
                CheckResult::online(&config.name, config.kind, response_time_ms, facts)
            }
            Err(CheckError::Probe(ProbeError::Connect(message))) => {
                warn!(component = %config.name, error = %message, "Component unreachable");
                CheckResult::offline(&config.name, config.kind, response_time_ms, message)
            }
            Err(e) => {
                warn!(component = %config.name, error = %e, "Component check failed");
                CheckResult::error(&config.name, config.kind, response_time_ms, e.to_string())
            }
        };

        metrics().record_check(&config.name, result.status.as_str(), elapsed.as_secs_f64());
        result
    }

    async fn probe(&self, config: &ComponentConfig) -> Result<ComponentFacts, CheckError> {
        let params = ConnectParams::from(config);

        let mut conn = tokio::time::timeout(
            self.connect_timeout,
            self.connector.connect(&params, self.connect_timeout),
        )
        .await
        .map_err(|_| {
            ProbeError::Connect(format!(
                "timeout expired after {}ms",
                self.connect_timeout.as_millis()
            ))
        })??;

        match config.kind {
            ComponentKind::Database => database::inspect(conn.as_mut()).await,
            ComponentKind::Proxy => proxy::inspect(conn.as_mut()).await,
        }
    }
}

/// Error during a component check
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Probe(#[from] ProbeError),
    /// Query succeeded but the answer did not have the expected shape
    #[error("{0}")]
    Malformed(String),
}
