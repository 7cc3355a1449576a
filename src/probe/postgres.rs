use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::debug;

use super::{ConnectParams, ProbeConnection, ProbeConnector, ProbeError, Row};

/// PostgreSQL wire-protocol probe connector
///
/// Works against both PostgreSQL and pgpool, which speaks the same protocol.
#[derive(Debug, Clone)]
pub struct PgConnector {
    query_timeout: Duration,
}

impl PgConnector {
    pub fn new(query_timeout: Duration) -> Self {
        Self { query_timeout }
    }
}

#[async_trait]
impl ProbeConnector for PgConnector {
    async fn connect(
        &self,
        params: &ConnectParams,
        timeout: Duration,
    ) -> Result<Box<dyn ProbeConnection>, ProbeError> {
        let addr = format!("{}:{}", params.host, params.port);
        debug!(addr = %addr, "Connecting to component");

        let mut config = tokio_postgres::Config::new();
        config
            .host(&params.host)
            .port(params.port)
            .user(&params.user)
            .password(&params.password)
            .dbname(&params.database)
            .application_name("clusterwatch")
            .connect_timeout(timeout);

        // connect_timeout only covers the TCP phase, bound the handshake too
        let (client, connection) = match tokio::time::timeout(timeout, config.connect(NoTls)).await
        {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(ProbeError::Connect(e.to_string())),
            Err(_) => {
                return Err(ProbeError::Connect(format!(
                    "timeout expired after {}ms",
                    timeout.as_millis()
                )))
            }
        };

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                debug!(addr = %addr, error = %e, "Probe connection closed with error");
            }
        });

        Ok(Box::new(PgConnection {
            client,
            driver,
            query_timeout: self.query_timeout,
        }))
    }
}

struct PgConnection {
    client: Client,
    driver: JoinHandle<()>,
    query_timeout: Duration,
}

#[async_trait]
impl ProbeConnection for PgConnection {
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>, ProbeError> {
        let messages = tokio::time::timeout(self.query_timeout, self.client.simple_query(sql))
            .await
            .map_err(|_| {
                ProbeError::Query(format!(
                    "query timed out after {}ms",
                    self.query_timeout.as_millis()
                ))
            })?
            .map_err(|e| ProbeError::Query(e.to_string()))?;

        let rows = messages
            .into_iter()
            .filter_map(|message| match message {
                SimpleQueryMessage::Row(row) => {
                    let columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                    let values = (0..row.len())
                        .map(|idx| row.get(idx).map(str::to_string))
                        .collect();
                    Some(Row::new(columns, values))
                }
                _ => None,
            })
            .collect();
        Ok(rows)
    }
}

impl Drop for PgConnection {
    fn drop(&mut self) {
        self.driver.abort();
    }
}
