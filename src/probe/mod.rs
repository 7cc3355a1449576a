//! Probe connector capability
//!
//! The checker never talks to a database driver directly. It asks a
//! [`ProbeConnector`] for a timeout-bounded [`ProbeConnection`] and runs
//! text queries on it, getting rows of text values back.

mod postgres;

use std::time::Duration;

use async_trait::async_trait;

pub use postgres::PgConnector;

/// Connection parameters for one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl From<&crate::config::ComponentConfig> for ConnectParams {
    fn from(config: &crate::config::ComponentConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            user: config.user.clone(),
            password: config.password.clone(),
            database: config.database.clone(),
        }
    }
}

/// Opens probe connections
#[async_trait]
pub trait ProbeConnector: Send + Sync {
    /// Connect to an endpoint, failing with [`ProbeError::Connect`] if the
    /// connection cannot be established within `timeout`.
    async fn connect(
        &self,
        params: &ConnectParams,
        timeout: Duration,
    ) -> Result<Box<dyn ProbeConnection>, ProbeError>;
}

/// An established probe connection
#[async_trait]
pub trait ProbeConnection: Send {
    /// Run one text query and return all rows
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>, ProbeError>;
}

/// One result row, values in text form (NULL is `None`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Option<String>>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Option<String>>) -> Self {
        Self { columns, values }
    }

    /// Build a row from positional values with generated column names
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let values: Vec<Option<String>> = values.into_iter().map(|v| v.map(Into::into)).collect();
        let columns = (0..values.len()).map(|i| format!("column{}", i)).collect();
        Self { columns, values }
    }

    /// Value at position `idx`; outer `None` if the column does not exist
    pub fn get(&self, idx: usize) -> Option<Option<&str>> {
        self.values.get(idx).map(|v| v.as_deref())
    }

    /// Value of the column called `name`
    pub fn get_named(&self, name: &str) -> Option<Option<&str>> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|idx| self.get(idx))
    }
}

/// Probe failure
///
/// The message is the verbatim description of the underlying failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// Connection could not be established
    #[error("{0}")]
    Connect(String),
    /// Connected, but a query failed
    #[error("{0}")]
    Query(String),
}
