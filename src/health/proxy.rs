//! Connection-pool proxy inspection
//!
//! Only the identity query gates the check. The node list and connection
//! count are best-effort and degrade to empty/zero on failure.

use tracing::debug;

use crate::probe::{ProbeConnection, Row};

use super::checker::CheckError;
use super::query::{first_row, integer, text};
use super::state::{ComponentFacts, PoolNode, ProxyFacts};

const IDENTITY_SQL: &str = "SELECT version(), current_database()";

const POOL_NODES_SQL: &str = "SHOW pool_nodes";

const CONNECTIONS_SQL: &str = "SELECT count(*) FROM pg_stat_activity";

pub async fn inspect(conn: &mut dyn ProbeConnection) -> Result<ComponentFacts, CheckError> {
    let identity = first_row(conn, IDENTITY_SQL).await?;
    let version = text(&identity, 0, "version")?;
    let database = text(&identity, 1, "current_database")?;

    let nodes_info = match conn.query(POOL_NODES_SQL).await {
        Ok(rows) => rows.iter().enumerate().map(|(i, row)| pool_node(i, row)).collect(),
        Err(e) => {
            debug!(error = %e, "Node list unavailable");
            Vec::new()
        }
    };

    let active_connections = match first_row(conn, CONNECTIONS_SQL).await {
        Ok(row) => integer(&row, 0, "connection count").unwrap_or(0),
        Err(e) => {
            debug!(error = %e, "Connection count unavailable");
            0
        }
    };

    Ok(ComponentFacts::Proxy(ProxyFacts {
        version,
        database,
        pool_nodes: nodes_info.len(),
        active_connections,
        nodes_info,
    }))
}

/// Interpret one `SHOW pool_nodes` row by column name
fn pool_node(position: usize, row: &Row) -> PoolNode {
    let named = |name: &str| row.get_named(name).flatten().map(str::to_string);

    PoolNode {
        node_id: named("node_id").unwrap_or_else(|| position.to_string()),
        hostname: named("hostname"),
        port: named("port"),
        status: named("status").unwrap_or_else(|| "unknown".to_string()),
        role: named("role"),
    }
}
