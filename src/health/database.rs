//! Database-engine inspection
//!
//! Detects whether a PostgreSQL node is the primary or a replica by
//! checking `pg_is_in_recovery()`, then gathers role-specific replication
//! facts:
//! 1. Primary: number of attached replicas from `pg_stat_replication`
//! 2. Replica: last received / replayed WAL positions, kept verbatim

use tracing::debug;

use crate::probe::ProbeConnection;

use super::checker::CheckError;
use super::query::{boolean, first_row, integer, optional_text, text};
use super::state::{ComponentFacts, DatabaseFacts, Replication};

const IDENTITY_SQL: &str = "SELECT version(), pg_is_in_recovery(), current_database(), current_user";

const ACTIVITY_SQL: &str = "SELECT pg_database_size(current_database()), \
     (SELECT count(*) FROM pg_stat_activity WHERE state = 'active'), \
     (SELECT count(*) FROM pg_stat_activity)";

const REPLICAS_SQL: &str = "SELECT count(*) FROM pg_stat_replication";

const WAL_POSITION_SQL: &str = "SELECT pg_last_wal_receive_lsn(), pg_last_wal_replay_lsn()";

/// Gather facts from a database-engine node. Every query is check-fatal.
pub async fn inspect(conn: &mut dyn ProbeConnection) -> Result<ComponentFacts, CheckError> {
    let identity = first_row(conn, IDENTITY_SQL).await?;
    let version = text(&identity, 0, "version")?;
    let is_in_recovery = boolean(&identity, 1, "pg_is_in_recovery")?;
    let database = text(&identity, 2, "current_database")?;
    let user = text(&identity, 3, "current_user")?;

    let activity = first_row(conn, ACTIVITY_SQL).await?;
    let database_size = integer(&activity, 0, "database size")?;
    let active_connections = integer(&activity, 1, "active connections")?;
    let total_connections = integer(&activity, 2, "total connections")?;

    let replication = detect_replication(conn, is_in_recovery).await?;

    Ok(ComponentFacts::Database(DatabaseFacts {
        version,
        is_in_recovery,
        database,
        user,
        database_size,
        active_connections,
        total_connections,
        replication,
    }))
}

async fn detect_replication(
    conn: &mut dyn ProbeConnection,
    is_in_recovery: bool,
) -> Result<Replication, CheckError> {
    if !is_in_recovery {
        let row = first_row(conn, REPLICAS_SQL).await?;
        let replicas = integer(&row, 0, "replica count")?.max(0) as u64;
        debug!(replicas = replicas, "Node is not in recovery, detected as primary");
        return Ok(Replication::Primary { replicas });
    }

    let row = first_row(conn, WAL_POSITION_SQL).await?;
    let receive_lsn = optional_text(&row, 0, "receive lsn")?;
    let replay_lsn = optional_text(&row, 1, "replay lsn")?;
    debug!(
        receive_lsn = ?receive_lsn,
        replay_lsn = ?replay_lsn,
        "Node is in recovery, detected as replica"
    );
    Ok(Replication::Replica {
        receive_lsn,
        replay_lsn,
    })
}
