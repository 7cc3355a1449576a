//! cluster_status: append, latest-per-component, windowed history, purge.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::config::ComponentKind;
use crate::health::{CheckResult, ComponentFacts, ComponentStatus};

use super::{format_ts, parse_ts, StoreError, StoreResult};

const CHECK_COLUMNS: &str =
    "component_name, component_type, status, response_time_ms, observed_at, error_message, metadata";

pub fn insert(conn: &Connection, result: &CheckResult) -> StoreResult<i64> {
    let metadata = result
        .metadata
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        "INSERT INTO cluster_status
         (component_name, component_type, status, response_time_ms, observed_at, error_message, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            result.component_name,
            result.kind.as_str(),
            result.status.as_str(),
            result.response_time_ms as i64,
            format_ts(&result.observed_at),
            result.error_message,
            metadata,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Exactly one row per component: the most recent, newest id winning ties.
/// Each component resolves with one descending seek on
/// `(component_name, observed_at)`.
pub fn latest_per_component(conn: &Connection) -> StoreResult<Vec<CheckResult>> {
    let sql = format!(
        "SELECT {CHECK_COLUMNS} FROM (SELECT DISTINCT component_name AS name FROM cluster_status) AS names
         JOIN cluster_status ON cluster_status.id = (
             SELECT latest.id FROM cluster_status AS latest
             WHERE latest.component_name = names.name
             ORDER BY latest.observed_at DESC, latest.id DESC
             LIMIT 1
         )
         ORDER BY names.name"
    );
    collect(conn, &sql, [])
}

/// Rows observed after `since`, newest first, optionally for one component
pub fn history(
    conn: &Connection,
    component: Option<&str>,
    since: DateTime<Utc>,
) -> StoreResult<Vec<CheckResult>> {
    let since = format_ts(&since);
    match component {
        Some(name) => {
            let sql = format!(
                "SELECT {CHECK_COLUMNS} FROM cluster_status
                 WHERE component_name = ?1 AND observed_at > ?2
                 ORDER BY observed_at DESC, id DESC"
            );
            collect(conn, &sql, params![name, since])
        }
        None => {
            let sql = format!(
                "SELECT {CHECK_COLUMNS} FROM cluster_status
                 WHERE observed_at > ?1
                 ORDER BY observed_at DESC, id DESC"
            );
            collect(conn, &sql, params![since])
        }
    }
}

/// Delete rows observed at or before `cutoff`
pub fn delete_until(conn: &Connection, cutoff: DateTime<Utc>) -> StoreResult<usize> {
    let deleted = conn.execute(
        "DELETE FROM cluster_status WHERE observed_at <= ?1",
        params![format_ts(&cutoff)],
    )?;
    Ok(deleted)
}

fn collect<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> StoreResult<Vec<CheckResult>> {
    let mut stmt = conn.prepare(sql)?;
    let raws = stmt
        .query_map(params, RawCheck::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    raws.into_iter().map(RawCheck::into_result).collect()
}

/// Column values before domain validation
struct RawCheck {
    component_name: String,
    component_type: String,
    status: String,
    response_time_ms: i64,
    observed_at: String,
    error_message: Option<String>,
    metadata: Option<String>,
}

impl RawCheck {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            component_name: row.get(0)?,
            component_type: row.get(1)?,
            status: row.get(2)?,
            response_time_ms: row.get(3)?,
            observed_at: row.get(4)?,
            error_message: row.get(5)?,
            metadata: row.get(6)?,
        })
    }

    fn into_result(self) -> StoreResult<CheckResult> {
        let kind = ComponentKind::parse(&self.component_type).ok_or_else(|| {
            StoreError::Corrupt(format!("unknown component type: {}", self.component_type))
        })?;
        let status = ComponentStatus::parse(&self.status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown status: {}", self.status)))?;
        let metadata: Option<ComponentFacts> = self
            .metadata
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(CheckResult {
            component_name: self.component_name,
            kind,
            status,
            response_time_ms: self.response_time_ms.max(0) as u64,
            error_message: self.error_message,
            metadata,
            observed_at: parse_ts(&self.observed_at)?,
        })
    }
}
