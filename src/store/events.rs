//! cluster_events: append, recent window, purge.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::health::{Event, EventType, Severity};

use super::{format_ts, parse_ts, StoreError, StoreResult};

pub fn insert(conn: &Connection, event: &Event) -> StoreResult<i64> {
    conn.execute(
        "INSERT INTO cluster_events
         (event_type, component_name, severity, message, details, timestamp, resolved, resolved_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            event.event_type.as_str(),
            event.component_name,
            event.severity.as_str(),
            event.message,
            event.details,
            format_ts(&event.timestamp),
            event.resolved,
            event.resolved_at.as_ref().map(format_ts),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Events newer than `since`, newest first, at most `limit`
pub fn recent(conn: &Connection, since: DateTime<Utc>, limit: usize) -> StoreResult<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_type, component_name, severity, message, details, timestamp, resolved, resolved_at
         FROM cluster_events
         WHERE timestamp > ?1
         ORDER BY timestamp DESC, id DESC
         LIMIT ?2",
    )?;
    let raws = stmt
        .query_map(params![format_ts(&since), limit as i64], RawEvent::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    raws.into_iter().map(RawEvent::into_event).collect()
}

/// Delete events stamped at or before `cutoff`
pub fn delete_until(conn: &Connection, cutoff: DateTime<Utc>) -> StoreResult<usize> {
    let deleted = conn.execute(
        "DELETE FROM cluster_events WHERE timestamp <= ?1",
        params![format_ts(&cutoff)],
    )?;
    Ok(deleted)
}

struct RawEvent {
    event_type: String,
    component_name: String,
    severity: String,
    message: String,
    details: Option<String>,
    timestamp: String,
    resolved: bool,
    resolved_at: Option<String>,
}

impl RawEvent {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            event_type: row.get(0)?,
            component_name: row.get(1)?,
            severity: row.get(2)?,
            message: row.get(3)?,
            details: row.get(4)?,
            timestamp: row.get(5)?,
            resolved: row.get(6)?,
            resolved_at: row.get(7)?,
        })
    }

    fn into_event(self) -> StoreResult<Event> {
        let event_type = EventType::parse(&self.event_type)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown event type: {}", self.event_type)))?;
        let severity = Severity::parse(&self.severity)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown severity: {}", self.severity)))?;

        Ok(Event {
            event_type,
            component_name: self.component_name,
            severity,
            message: self.message,
            details: self.details,
            timestamp: parse_ts(&self.timestamp)?,
            resolved: self.resolved,
            resolved_at: self.resolved_at.as_deref().map(parse_ts).transpose()?,
        })
    }
}
