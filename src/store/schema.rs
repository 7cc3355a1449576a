//! Table definitions and connection pragmas.

use rusqlite::Connection;

use super::StoreResult;

/// Apply connection pragmas. WAL lets readers proceed while a pass writes.
pub fn apply_pragmas(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )?;
    Ok(())
}

/// Create tables and indexes if missing.
pub fn migrate(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS cluster_status (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            component_name    TEXT NOT NULL,
            component_type    TEXT NOT NULL,
            status            TEXT NOT NULL,
            response_time_ms  INTEGER NOT NULL DEFAULT 0,
            observed_at       TEXT NOT NULL,
            error_message     TEXT,
            metadata          TEXT,
            created_at        TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_cluster_status_component
            ON cluster_status(component_name, observed_at);
        CREATE INDEX IF NOT EXISTS idx_cluster_status_observed
            ON cluster_status(observed_at);

        CREATE TABLE IF NOT EXISTS cluster_events (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            event_type      TEXT NOT NULL,
            component_name  TEXT NOT NULL,
            severity        TEXT NOT NULL,
            message         TEXT NOT NULL,
            details         TEXT,
            timestamp       TEXT NOT NULL,
            resolved        INTEGER NOT NULL DEFAULT 0,
            resolved_at     TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_cluster_events_component
            ON cluster_events(component_name);
        CREATE INDEX IF NOT EXISTS idx_cluster_events_timestamp
            ON cluster_events(timestamp);

        CREATE TABLE IF NOT EXISTS cluster_summary (
            id                    INTEGER PRIMARY KEY AUTOINCREMENT,
            date                  TEXT NOT NULL,
            component_name        TEXT NOT NULL,
            total_checks          INTEGER NOT NULL DEFAULT 0,
            successful_checks     INTEGER NOT NULL DEFAULT 0,
            failed_checks         INTEGER NOT NULL DEFAULT 0,
            avg_response_time_ms  REAL NOT NULL DEFAULT 0,
            max_response_time_ms  INTEGER NOT NULL DEFAULT 0,
            downtime_seconds      INTEGER NOT NULL DEFAULT 0,
            created_at            TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            UNIQUE(date, component_name)
        );

        CREATE INDEX IF NOT EXISTS idx_cluster_summary_date ON cluster_summary(date);
        ",
    )?;
    Ok(())
}
