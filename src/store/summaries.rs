//! cluster_summary: read-modify-write upsert keyed by (date, component).

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::health::{AverageMode, DailySummary, SummaryDelta};

use super::{StoreError, StoreResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SUMMARY_COLUMNS: &str = "date, component_name, total_checks, successful_checks, failed_checks,
     avg_response_time_ms, max_response_time_ms, downtime_seconds";

/// Fold `delta` into its row, creating the row on first observation.
/// Must run inside a write transaction.
pub fn upsert(conn: &Connection, delta: &SummaryDelta, mode: AverageMode) -> StoreResult<DailySummary> {
    let prior = get(conn, delta.date, &delta.component_name)?
        .unwrap_or_else(|| DailySummary::empty(delta.date, delta.component_name.clone()));
    let updated = prior.apply(delta, mode);

    conn.execute(
        "INSERT INTO cluster_summary
         (date, component_name, total_checks, successful_checks, failed_checks,
          avg_response_time_ms, max_response_time_ms, downtime_seconds)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(date, component_name) DO UPDATE SET
             total_checks = excluded.total_checks,
             successful_checks = excluded.successful_checks,
             failed_checks = excluded.failed_checks,
             avg_response_time_ms = excluded.avg_response_time_ms,
             max_response_time_ms = excluded.max_response_time_ms,
             downtime_seconds = excluded.downtime_seconds",
        params![
            updated.date.format(DATE_FORMAT).to_string(),
            updated.component_name,
            updated.total_checks as i64,
            updated.successful_checks as i64,
            updated.failed_checks as i64,
            updated.avg_response_time_ms,
            updated.max_response_time_ms as i64,
            updated.downtime_seconds as i64,
        ],
    )?;
    Ok(updated)
}

pub fn get(conn: &Connection, date: NaiveDate, component: &str) -> StoreResult<Option<DailySummary>> {
    let sql = format!(
        "SELECT {SUMMARY_COLUMNS} FROM cluster_summary WHERE date = ?1 AND component_name = ?2"
    );
    let raw = conn
        .query_row(
            &sql,
            params![date.format(DATE_FORMAT).to_string(), component],
            RawSummary::from_row,
        )
        .optional()?;
    raw.map(RawSummary::into_summary).transpose()
}

/// All rows for one day, by component name
pub fn on_date(conn: &Connection, date: NaiveDate) -> StoreResult<Vec<DailySummary>> {
    let sql = format!(
        "SELECT {SUMMARY_COLUMNS} FROM cluster_summary WHERE date = ?1 ORDER BY component_name"
    );
    let mut stmt = conn.prepare(&sql)?;
    let raws = stmt
        .query_map(params![date.format(DATE_FORMAT).to_string()], RawSummary::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    raws.into_iter().map(RawSummary::into_summary).collect()
}

struct RawSummary {
    date: String,
    component_name: String,
    total_checks: i64,
    successful_checks: i64,
    failed_checks: i64,
    avg_response_time_ms: f64,
    max_response_time_ms: i64,
    downtime_seconds: i64,
}

impl RawSummary {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            date: row.get(0)?,
            component_name: row.get(1)?,
            total_checks: row.get(2)?,
            successful_checks: row.get(3)?,
            failed_checks: row.get(4)?,
            avg_response_time_ms: row.get(5)?,
            max_response_time_ms: row.get(6)?,
            downtime_seconds: row.get(7)?,
        })
    }

    fn into_summary(self) -> StoreResult<DailySummary> {
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
            .map_err(|e| StoreError::Corrupt(format!("bad summary date {}: {}", self.date, e)))?;
        Ok(DailySummary {
            date,
            component_name: self.component_name,
            total_checks: self.total_checks.max(0) as u64,
            successful_checks: self.successful_checks.max(0) as u64,
            failed_checks: self.failed_checks.max(0) as u64,
            avg_response_time_ms: self.avg_response_time_ms,
            max_response_time_ms: self.max_response_time_ms.max(0) as u64,
            downtime_seconds: self.downtime_seconds.max(0) as u64,
        })
    }
}
