//! SQLite persistence for check results, events and daily summaries
//!
//! One connection behind a mutex. Every call is synchronous and short, so a
//! caller that returns from a store method knows its write has landed.

mod checks;
mod events;
mod schema;
mod summaries;

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, TransactionBehavior};
use thiserror::Error;
use tracing::{debug, info};

use crate::health::{AverageMode, CheckResult, DailySummary, Event, SummaryDelta};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("metadata encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Rows removed by a retention purge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeCounts {
    pub deleted_checks: usize,
    pub deleted_events: usize,
}

/// Stored timestamps sort lexically: fixed millisecond precision, `Z` suffix.
pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_ts(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp {}: {}", raw, e)))
}

/// `now - span`, never earlier than the Unix epoch. Stored timestamps must
/// keep a four-digit year, and no check predates the epoch.
fn before_now(span: Option<chrono::Duration>) -> DateTime<Utc> {
    let floor = DateTime::<Utc>::UNIX_EPOCH;
    span.and_then(|span| Utc::now().checked_sub_signed(span))
        .map_or(floor, |cutoff| cutoff.max(floor))
}

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database file and bring the schema up to date
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        schema::apply_pragmas(&conn)?;
        schema::migrate(&conn)?;
        info!(path = %path.display(), "Opened status store");
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        schema::migrate(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn save_check(&self, result: &CheckResult) -> StoreResult<i64> {
        checks::insert(&self.conn.lock(), result)
    }

    pub fn log_event(&self, event: &Event) -> StoreResult<i64> {
        events::insert(&self.conn.lock(), event)
    }

    /// Fold one check into its daily row. The read and the write share an
    /// IMMEDIATE transaction so concurrent writers cannot lose updates.
    pub fn upsert_summary(&self, delta: &SummaryDelta, mode: AverageMode) -> StoreResult<DailySummary> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let summary = summaries::upsert(&tx, delta, mode)?;
        tx.commit()?;
        Ok(summary)
    }

    pub fn summary_for(&self, date: NaiveDate, component: &str) -> StoreResult<Option<DailySummary>> {
        summaries::get(&self.conn.lock(), date, component)
    }

    pub fn summaries_on(&self, date: NaiveDate) -> StoreResult<Vec<DailySummary>> {
        summaries::on_date(&self.conn.lock(), date)
    }

    /// Most recent check of every component that has one
    pub fn latest_status_per_component(&self) -> StoreResult<Vec<CheckResult>> {
        checks::latest_per_component(&self.conn.lock())
    }

    pub fn recent_events(&self, window: chrono::Duration, limit: usize) -> StoreResult<Vec<Event>> {
        events::recent(&self.conn.lock(), before_now(Some(window)), limit)
    }

    /// Checks from the last `hours`, newest first
    pub fn history_for(&self, component: Option<&str>, hours: u32) -> StoreResult<Vec<CheckResult>> {
        let since = before_now(chrono::Duration::try_hours(i64::from(hours)));
        checks::history(&self.conn.lock(), component, since)
    }

    /// Delete checks and events older than `days`. Summaries are kept.
    pub fn purge_older_than(&self, days: u32) -> StoreResult<PurgeCounts> {
        let cutoff = before_now(chrono::Duration::try_days(i64::from(days)));
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let counts = PurgeCounts {
            deleted_checks: checks::delete_until(&tx, cutoff)?,
            deleted_events: events::delete_until(&tx, cutoff)?,
        };
        tx.commit()?;
        debug!(
            days = days,
            deleted_checks = counts.deleted_checks,
            deleted_events = counts.deleted_events,
            "Purged expired rows"
        );
        Ok(counts)
    }
}
