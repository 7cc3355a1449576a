//! Row helpers shared by the per-kind inspectors

use crate::probe::{ProbeConnection, Row};

use super::checker::CheckError;

/// Execute a query and return its first row
pub(super) async fn first_row(conn: &mut dyn ProbeConnection, sql: &str) -> Result<Row, CheckError> {
    let rows = conn.query(sql).await?;
    rows.into_iter()
        .next()
        .ok_or_else(|| CheckError::Malformed(format!("no rows returned by: {}", sql)))
}

/// Non-NULL text value at `idx`
pub(super) fn text(row: &Row, idx: usize, what: &str) -> Result<String, CheckError> {
    match row.get(idx) {
        Some(Some(value)) => Ok(value.to_string()),
        Some(None) => Err(CheckError::Malformed(format!("{} is NULL", what))),
        None => Err(CheckError::Malformed(format!("missing column for {}", what))),
    }
}

/// Nullable text value at `idx`
pub(super) fn optional_text(row: &Row, idx: usize, what: &str) -> Result<Option<String>, CheckError> {
    match row.get(idx) {
        Some(value) => Ok(value.map(str::to_string)),
        None => Err(CheckError::Malformed(format!("missing column for {}", what))),
    }
}

/// Boolean in PostgreSQL text form (`t`/`f`)
pub(super) fn boolean(row: &Row, idx: usize, what: &str) -> Result<bool, CheckError> {
    let value = text(row, idx, what)?;
    match value.as_str() {
        "t" | "true" | "1" => Ok(true),
        "f" | "false" | "0" => Ok(false),
        other => Err(CheckError::Malformed(format!(
            "unexpected {} value: {}",
            what, other
        ))),
    }
}

pub(super) fn integer(row: &Row, idx: usize, what: &str) -> Result<i64, CheckError> {
    let value = text(row, idx, what)?;
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| CheckError::Malformed(format!("unexpected {} value: {}", what, value)))
}
