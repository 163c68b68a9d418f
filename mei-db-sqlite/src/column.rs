use chrono::{DateTime, SecondsFormat, Utc};
use mei_core::RepositoryError;
use serde_json::Value;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// Fixed-width RFC 3339 in UTC (`2025-03-01T00:00:00.000000Z`), so stored
/// timestamps sort and compare correctly as text.
pub fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn get_timestamp(
    row: &SqliteRow,
    column: &str,
) -> Result<DateTime<Utc>, RepositoryError> {
    let raw = get_text(row, column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            RepositoryError::Database(format!("Invalid timestamp in '{column}': {raw} ({e})"))
        })
}

/// JSON document stored as TEXT.
pub fn get_json(
    row: &SqliteRow,
    column: &str,
) -> Result<Value, RepositoryError> {
    let raw = get_text(row, column)?;
    serde_json::from_str(&raw)
        .map_err(|e| RepositoryError::Database(format!("Invalid JSON in '{column}': {e}")))
}

pub fn get_text(
    row: &SqliteRow,
    column: &str,
) -> Result<String, RepositoryError> {
    row.try_get(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{column}': {e}")))
}
