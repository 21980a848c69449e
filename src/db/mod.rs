pub mod cards;
pub mod reviews;
pub mod schema;
pub mod stats;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Result};
use std::path::Path;
use std::time::Duration;

use crate::domain::LATEST_REVIEW_AT;

// Re-export all public items from submodules
pub use cards::*;
pub use reviews::*;
pub use schema::run_migrations;
pub use stats::*;

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }
}

/// Open (creating if needed) the card database at `path` and bring its schema up to date
pub fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!("Could not create {}: {}", parent.display(), e);
        }
    }

    // Create backup before migrations if database exists
    if path.exists() {
        let backup_path = path.with_extension("db.backup");
        if let Err(e) = std::fs::copy(path, &backup_path) {
            tracing::warn!("Could not create database backup: {}", e);
        }
    }

    let conn = Connection::open(path)?;
    configure(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// In-memory database with the full schema
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// How long a writer waits for another connection's transaction
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-connection settings; review logs rely on cascading deletes
pub(crate) fn configure(conn: &Connection) -> Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

/// Fixed-width RFC 3339 so that string order in SQL equals time order.
///
/// Times past [`LATEST_REVIEW_AT`] are written as that instant; chrono would
/// otherwise emit a `+`-prefixed five-digit year.
pub(crate) fn to_db_time(time: &DateTime<Utc>) -> String {
    (*time)
        .min(LATEST_REVIEW_AT)
        .to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp. Unreadable values are logged and yield `None`.
pub(crate) fn parse_db_time(value: &str, column: &str) -> Option<DateTime<Utc>> {
    // Rows written before the year cap carry an expanded year
    if value.starts_with('+') {
        return Some(LATEST_REVIEW_AT);
    }
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!("Unreadable {} timestamp {:?}: {}", column, value, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_db_time_is_fixed_width_and_sortable() {
        let a = Utc.with_ymd_and_hms(2024, 1, 9, 23, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 10, 1, 0, 0).unwrap();
        let sa = to_db_time(&a);
        let sb = to_db_time(&b);
        assert_eq!(sa.len(), sb.len());
        assert_eq!(sa, "2024-01-09T23:00:00.000000Z");
        assert!(sa < sb);
    }

    #[test]
    fn test_parse_db_time_roundtrip() {
        let t = Utc.with_ymd_and_hms(2024, 7, 4, 12, 30, 15).unwrap();
        assert_eq!(parse_db_time(&to_db_time(&t), "test"), Some(t));
    }

    #[test]
    fn test_parse_db_time_accepts_offsets() {
        let parsed = parse_db_time("2024-07-04T14:30:15+02:00", "test");
        assert_eq!(parsed, Some(Utc.with_ymd_and_hms(2024, 7, 4, 12, 30, 15).unwrap()));
    }

    #[test]
    fn test_parse_db_time_unreadable() {
        assert_eq!(parse_db_time("next tuesday", "test"), None);
        assert_eq!(parse_db_time("", "test"), None);
    }

    #[test]
    fn test_db_time_caps_far_future() {
        let far = DateTime::<Utc>::MAX_UTC;
        let stored = to_db_time(&far);
        assert_eq!(stored, "9999-12-31T23:59:59.000000Z");
        assert_eq!(stored.len(), to_db_time(&Utc::now()).len());
        assert_eq!(parse_db_time(&stored, "test"), Some(LATEST_REVIEW_AT));
    }

    #[test]
    fn test_parse_db_time_expanded_year() {
        let parsed = parse_db_time("+163662-01-19T00:00:00.000000Z", "test");
        assert_eq!(parsed, Some(LATEST_REVIEW_AT));
    }

    #[test]
    fn test_log_warn() {
        let ok: std::result::Result<i64, String> = Ok(3);
        let err: std::result::Result<i64, String> = Err("boom".into());
        assert_eq!(ok.log_warn("ctx"), Some(3));
        assert_eq!(err.log_warn("ctx"), None);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = open_in_memory().unwrap();
        let on: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)).unwrap();
        assert_eq!(on, 1);
    }

    #[test]
    fn test_open_connection_creates_parent_dirs() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nested").join("cards.db");
        let conn = open_connection(&path).unwrap();
        assert!(path.exists());
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0)).unwrap();
        assert_eq!(count, 0);
    }
}
