//! Test utilities for database setup.
//!
//! Reuses the production open path so tests run against the real schema.

use rusqlite::Connection;
use std::path::PathBuf;
use tempfile::TempDir;

/// File-backed card database in a temporary directory.
///
/// Unlike an in-memory database, several connections can be opened on the
/// same file, which is what concurrency tests need.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
    pub db_path: PathBuf,
}

impl TestEnv {
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        let db_path = temp.path().join("llyli.db");

        // Create the schema once up front
        crate::db::open_connection(&db_path)?;

        Ok(Self { temp, db_path })
    }

    /// Open another connection to the test database
    pub fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        crate::db::configure(&conn)?;
        Ok(conn)
    }
}
