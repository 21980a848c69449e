use rusqlite::{params, Connection, Result};

use crate::domain::LATEST_REVIEW_AT;

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Complete schema for new databases; upgrades for older files below
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS cards (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      phrase TEXT NOT NULL,
      meaning TEXT,
      context_tag TEXT NOT NULL DEFAULT 'other',
      created_at TEXT NOT NULL,
      updated_at TEXT NOT NULL,
      -- SM-2 scheduling state
      next_review_at TEXT,
      interval_days INTEGER NOT NULL DEFAULT 0,
      easiness_factor REAL NOT NULL DEFAULT 2.5,
      repetition INTEGER NOT NULL DEFAULT 0,
      suspended INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS review_logs (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      card_id INTEGER NOT NULL,
      grade TEXT NOT NULL,
      reviewed_at TEXT NOT NULL,
      FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_cards_next_review_at ON cards(next_review_at);
    CREATE INDEX IF NOT EXISTS idx_cards_created_at ON cards(created_at);
    CREATE INDEX IF NOT EXISTS idx_review_logs_card_id ON review_logs(card_id);
    CREATE INDEX IF NOT EXISTS idx_review_logs_reviewed_at ON review_logs(reviewed_at);
    "#,
  )?;

  // ============================================================
  // MIGRATIONS FOR EXISTING DATABASES
  // No-ops for new databases (columns already exist)
  // ============================================================

  add_column_if_missing(conn, "cards", "context_tag", "TEXT NOT NULL DEFAULT 'other'")?;
  add_column_if_missing(conn, "cards", "suspended", "INTEGER NOT NULL DEFAULT 0")?;

  // Expanded `+` years sort before every four-digit year
  let capped = conn.execute(
    "UPDATE cards SET next_review_at = ?1 WHERE next_review_at LIKE '+%'",
    params![super::to_db_time(&LATEST_REVIEW_AT)],
  )?;
  if capped > 0 {
    tracing::info!("Migrating cards: capped {} far-future due dates", capped);
  }

  Ok(())
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
  conn
    .prepare(&format!("SELECT {} FROM {} LIMIT 1", column, table))
    .is_ok()
}

/// Add a column if it doesn't already exist
fn add_column_if_missing(conn: &Connection, table: &str, column: &str, column_def: &str) -> Result<()> {
  if !column_exists(conn, table, column) {
    tracing::info!("Migrating {}: adding column {}", table, column);
    conn.execute(
      &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def),
      [],
    )?;
  }
  Ok(())
}
