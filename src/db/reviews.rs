//! Review history

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};

use crate::domain::{Grade, ReviewLog};

use super::{parse_db_time, to_db_time};

pub fn insert_review_log(conn: &Connection, log: &ReviewLog) -> Result<i64> {
    conn.execute(
        "INSERT INTO review_logs (card_id, grade, reviewed_at) VALUES (?1, ?2, ?3)",
        params![log.card_id, log.grade.as_str(), to_db_time(&log.reviewed_at)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Review history for one card, oldest first
pub fn get_review_logs_for_card(conn: &Connection, card_id: i64) -> Result<Vec<ReviewLog>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, card_id, grade, reviewed_at
    FROM review_logs
    WHERE card_id = ?1
    ORDER BY reviewed_at ASC, id ASC
    "#,
    )?;

    let logs = stmt
        .query_map(params![card_id], row_to_review_log)?
        .collect::<Result<Vec<_>>>()?;
    Ok(logs)
}

/// Reviews recorded since the start of the UTC day containing `now`
pub fn reviewed_today_count(conn: &Connection, now: DateTime<Utc>) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM review_logs WHERE reviewed_at >= ?1",
        params![to_db_time(&start_of_day(now))],
        |row| row.get(0),
    )
}

pub(crate) fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(chrono::NaiveTime::MIN).and_utc()
}

fn row_to_review_log(row: &rusqlite::Row) -> Result<ReviewLog> {
    let grade_str: String = row.get(2)?;
    let reviewed_at_str: String = row.get(3)?;

    Ok(ReviewLog {
        id: row.get(0)?,
        card_id: row.get(1)?,
        grade: Grade::normalize(&grade_str),
        reviewed_at: parse_db_time(&reviewed_at_str, "reviewed_at").unwrap_or_default(),
    })
}
