//! Dashboard counters

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, Result};
use serde::Serialize;

use super::{get_due_count, reviewed_today_count, to_db_time};

/// Days covered by `cards_added_last_7_days`
const RECENT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsOverview {
    pub total_cards: i64,
    pub cards_added_last_7_days: i64,
    pub due_today: i64,
    pub reviewed_today: i64,
}

impl StatsOverview {
    /// Cards are waiting and nothing has been reviewed yet today
    pub fn should_nudge(&self) -> bool {
        self.due_today > 0 && self.reviewed_today == 0
    }
}

pub fn stats_overview(conn: &Connection, now: DateTime<Utc>) -> Result<StatsOverview> {
    let total_cards: i64 = conn.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?;

    let window_start = now - Duration::days(RECENT_WINDOW_DAYS);
    let cards_added_last_7_days: i64 = conn.query_row(
        "SELECT COUNT(*) FROM cards WHERE created_at >= ?1",
        params![to_db_time(&window_start)],
        |row| row.get(0),
    )?;

    Ok(StatsOverview {
        total_cards,
        cards_added_last_7_days,
        due_today: get_due_count(conn, now)?,
        reviewed_today: reviewed_today_count(conn, now)?,
    })
}
