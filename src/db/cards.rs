//! Card CRUD and queue queries

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::domain::{Card, SchedulingState};
use crate::srs;
use crate::validation::NewCard;

use super::{parse_db_time, to_db_time};

const CARD_COLUMNS: &str = "id, phrase, meaning, context_tag, created_at, updated_at, next_review_at, \
                            interval_days, easiness_factor, repetition, suspended";

/// Insert a new card with the default scheduling state, due at `now`
pub fn insert_card(conn: &Connection, card: &NewCard, now: DateTime<Utc>) -> Result<i64> {
    insert_card_with_schedule(conn, card, &srs::initial_state(now), now)
}

/// Insert a card with an explicit scheduling state
pub fn insert_card_with_schedule(
    conn: &Connection,
    card: &NewCard,
    schedule: &SchedulingState,
    now: DateTime<Utc>,
) -> Result<i64> {
    let now_str = to_db_time(&now);
    conn.execute(
        r#"
    INSERT INTO cards (phrase, meaning, context_tag, created_at, updated_at,
                       next_review_at, interval_days, easiness_factor, repetition, suspended)
    VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?6, ?7, ?8, 0)
    "#,
        params![
            card.phrase,
            card.meaning,
            card.context_tag,
            now_str,
            to_db_time(&schedule.next_review_at),
            schedule.interval_days,
            schedule.easiness_factor,
            schedule.repetition_count,
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(card_id = id, context_tag = %card.context_tag, "Card created");
    Ok(id)
}

pub fn get_card_by_id(conn: &Connection, id: i64) -> Result<Option<Card>> {
    let query = format!("SELECT {} FROM cards WHERE id = ?1", CARD_COLUMNS);
    conn.query_row(&query, params![id], row_to_card).optional()
}

/// All cards, newest first
pub fn list_cards(conn: &Connection) -> Result<Vec<Card>> {
    let query = format!(
        "SELECT {} FROM cards ORDER BY created_at DESC, id DESC",
        CARD_COLUMNS
    );
    let mut stmt = conn.prepare(&query)?;

    let cards = stmt
        .query_map([], row_to_card)?
        .collect::<Result<Vec<_>>>()?;
    Ok(cards)
}

/// Replace phrase, meaning and tag. Returns false if the card does not exist.
pub fn update_card_content(
    conn: &Connection,
    id: i64,
    card: &NewCard,
    now: DateTime<Utc>,
) -> Result<bool> {
    let changed = conn.execute(
        r#"
    UPDATE cards
    SET phrase = ?1, meaning = ?2, context_tag = ?3, updated_at = ?4
    WHERE id = ?5
    "#,
        params![card.phrase, card.meaning, card.context_tag, to_db_time(&now), id],
    )?;
    Ok(changed > 0)
}

pub fn set_suspended(conn: &Connection, id: i64, suspended: bool, now: DateTime<Utc>) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE cards SET suspended = ?1, updated_at = ?2 WHERE id = ?3",
        params![suspended, to_db_time(&now), id],
    )?;
    Ok(changed > 0)
}

/// Persist the scheduler's output for a card
pub fn update_card_schedule(
    conn: &Connection,
    id: i64,
    schedule: &SchedulingState,
    now: DateTime<Utc>,
) -> Result<bool> {
    let changed = conn.execute(
        r#"
    UPDATE cards
    SET next_review_at = ?1, interval_days = ?2, easiness_factor = ?3, repetition = ?4,
        updated_at = ?5
    WHERE id = ?6
    "#,
        params![
            to_db_time(&schedule.next_review_at),
            schedule.interval_days,
            schedule.easiness_factor,
            schedule.repetition_count,
            to_db_time(&now),
            id,
        ],
    )?;
    Ok(changed > 0)
}

/// Delete a card; its review logs go with it
pub fn delete_card(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute("DELETE FROM cards WHERE id = ?1", params![id])?;
    if changed > 0 {
        tracing::debug!(card_id = id, "Card deleted");
    }
    Ok(changed > 0)
}

/// Review queue: unsuspended cards whose due time is unset or not after `now`,
/// earliest due first.
pub fn get_due_cards(conn: &Connection, now: DateTime<Utc>, limit: usize) -> Result<Vec<Card>> {
    let query = format!(
        r#"
    SELECT {}
    FROM cards
    WHERE suspended = 0 AND (next_review_at IS NULL OR next_review_at <= ?1)
    ORDER BY next_review_at ASC, id ASC
    LIMIT ?2
    "#,
        CARD_COLUMNS
    );
    let mut stmt = conn.prepare(&query)?;

    let cards = stmt
        .query_map(params![to_db_time(&now), limit as i64], row_to_card)?
        .collect::<Result<Vec<_>>>()?;
    Ok(cards)
}

pub fn get_due_count(conn: &Connection, now: DateTime<Utc>) -> Result<i64> {
    conn.query_row(
        r#"
    SELECT COUNT(*) FROM cards
    WHERE suspended = 0 AND (next_review_at IS NULL OR next_review_at <= ?1)
    "#,
        params![to_db_time(&now)],
        |row| row.get(0),
    )
}

/// Get the next upcoming review time (only cards not yet due)
pub fn get_next_review_time(conn: &Connection, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
    let result: Option<String> = conn.query_row(
        "SELECT MIN(next_review_at) FROM cards WHERE suspended = 0 AND next_review_at > ?1",
        params![to_db_time(&now)],
        |row| row.get(0),
    )?;

    Ok(result.and_then(|s| parse_db_time(&s, "next_review_at")))
}

/// Convert a database row to a Card struct
pub(crate) fn row_to_card(row: &rusqlite::Row) -> Result<Card> {
    let created_at_str: String = row.get(4)?;
    let updated_at_str: String = row.get(5)?;
    let next_review_str: Option<String> = row.get(6)?;
    let suspended_int: i64 = row.get(10)?;

    let created_at = parse_db_time(&created_at_str, "created_at").unwrap_or_default();
    // Never scheduled, or unreadable: due since creation
    let next_review_at = next_review_str
        .and_then(|s| parse_db_time(&s, "next_review_at"))
        .unwrap_or(created_at);

    Ok(Card {
        id: row.get(0)?,
        phrase: row.get(1)?,
        meaning: row.get(2)?,
        context_tag: row.get(3)?,
        created_at,
        updated_at: parse_db_time(&updated_at_str, "updated_at").unwrap_or(created_at),
        suspended: suspended_int != 0,
        schedule: SchedulingState {
            repetition_count: row.get(9)?,
            interval_days: row.get(7)?,
            easiness_factor: row.get(8)?,
            next_review_at,
        },
    })
}
