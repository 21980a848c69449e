//! Review flow: the read-modify-write around the scheduler.
//!
//! The scheduler itself never sees storage. Grading a card loads its state,
//! applies the grade, stores the result and appends a review log, all inside
//! one immediate transaction. SQLite takes the write lock at `BEGIN`, so two
//! graders of the same card are serialized and neither update is lost.

use rusqlite::{Connection, Result, TransactionBehavior};
use serde::Serialize;

use crate::clock::Clock;
use crate::db;
use crate::domain::{Card, Grade, ReviewLog};
use crate::srs::Sm2Params;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewOutcome {
    pub card: Card,
    pub log: ReviewLog,
}

/// Grade a card. Returns `Ok(None)` without writing anything if the card does not exist.
///
/// `grade_input` is normalized with [`Grade::normalize`], so anything other
/// than an exact grade name is recorded and scheduled as `again`.
pub fn grade_card(
    conn: &mut Connection,
    card_id: i64,
    grade_input: &str,
    params: &Sm2Params,
    clock: &impl Clock,
) -> Result<Option<ReviewOutcome>> {
    let grade = Grade::normalize(grade_input);
    if grade.as_str() != grade_input {
        tracing::warn!(card_id, input = grade_input, "Unrecognized grade recorded as again");
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let Some(mut card) = db::get_card_by_id(&tx, card_id)? else {
        tracing::debug!(card_id, "Grade for unknown card ignored");
        return Ok(None);
    };

    let now = clock.now();
    let next = params.apply_review(&card.schedule, grade, now);
    db::update_card_schedule(&tx, card_id, &next, now)?;

    let mut log = ReviewLog::new(card_id, grade, now);
    log.id = db::insert_review_log(&tx, &log)?;

    tx.commit()?;

    tracing::info!(
        card_id,
        grade = %grade,
        interval_days = next.interval_days,
        repetition = next.repetition_count,
        easiness_factor = next.easiness_factor,
        "Card reviewed"
    );

    card.schedule = next;
    card.updated_at = now;
    Ok(Some(ReviewOutcome { card, log }))
}

/// Cards due at the clock's current time, earliest first
pub fn review_queue(conn: &Connection, clock: &impl Clock, limit: usize) -> Result<Vec<Card>> {
    let due = db::get_due_cards(conn, clock.now(), limit)?;
    if due.is_empty() {
        tracing::info!("Review queue exhausted");
    }
    Ok(due)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::db::open_in_memory;
    use crate::testing::TestEnv;
    use crate::validation::NewCard;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 7, 0, 0).unwrap()
    }

    fn setup() -> (Connection, i64, FixedClock) {
        let conn = open_in_memory().unwrap();
        let card = NewCard::parse("obrigado", Some("thank you"), None).unwrap();
        let id = db::insert_card(&conn, &card, t0()).unwrap();
        (conn, id, FixedClock::new(t0()))
    }

    #[test]
    fn test_grade_card_persists_state_and_log() {
        let (mut conn, id, clock) = setup();
        let params = Sm2Params::default();

        let outcome = grade_card(&mut conn, id, "good", &params, &clock).unwrap().unwrap();
        assert_eq!(outcome.card.schedule.interval_days, 1);
        assert_eq!(outcome.card.schedule.repetition_count, 1);
        assert_eq!(outcome.card.schedule.next_review_at, t0() + Duration::days(1));
        assert_eq!(outcome.log.grade, Grade::Good);
        assert!(outcome.log.id > 0);

        let stored = db::get_card_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(stored, outcome.card);

        let logs = db::get_review_logs_for_card(&conn, id).unwrap();
        assert_eq!(logs, vec![outcome.log]);
    }

    #[test]
    fn test_grade_unknown_card() {
        let (mut conn, id, clock) = setup();
        let result = grade_card(&mut conn, id + 1, "good", &Sm2Params::default(), &clock).unwrap();
        assert!(result.is_none());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM review_logs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_unknown_grade_recorded_as_again() {
        let (mut conn, id, clock) = setup();
        let params = Sm2Params::default();
        grade_card(&mut conn, id, "good", &params, &clock).unwrap();
        clock.advance_days(1);

        let outcome = grade_card(&mut conn, id, "sort of", &params, &clock).unwrap().unwrap();
        assert_eq!(outcome.log.grade, Grade::Again);
        assert_eq!(outcome.card.schedule.repetition_count, 0);
        assert_eq!(outcome.card.schedule.interval_days, 1);
    }

    #[test]
    fn test_capitalized_grade_is_not_a_pass() {
        let (mut conn, id, clock) = setup();
        let params = Sm2Params::default();
        grade_card(&mut conn, id, "good", &params, &clock).unwrap();
        grade_card(&mut conn, id, "good", &params, &clock).unwrap();

        let outcome = grade_card(&mut conn, id, "Good", &params, &clock).unwrap().unwrap();
        assert_eq!(outcome.log.grade, Grade::Again);
        assert_eq!(outcome.card.schedule.repetition_count, 0);
        let logs = db::get_review_logs_for_card(&conn, id).unwrap();
        assert_eq!(logs.last().map(|log| log.grade), Some(Grade::Again));
    }

    #[test]
    fn test_grading_to_far_future_leaves_queue_empty() {
        let (mut conn, id, clock) = setup();
        let params = Sm2Params::default();
        let mut last = None;
        for _ in 0..16 {
            last = grade_card(&mut conn, id, "easy", &params, &clock).unwrap();
        }
        let card = last.unwrap().card;
        assert_eq!(card.schedule.next_review_at, crate::domain::LATEST_REVIEW_AT);

        let stored = db::get_card_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(stored.schedule.next_review_at, crate::domain::LATEST_REVIEW_AT);
        assert!(review_queue(&conn, &clock, 10).unwrap().is_empty());
        assert_eq!(db::get_due_count(&conn, clock.now()).unwrap(), 0);

        clock.advance_days(365 * 50);
        assert!(review_queue(&conn, &clock, 10).unwrap().is_empty());
    }

    #[test]
    fn test_review_queue_follows_clock() {
        let (mut conn, id, clock) = setup();
        assert_eq!(review_queue(&conn, &clock, 10).unwrap().len(), 1);

        grade_card(&mut conn, id, "easy", &Sm2Params::default(), &clock).unwrap();
        assert!(review_queue(&conn, &clock, 10).unwrap().is_empty());

        clock.advance_days(1);
        let due = review_queue(&conn, &clock, 10).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, id);
    }

    #[test]
    fn test_concurrent_grades_are_not_lost() {
        let env = TestEnv::new().unwrap();
        let id = {
            let conn = env.connect().unwrap();
            let card = NewCard::parse("tschüss", None, None).unwrap();
            db::insert_card(&conn, &card, t0()).unwrap()
        };

        let graders = 4;
        let rounds = 3;
        std::thread::scope(|scope| {
            for _ in 0..graders {
                scope.spawn(|| {
                    let mut conn = env.connect().unwrap();
                    let clock = FixedClock::new(t0());
                    for _ in 0..rounds {
                        grade_card(&mut conn, id, "good", &Sm2Params::default(), &clock)
                            .unwrap()
                            .unwrap();
                    }
                });
            }
        });

        let conn = env.connect().unwrap();
        let card = db::get_card_by_id(&conn, id).unwrap().unwrap();
        // Every grade saw the previous one's result
        assert_eq!(card.schedule.repetition_count, graders * rounds);
        assert_eq!(db::get_review_logs_for_card(&conn, id).unwrap().len() as i64, graders * rounds);
    }
}
