use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-card spaced repetition state.
///
/// Serialized field names match what existing clients of the card store
/// expect, so the struct can be flattened into card JSON unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulingState {
  /// Consecutive passing reviews since creation or the last lapse
  #[serde(rename = "repetition")]
  pub repetition_count: i64,
  pub interval_days: i64,
  pub easiness_factor: f64,
  pub next_review_at: DateTime<Utc>,
}

/// Latest instant a review can be scheduled for: 9999-12-31T23:59:59Z.
///
/// Stored timestamps keep a four-digit year so their text order matches time
/// order; intervals that would reach past this are capped here.
pub const LATEST_REVIEW_AT: DateTime<Utc> = match DateTime::<Utc>::from_timestamp(253_402_300_799, 0) {
  Some(latest) => latest,
  None => panic!("latest review time out of range"),
};

/// Context tag used when a card is created without one
pub const DEFAULT_CONTEXT_TAG: &str = "other";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
  pub id: i64,
  pub phrase: String,
  pub meaning: Option<String>,
  pub context_tag: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub suspended: bool,
  #[serde(flatten)]
  pub schedule: SchedulingState,
}

impl Card {
  /// True when the card should be shown in a review session at `now`
  pub fn is_due(&self, now: DateTime<Utc>) -> bool {
    !self.suspended && self.schedule.next_review_at <= now
  }
}
