use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::domain::{Grade, SchedulingState, LATEST_REVIEW_AT};

pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// Lowest quality score that counts as a successful review
pub const PASS_THRESHOLD: u8 = 3;

/// Tunable constants of the scheduler. `Default` is the canonical schedule.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Sm2Params {
  pub pass_threshold: u8,
  pub initial_easiness: f64,
  pub min_easiness: f64,
  pub first_interval_days: i64,
  pub second_interval_days: i64,
  pub lapse_interval_days: i64,
}

impl Default for Sm2Params {
  fn default() -> Self {
    Self {
      pass_threshold: PASS_THRESHOLD,
      initial_easiness: INITIAL_EASE_FACTOR,
      min_easiness: MIN_EASE_FACTOR,
      first_interval_days: 1,
      second_interval_days: 3,
      lapse_interval_days: 1,
    }
  }
}

impl Sm2Params {
  /// Check that the parameters keep the state invariants reachable
  pub fn validate(&self) -> Result<(), String> {
    if self.pass_threshold > 5 {
      return Err(format!("pass_threshold {} is above the 0-5 quality scale", self.pass_threshold));
    }
    if !self.min_easiness.is_finite() || self.min_easiness < 1.0 {
      return Err(format!("min_easiness {} must be at least 1.0", self.min_easiness));
    }
    if !self.initial_easiness.is_finite() || self.initial_easiness < self.min_easiness {
      return Err(format!(
        "initial_easiness {} is below min_easiness {}",
        self.initial_easiness, self.min_easiness
      ));
    }
    let intervals = [
      ("first_interval_days", self.first_interval_days),
      ("second_interval_days", self.second_interval_days),
      ("lapse_interval_days", self.lapse_interval_days),
    ];
    for (name, days) in intervals {
      if days < 1 {
        return Err(format!("{} must be at least 1, got {}", name, days));
      }
    }
    Ok(())
  }

  pub fn initial_state(&self, now: DateTime<Utc>) -> SchedulingState {
    SchedulingState {
      repetition_count: 0,
      interval_days: 0,
      easiness_factor: self.initial_easiness,
      next_review_at: now,
    }
  }

  /// Produce the state that follows grading `state` with `grade` at `now`.
  pub fn apply_review(&self, state: &SchedulingState, grade: Grade, now: DateTime<Utc>) -> SchedulingState {
    let quality = grade.quality();

    // Clamp corrupted input so one bad stored value cannot compound
    let repetitions = state.repetition_count.max(0);
    let interval = state.interval_days.max(0);
    let current_ef = self.clamp_easiness(state.easiness_factor);

    let (interval_days, repetition_count, easiness_factor) = if quality < self.pass_threshold {
      // Lapse: back to daily review. EF is deliberately left alone here,
      // unlike textbook SM-2 which also lowers it on failed reviews.
      (self.lapse_interval_days, 0, current_ef)
    } else {
      let interval_days = match repetitions {
        0 => self.first_interval_days,
        1 => self.second_interval_days,
        _ => {
          // Halves round to even: 2.5 -> 2, 7.5 -> 8
          let grown = ((interval as f64) * current_ef).round_ties_even() as i64;
          if grown == 0 { 1 } else { grown }
        }
      };

      // EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))
      let q = quality as f64;
      let ease_delta = 0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02);
      let new_ef = self.clamp_easiness(current_ef + ease_delta);

      (interval_days, repetitions + 1, new_ef)
    };

    SchedulingState {
      repetition_count,
      interval_days,
      easiness_factor,
      next_review_at: due_after(now, interval_days),
    }
  }

  fn clamp_easiness(&self, ef: f64) -> f64 {
    if ef.is_finite() {
      ef.max(self.min_easiness)
    } else {
      self.min_easiness
    }
  }
}

/// `now + days`, capped at [`LATEST_REVIEW_AT`]
fn due_after(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
  Duration::try_days(days)
    .and_then(|d| now.checked_add_signed(d))
    .map_or(LATEST_REVIEW_AT, |due| due.min(LATEST_REVIEW_AT))
}

/// Default state for a freshly created card; due immediately.
pub fn initial_state(now: DateTime<Utc>) -> SchedulingState {
  Sm2Params::default().initial_state(now)
}

/// Apply one grading event using the default parameters.
pub fn apply_review(state: &SchedulingState, grade: Grade, now: DateTime<Utc>) -> SchedulingState {
  Sm2Params::default().apply_review(state, grade, now)
}
