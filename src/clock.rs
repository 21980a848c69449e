//! Time sources.
//!
//! Anything that would otherwise call `Utc::now()` takes a `Clock` so tests
//! can pin the current instant.

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

pub trait Clock {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Manually driven clock for tests and simulations
#[derive(Debug)]
pub struct FixedClock {
  instant: Mutex<DateTime<Utc>>,
}

impl FixedClock {
  pub fn new(instant: DateTime<Utc>) -> Self {
    Self {
      instant: Mutex::new(instant),
    }
  }

  pub fn set(&self, instant: DateTime<Utc>) {
    *self.lock() = instant;
  }

  pub fn advance(&self, by: Duration) {
    let mut guard = self.lock();
    *guard += by;
  }

  pub fn advance_days(&self, days: i64) {
    self.advance(Duration::days(days));
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
    // A poisoned guard still holds a valid timestamp
    self.instant.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    *self.lock()
  }
}

impl<C: Clock + ?Sized> Clock for &C {
  fn now(&self) -> DateTime<Utc> {
    (**self).now()
  }
}
