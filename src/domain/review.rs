use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Self-reported recall quality for a reviewed card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
  Again,
  Hard,
  Good,
  Easy,
}

impl Grade {
  pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

  /// Quality score on the SM-2 0-5 scale
  pub fn quality(&self) -> u8 {
    match self {
      Self::Again => 0,
      Self::Hard => 3,
      Self::Good => 4,
      Self::Easy => 5,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Again => "again",
      Self::Hard => "hard",
      Self::Good => "good",
      Self::Easy => "easy",
    }
  }

  /// Strict lookup by canonical name
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "again" => Some(Self::Again),
      "hard" => Some(Self::Hard),
      "good" => Some(Self::Good),
      "easy" => Some(Self::Easy),
      _ => None,
    }
  }

  /// Map any grade input onto a grade, failing safe.
  ///
  /// Only the exact lowercase names match. Anything else, including `"Good"`
  /// or `" good"`, becomes `Again` so unknown input never counts as a pass.
  pub fn normalize(input: &str) -> Self {
    Self::from_str(input).unwrap_or(Self::Again)
  }
}

impl std::fmt::Display for Grade {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Immutable record of one grading event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
  pub id: i64,
  pub card_id: i64,
  pub grade: Grade,
  pub reviewed_at: DateTime<Utc>,
}

impl ReviewLog {
  pub fn new(card_id: i64, grade: Grade, reviewed_at: DateTime<Utc>) -> Self {
    Self {
      id: 0,
      card_id,
      grade,
      reviewed_at,
    }
  }
}
