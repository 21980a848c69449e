//! Card content validation.
//!
//! Raw phrase/meaning/tag input is normalized here before it reaches the
//! card store, so the store can assume a non-empty phrase.

use thiserror::Error;

use crate::domain::DEFAULT_CONTEXT_TAG;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("phrase is required")]
  EmptyPhrase,
}

/// Validated card content, ready to insert or apply as an edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
  pub phrase: String,
  pub meaning: Option<String>,
  pub context_tag: String,
}

impl NewCard {
  pub fn parse(
    phrase: &str,
    meaning: Option<&str>,
    context_tag: Option<&str>,
  ) -> Result<Self, ValidationError> {
    let phrase = collapse_whitespace(phrase);
    if phrase.is_empty() {
      return Err(ValidationError::EmptyPhrase);
    }

    let meaning = meaning.map(collapse_whitespace).filter(|m| !m.is_empty());

    let context_tag = context_tag
      .map(|t| t.trim().to_lowercase())
      .filter(|t| !t.is_empty())
      .unwrap_or_else(|| DEFAULT_CONTEXT_TAG.to_string());

    Ok(Self {
      phrase,
      meaning,
      context_tag,
    })
  }
}

/// Trim and squeeze runs of whitespace to single spaces
fn collapse_whitespace(input: &str) -> String {
  input.split_whitespace().collect::<Vec<_>>().join(" ")
}
