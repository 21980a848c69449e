pub mod card;
pub mod review;

pub use card::{Card, SchedulingState, DEFAULT_CONTEXT_TAG, LATEST_REVIEW_AT};
pub use review::{Grade, ReviewLog};
