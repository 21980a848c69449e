//! Application services.
//!
//! Flows that combine the scheduler with the card store.

pub mod review;

pub use review::{grade_card, review_queue, ReviewOutcome};
