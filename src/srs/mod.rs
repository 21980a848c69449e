pub mod sm2;

pub use sm2::{apply_review, initial_state, Sm2Params, MIN_EASE_FACTOR, PASS_THRESHOLD};
