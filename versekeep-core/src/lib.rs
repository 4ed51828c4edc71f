//! VerseKeep Core Library
//!
//! Pure domain logic for the scripture-memorization backend:
//! - Daily login streak state machine
//! - Word-guess streak points and multipliers
//! - Mastery detection over attempt history
//! - The 24-hour perfect-attempt cooldown

pub mod cooldown;
pub mod mastery;
pub mod points;
pub mod streak;

pub use cooldown::hours_remaining;
pub use mastery::Attempt;
pub use points::PointEventType;
pub use streak::{StreakDecision, StreakState};
