//! Gamification engine
//!
//! Orchestrates the read-modify-write sequences behind the practice
//! endpoints: daily streaks, word-guess streaks, attempt recording with the
//! perfect-attempt cooldown, and mastery detection. The decision logic itself
//! lives in `versekeep-core`; this module applies decisions to a store,
//! keeping the point-event ledger and the stats rollup in lock-step.
//!
//! None of these sequences run inside a transaction; two racing requests for
//! one user can lose an update. That mirrors the per-request execution model
//! the service is specified against.

mod mastery;
mod progress;
mod streak;

pub use mastery::{evaluate_mastery, mastery_status, MasteryStatus};
pub use progress::{record_attempt, record_word_guess, apply_correct_word, WordGuessOutcome};
pub use streak::{reset_verse_streak, update_daily_streak};
