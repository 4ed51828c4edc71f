//! Point awards and the event-type taxonomy
//!
//! Word-guess points scale linearly with the current guess streak: base 1
//! point with a +1 bonus per prior word in the run, so a streak of N is worth
//! N points. The other awards are flat constants.

use serde::{Deserialize, Serialize};

/// Base points for a correct word guess.
pub const WORD_BASE_POINTS: f64 = 1.0;

/// Additional multiplier step per word already in the streak.
pub const WORD_STREAK_BONUS: f64 = 1.0;

/// Points per correct word in a recorded verse attempt.
pub const POINTS_PER_CORRECT_WORD: i64 = 1;

/// Flat award for adding a new verse.
pub const VERSE_ADDED_POINTS: i64 = 10;

/// Flat award for achieving mastery of a verse.
pub const MASTERY_BONUS: i64 = 500;

/// Cause of a point-event ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointEventType {
    WordCorrect,
    VerseAttempt,
    VerseAdded,
    MasteryAchieved,
    DailyStreak,
}

impl PointEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointEventType::WordCorrect => "word_correct",
            PointEventType::VerseAttempt => "verse_attempt",
            PointEventType::VerseAdded => "verse_added",
            PointEventType::MasteryAchieved => "mastery_achieved",
            PointEventType::DailyStreak => "daily_streak",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "word_correct" => Some(PointEventType::WordCorrect),
            "verse_attempt" => Some(PointEventType::VerseAttempt),
            "verse_added" => Some(PointEventType::VerseAdded),
            "mastery_achieved" => Some(PointEventType::MasteryAchieved),
            "daily_streak" => Some(PointEventType::DailyStreak),
            _ => None,
        }
    }
}

/// The streak multiplier applied to a correct word guess.
pub fn multiplier(streak_length: i64) -> f64 {
    1.0 + (streak_length - 1) as f64 * WORD_STREAK_BONUS
}

/// Points for a correct word guess at the given streak length.
pub fn word_points(streak_length: i64) -> i64 {
    (WORD_BASE_POINTS * multiplier(streak_length)).round() as i64
}

/// Points for a recorded verse attempt.
pub fn attempt_points(words_correct: i64) -> i64 {
    words_correct * POINTS_PER_CORRECT_WORD
}
