//! Data models for server storage

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use versekeep_core::PointEventType;

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Unique group identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub i64);

/// A user account. Identity is immutable after creation; deletion anonymizes
/// the email in place rather than removing the row.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

/// A pending magic-link login, keyed by its one-time code.
#[derive(Debug, Clone)]
pub struct PendingLogin {
    pub code: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A bearer-token session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Memorization status of a verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerseStatus {
    Learning,
    Reviewing,
    Mastered,
}

impl VerseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerseStatus::Learning => "learning",
            VerseStatus::Reviewing => "reviewing",
            VerseStatus::Mastered => "mastered",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "learning" => Some(VerseStatus::Learning),
            "reviewing" => Some(VerseStatus::Reviewing),
            "mastered" => Some(VerseStatus::Mastered),
            _ => None,
        }
    }
}

/// A verse a user is memorizing.
#[derive(Debug, Clone)]
pub struct Verse {
    pub id: i64,
    pub user_id: UserId,
    pub reference: String,
    pub text: String,
    pub translation: Option<String>,
    pub status: VerseStatus,
    pub created_at: DateTime<Utc>,
}

/// Fields that may change on an existing verse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerseUpdate {
    pub text: Option<String>,
    pub translation: Option<String>,
    pub status: Option<VerseStatus>,
}

/// Denormalized per-user statistics, one row per user, lazily created.
///
/// `total_points` is a cached rollup of the point-event ledger; every write
/// path updates both together.
#[derive(Debug, Clone)]
pub struct UserStats {
    pub user_id: UserId,
    pub total_points: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub verses_mastered: i64,
    pub total_attempts: i64,
    pub last_activity_date: DateTime<Utc>,
    pub current_verse_streak: i64,
    pub current_verse_reference: Option<String>,
    pub longest_word_guess_streak: i64,
    pub created_at: DateTime<Utc>,
}

impl UserStats {
    /// A fresh stats row: zeros everywhere, last activity pinned to creation
    /// so the streak machine can recognize the first-ever activity.
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            total_points: 0,
            current_streak: 0,
            longest_streak: 0,
            verses_mastered: 0,
            total_attempts: 0,
            last_activity_date: now,
            current_verse_streak: 0,
            current_verse_reference: None,
            longest_word_guess_streak: 0,
            created_at: now,
        }
    }
}

/// Best and current consecutive-correct-word run for one user and verse.
#[derive(Debug, Clone)]
pub struct VerseStreak {
    pub user_id: UserId,
    pub verse_reference: String,
    pub current_guess_streak: i64,
    pub longest_guess_streak: i64,
    pub last_guess_date: DateTime<Utc>,
}

/// An append-only point-event ledger entry.
#[derive(Debug, Clone)]
pub struct PointEvent {
    pub id: i64,
    pub user_id: UserId,
    pub event_type: PointEventType,
    pub points: i64,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Last attempt at one word slot of a verse; upserted, not historical.
#[derive(Debug, Clone)]
pub struct WordProgress {
    pub user_id: UserId,
    pub verse_reference: String,
    pub word_index: i64,
    pub word: String,
    pub is_correct: bool,
    pub updated_at: DateTime<Utc>,
}

/// One recorded recitation attempt; append-only.
#[derive(Debug, Clone)]
pub struct VerseAttempt {
    pub id: i64,
    pub user_id: UserId,
    pub verse_reference: String,
    pub words_correct: i64,
    pub total_words: i64,
    pub created_at: DateTime<Utc>,
}

/// Permanent mastery record, at most one per user and verse.
#[derive(Debug, Clone)]
pub struct MasteredVerse {
    pub user_id: UserId,
    pub verse_reference: String,
    pub mastered_at: DateTime<Utc>,
}

/// A leaderboard group.
#[derive(Debug, Clone)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub invite_code: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Points earned on one calendar day, for the 30-day history.
#[derive(Debug, Clone, Serialize)]
pub struct DailyPoints {
    pub date: NaiveDate,
    pub points: i64,
}
