//! Storage abstractions for the server

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::MemoryStore;
pub use models::*;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use versekeep_core::PointEventType;

use crate::error::ApiError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, ApiError>;

/// User accounts and pending magic-link logins
pub trait UserStore: Send + Sync {
    /// Create a new user for a verified email
    fn create_user(&self, email: &str, now: DateTime<Utc>) -> StoreResult<User>;

    /// Get a user by ID
    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>>;

    /// Get a user by email address
    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Record a successful login
    fn touch_last_login(&self, user_id: UserId, now: DateTime<Utc>) -> StoreResult<()>;

    /// Replace the user's email with an opaque placeholder
    fn anonymize_user(&self, user_id: UserId, placeholder: &str) -> StoreResult<()>;

    /// Store a pending magic-link login
    fn create_pending_login(&self, pending: PendingLogin) -> StoreResult<()>;

    /// Get a pending login by its one-time code
    fn get_pending_login(&self, code: &str) -> StoreResult<Option<PendingLogin>>;

    /// Delete a pending login
    fn delete_pending_login(&self, code: &str) -> StoreResult<()>;

    /// Delete pending logins older than the given age
    fn cleanup_expired_logins(&self, max_age_minutes: i64) -> StoreResult<u64>;
}

/// Bearer-token session storage
pub trait SessionStore: Send + Sync {
    /// Create a new session for a user
    fn create_session(&self, user_id: UserId, ttl_days: i64) -> StoreResult<Session>;

    /// Get a live session by token; expired sessions are treated as absent
    fn get_session(&self, token: &str) -> StoreResult<Option<Session>>;

    /// Delete a session
    fn delete_session(&self, token: &str) -> StoreResult<()>;

    /// Delete every session belonging to a user
    fn delete_sessions_for_user(&self, user_id: UserId) -> StoreResult<()>;
}

/// A user's memorization items
pub trait VerseStore: Send + Sync {
    /// Add a verse; fails if the reference already exists for this user
    fn add_verse(
        &self,
        user_id: UserId,
        reference: &str,
        text: &str,
        translation: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<Verse>;

    /// Get one of the user's verses by reference
    fn get_verse(&self, user_id: UserId, reference: &str) -> StoreResult<Option<Verse>>;

    /// List all of the user's verses
    fn list_verses(&self, user_id: UserId) -> StoreResult<Vec<Verse>>;

    /// Apply a partial update to a verse
    fn update_verse(
        &self,
        user_id: UserId,
        reference: &str,
        update: &VerseUpdate,
    ) -> StoreResult<Option<Verse>>;

    /// Delete a verse together with its word progress, attempts, and streak
    /// row in one atomic batch. Mastery records and point events survive.
    fn delete_verse_data(&self, user_id: UserId, reference: &str) -> StoreResult<bool>;
}

/// Practice events, statistics, and the point-event ledger
pub trait ProgressStore: Send + Sync {
    /// Get the user's stats row, if one exists
    fn get_user_stats(&self, user_id: UserId) -> StoreResult<Option<UserStats>>;

    /// Get the user's stats row, lazily creating it
    fn ensure_user_stats(&self, user_id: UserId, now: DateTime<Utc>) -> StoreResult<UserStats>;

    /// Write the full stats row as one idempotent merge (creation timestamp
    /// is preserved on conflict)
    fn save_user_stats(&self, stats: &UserStats) -> StoreResult<()>;

    /// Get the guess-streak row for a verse, if one exists
    fn get_verse_streak(
        &self,
        user_id: UserId,
        reference: &str,
    ) -> StoreResult<Option<VerseStreak>>;

    /// Upsert a guess-streak row
    fn save_verse_streak(&self, streak: &VerseStreak) -> StoreResult<()>;

    /// Upsert the last attempt at one word slot
    fn upsert_word_progress(&self, progress: &WordProgress) -> StoreResult<()>;

    /// Append a recitation attempt
    fn insert_attempt(
        &self,
        user_id: UserId,
        reference: &str,
        words_correct: i64,
        total_words: i64,
        now: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// All attempts for a verse, most recent first
    fn attempts_newest_first(
        &self,
        user_id: UserId,
        reference: &str,
    ) -> StoreResult<Vec<VerseAttempt>>;

    /// Timestamp of the most recent perfect attempt for a verse
    fn last_perfect_attempt(
        &self,
        user_id: UserId,
        reference: &str,
    ) -> StoreResult<Option<DateTime<Utc>>>;

    /// Append a point event to the ledger
    fn insert_point_event(
        &self,
        user_id: UserId,
        event_type: PointEventType,
        points: i64,
        metadata: serde_json::Value,
        now: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Remove a user's point events (account anonymization only)
    fn delete_point_events(&self, user_id: UserId) -> StoreResult<()>;

    /// Total points per event type
    fn points_by_event_type(&self, user_id: UserId)
        -> StoreResult<Vec<(PointEventType, i64)>>;

    /// Per-day point totals since the given instant
    fn daily_point_totals(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<DailyPoints>>;

    /// Sum of points earned since the given instant (all time when `None`)
    fn points_since(
        &self,
        user_id: UserId,
        since: Option<DateTime<Utc>>,
    ) -> StoreResult<i64>;

    /// Record mastery of a verse
    fn insert_mastered(
        &self,
        user_id: UserId,
        reference: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Get the mastery record for a verse, if any
    fn get_mastered(
        &self,
        user_id: UserId,
        reference: &str,
    ) -> StoreResult<Option<MasteredVerse>>;
}

/// Groups and membership for the leaderboard
pub trait GroupStore: Send + Sync {
    /// Create a group; the creator becomes its first member
    fn create_group(
        &self,
        name: &str,
        invite_code: &str,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> StoreResult<Group>;

    /// Look up a group by invite code
    fn get_group_by_invite(&self, invite_code: &str) -> StoreResult<Option<Group>>;

    /// Get a group by ID
    fn get_group(&self, group_id: GroupId) -> StoreResult<Option<Group>>;

    /// Add a user to a group (no-op if already a member)
    fn add_member(&self, group_id: GroupId, user_id: UserId, now: DateTime<Utc>)
        -> StoreResult<()>;

    /// Whether a user belongs to a group
    fn is_member(&self, group_id: GroupId, user_id: UserId) -> StoreResult<bool>;

    /// All member ids of a group
    fn member_ids(&self, group_id: GroupId) -> StoreResult<Vec<UserId>>;
}

/// Everything the request handlers need from storage.
pub trait Datastore:
    UserStore + SessionStore + VerseStore + ProgressStore + GroupStore
{
}

impl<T> Datastore for T where
    T: UserStore + SessionStore + VerseStore + ProgressStore + GroupStore
{
}
