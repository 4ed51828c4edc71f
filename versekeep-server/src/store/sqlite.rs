//! SQLite-based storage implementation

use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;
use versekeep_core::PointEventType;

use super::{
    DailyPoints, Group, GroupId, GroupStore, MasteredVerse, PendingLogin, ProgressStore,
    Session, SessionStore, StoreResult, User, UserId, UserStats, UserStore, Verse,
    VerseAttempt, VerseStatus, VerseStore, VerseStreak, VerseUpdate, WordProgress,
};
use crate::error::ApiError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// SQLite-based datastore implementing every store trait
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, ApiError> {
        let conn = Connection::open(path)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), ApiError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, ApiError> {
        let table_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        Ok(conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })?)
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), ApiError> {
        conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Users (anonymized, never hard-deleted)
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL,
                last_login_at TEXT NOT NULL
            );

            -- Pending magic-link logins, keyed by the one-time code
            CREATE TABLE IF NOT EXISTS pending_logins (
                code TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_pending_logins_email ON pending_logins(email);

            -- Bearer-token sessions
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);

            -- Memorization items
            CREATE TABLE IF NOT EXISTS verses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                reference TEXT NOT NULL,
                text TEXT NOT NULL,
                translation TEXT,
                status TEXT NOT NULL DEFAULT 'learning',
                created_at TEXT NOT NULL,
                UNIQUE(user_id, reference)
            );

            -- Denormalized per-user statistics rollup
            CREATE TABLE IF NOT EXISTS user_stats (
                user_id INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                total_points INTEGER NOT NULL DEFAULT 0,
                current_streak INTEGER NOT NULL DEFAULT 0,
                longest_streak INTEGER NOT NULL DEFAULT 0,
                verses_mastered INTEGER NOT NULL DEFAULT 0,
                total_attempts INTEGER NOT NULL DEFAULT 0,
                last_activity_date TEXT NOT NULL,
                current_verse_streak INTEGER NOT NULL DEFAULT 0,
                current_verse_reference TEXT,
                longest_word_guess_streak INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            -- Per-verse guess streaks
            CREATE TABLE IF NOT EXISTS verse_streaks (
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                verse_reference TEXT NOT NULL,
                current_guess_streak INTEGER NOT NULL DEFAULT 0,
                longest_guess_streak INTEGER NOT NULL DEFAULT 0,
                last_guess_date TEXT NOT NULL,
                PRIMARY KEY (user_id, verse_reference)
            );

            -- Append-only point-event ledger
            CREATE TABLE IF NOT EXISTS point_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                event_type TEXT NOT NULL,
                points INTEGER NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_point_events_user_created
                ON point_events(user_id, created_at);

            -- Last attempt per word slot (upserted)
            CREATE TABLE IF NOT EXISTS word_progress (
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                verse_reference TEXT NOT NULL,
                word_index INTEGER NOT NULL,
                word TEXT NOT NULL,
                is_correct INTEGER NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, verse_reference, word_index)
            );

            -- Append-only recitation attempts
            CREATE TABLE IF NOT EXISTS verse_attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                verse_reference TEXT NOT NULL,
                words_correct INTEGER NOT NULL,
                total_words INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_verse_attempts_user_verse
                ON verse_attempts(user_id, verse_reference, created_at);

            -- Permanent mastery records
            CREATE TABLE IF NOT EXISTS mastered_verses (
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                verse_reference TEXT NOT NULL,
                mastered_at TEXT NOT NULL,
                PRIMARY KEY (user_id, verse_reference)
            );

            -- Leaderboard groups
            CREATE TABLE IF NOT EXISTS groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                invite_code TEXT NOT NULL UNIQUE,
                created_by INTEGER NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS group_members (
                group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                joined_at TEXT NOT NULL,
                PRIMARY KEY (group_id, user_id)
            );
            "#,
        )?;

        Ok(())
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get(0)?),
        email: row.get(1)?,
        created_at: parse_ts(&row.get::<_, String>(2)?),
        last_login_at: parse_ts(&row.get::<_, String>(3)?),
    })
}

fn verse_from_row(row: &Row<'_>) -> rusqlite::Result<Verse> {
    let status: String = row.get(5)?;
    Ok(Verse {
        id: row.get(0)?,
        user_id: UserId(row.get(1)?),
        reference: row.get(2)?,
        text: row.get(3)?,
        translation: row.get(4)?,
        status: VerseStatus::from_str(&status).unwrap_or(VerseStatus::Learning),
        created_at: parse_ts(&row.get::<_, String>(6)?),
    })
}

fn stats_from_row(row: &Row<'_>) -> rusqlite::Result<UserStats> {
    Ok(UserStats {
        user_id: UserId(row.get(0)?),
        total_points: row.get(1)?,
        current_streak: row.get(2)?,
        longest_streak: row.get(3)?,
        verses_mastered: row.get(4)?,
        total_attempts: row.get(5)?,
        last_activity_date: parse_ts(&row.get::<_, String>(6)?),
        current_verse_streak: row.get(7)?,
        current_verse_reference: row.get(8)?,
        longest_word_guess_streak: row.get(9)?,
        created_at: parse_ts(&row.get::<_, String>(10)?),
    })
}

fn attempt_from_row(row: &Row<'_>) -> rusqlite::Result<VerseAttempt> {
    Ok(VerseAttempt {
        id: row.get(0)?,
        user_id: UserId(row.get(1)?),
        verse_reference: row.get(2)?,
        words_correct: row.get(3)?,
        total_words: row.get(4)?,
        created_at: parse_ts(&row.get::<_, String>(5)?),
    })
}

impl UserStore for SqliteStore {
    fn create_user(&self, email: &str, now: DateTime<Utc>) -> StoreResult<User> {
        let normalized = email.to_lowercase();
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO users (email, created_at, last_login_at) VALUES (?1, ?2, ?3)",
            params![normalized, now.to_rfc3339(), now.to_rfc3339()],
        )?;

        Ok(User {
            id: UserId(conn.last_insert_rowid()),
            email: normalized,
            created_at: now,
            last_login_at: now,
        })
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id, email, created_at, last_login_at FROM users WHERE id = ?1",
                params![user_id.0],
                user_from_row,
            )
            .optional()?)
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let normalized = email.to_lowercase();
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id, email, created_at, last_login_at FROM users WHERE email = ?1",
                params![normalized],
                user_from_row,
            )
            .optional()?)
    }

    fn touch_last_login(&self, user_id: UserId, now: DateTime<Utc>) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE users SET last_login_at = ?1 WHERE id = ?2",
            params![now.to_rfc3339(), user_id.0],
        )?;
        if rows == 0 {
            return Err(ApiError::UserNotFound);
        }
        Ok(())
    }

    fn anonymize_user(&self, user_id: UserId, placeholder: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE users SET email = ?1 WHERE id = ?2",
            params![placeholder, user_id.0],
        )?;
        if rows == 0 {
            return Err(ApiError::UserNotFound);
        }
        Ok(())
    }

    fn create_pending_login(&self, pending: PendingLogin) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO pending_logins (code, email, created_at) VALUES (?1, ?2, ?3)",
            params![
                pending.code,
                pending.email.to_lowercase(),
                pending.created_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn get_pending_login(&self, code: &str) -> StoreResult<Option<PendingLogin>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT code, email, created_at FROM pending_logins WHERE code = ?1",
                params![code],
                |row| {
                    Ok(PendingLogin {
                        code: row.get(0)?,
                        email: row.get(1)?,
                        created_at: parse_ts(&row.get::<_, String>(2)?),
                    })
                },
            )
            .optional()?)
    }

    fn delete_pending_login(&self, code: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM pending_logins WHERE code = ?1", params![code])?;
        Ok(())
    }

    fn cleanup_expired_logins(&self, max_age_minutes: i64) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();
        let cutoff = (Utc::now() - Duration::minutes(max_age_minutes)).to_rfc3339();
        let rows = conn.execute(
            "DELETE FROM pending_logins WHERE created_at < ?1",
            params![cutoff],
        )?;
        Ok(rows as u64)
    }
}

impl SessionStore for SqliteStore {
    fn create_session(&self, user_id: UserId, ttl_days: i64) -> StoreResult<Session> {
        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id,
            created_at: now,
            expires_at: now + Duration::days(ttl_days),
        };

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token,
                session.user_id.0,
                session.created_at.to_rfc3339(),
                session.expires_at.to_rfc3339(),
            ],
        )?;

        Ok(session)
    }

    fn get_session(&self, token: &str) -> StoreResult<Option<Session>> {
        let conn = self.conn.lock().unwrap();
        let session = conn
            .query_row(
                "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = ?1",
                params![token],
                |row| {
                    Ok(Session {
                        token: row.get(0)?,
                        user_id: UserId(row.get(1)?),
                        created_at: parse_ts(&row.get::<_, String>(2)?),
                        expires_at: parse_ts(&row.get::<_, String>(3)?),
                    })
                },
            )
            .optional()?;

        Ok(session.filter(|s| s.expires_at > Utc::now()))
    }

    fn delete_session(&self, token: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(())
    }

    fn delete_sessions_for_user(&self, user_id: UserId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM sessions WHERE user_id = ?1",
            params![user_id.0],
        )?;
        Ok(())
    }
}

impl VerseStore for SqliteStore {
    fn add_verse(
        &self,
        user_id: UserId,
        reference: &str,
        text: &str,
        translation: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<Verse> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO verses (user_id, reference, text, translation, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id.0,
                reference,
                text,
                translation,
                VerseStatus::Learning.as_str(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| {
            if let rusqlite::Error::SqliteFailure(ref err, _) = e {
                if err.code == rusqlite::ErrorCode::ConstraintViolation {
                    return ApiError::VerseAlreadyExists;
                }
            }
            ApiError::Database(e)
        })?;

        Ok(Verse {
            id: conn.last_insert_rowid(),
            user_id,
            reference: reference.to_string(),
            text: text.to_string(),
            translation: translation.map(str::to_string),
            status: VerseStatus::Learning,
            created_at: now,
        })
    }

    fn get_verse(&self, user_id: UserId, reference: &str) -> StoreResult<Option<Verse>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id, user_id, reference, text, translation, status, created_at
                 FROM verses WHERE user_id = ?1 AND reference = ?2",
                params![user_id.0, reference],
                verse_from_row,
            )
            .optional()?)
    }

    fn list_verses(&self, user_id: UserId) -> StoreResult<Vec<Verse>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, reference, text, translation, status, created_at
             FROM verses WHERE user_id = ?1 ORDER BY id",
        )?;
        let verses = stmt
            .query_map(params![user_id.0], verse_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(verses)
    }

    fn update_verse(
        &self,
        user_id: UserId,
        reference: &str,
        update: &VerseUpdate,
    ) -> StoreResult<Option<Verse>> {
        {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "UPDATE verses SET
                     text = COALESCE(?1, text),
                     translation = COALESCE(?2, translation),
                     status = COALESCE(?3, status)
                 WHERE user_id = ?4 AND reference = ?5",
                params![
                    update.text,
                    update.translation,
                    update.status.map(|s| s.as_str()),
                    user_id.0,
                    reference,
                ],
            )?;
        }
        self.get_verse(user_id, reference)
    }

    fn delete_verse_data(&self, user_id: UserId, reference: &str) -> StoreResult<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let removed = tx.execute(
            "DELETE FROM verses WHERE user_id = ?1 AND reference = ?2",
            params![user_id.0, reference],
        )?;
        if removed == 0 {
            return Ok(false);
        }
        tx.execute(
            "DELETE FROM word_progress WHERE user_id = ?1 AND verse_reference = ?2",
            params![user_id.0, reference],
        )?;
        tx.execute(
            "DELETE FROM verse_attempts WHERE user_id = ?1 AND verse_reference = ?2",
            params![user_id.0, reference],
        )?;
        tx.execute(
            "DELETE FROM verse_streaks WHERE user_id = ?1 AND verse_reference = ?2",
            params![user_id.0, reference],
        )?;

        tx.commit()?;
        Ok(true)
    }
}

impl ProgressStore for SqliteStore {
    fn get_user_stats(&self, user_id: UserId) -> StoreResult<Option<UserStats>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT user_id, total_points, current_streak, longest_streak,
                        verses_mastered, total_attempts, last_activity_date,
                        current_verse_streak, current_verse_reference,
                        longest_word_guess_streak, created_at
                 FROM user_stats WHERE user_id = ?1",
                params![user_id.0],
                stats_from_row,
            )
            .optional()?)
    }

    fn ensure_user_stats(&self, user_id: UserId, now: DateTime<Utc>) -> StoreResult<UserStats> {
        if let Some(stats) = self.get_user_stats(user_id)? {
            return Ok(stats);
        }
        let stats = UserStats::new(user_id, now);
        self.save_user_stats(&stats)?;
        Ok(stats)
    }

    fn save_user_stats(&self, stats: &UserStats) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_stats (user_id, total_points, current_streak, longest_streak,
                                     verses_mastered, total_attempts, last_activity_date,
                                     current_verse_streak, current_verse_reference,
                                     longest_word_guess_streak, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(user_id) DO UPDATE SET
                 total_points = excluded.total_points,
                 current_streak = excluded.current_streak,
                 longest_streak = excluded.longest_streak,
                 verses_mastered = excluded.verses_mastered,
                 total_attempts = excluded.total_attempts,
                 last_activity_date = excluded.last_activity_date,
                 current_verse_streak = excluded.current_verse_streak,
                 current_verse_reference = excluded.current_verse_reference,
                 longest_word_guess_streak = excluded.longest_word_guess_streak",
            params![
                stats.user_id.0,
                stats.total_points,
                stats.current_streak,
                stats.longest_streak,
                stats.verses_mastered,
                stats.total_attempts,
                stats.last_activity_date.to_rfc3339(),
                stats.current_verse_streak,
                stats.current_verse_reference,
                stats.longest_word_guess_streak,
                stats.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_verse_streak(
        &self,
        user_id: UserId,
        reference: &str,
    ) -> StoreResult<Option<VerseStreak>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT user_id, verse_reference, current_guess_streak,
                        longest_guess_streak, last_guess_date
                 FROM verse_streaks WHERE user_id = ?1 AND verse_reference = ?2",
                params![user_id.0, reference],
                |row| {
                    Ok(VerseStreak {
                        user_id: UserId(row.get(0)?),
                        verse_reference: row.get(1)?,
                        current_guess_streak: row.get(2)?,
                        longest_guess_streak: row.get(3)?,
                        last_guess_date: parse_ts(&row.get::<_, String>(4)?),
                    })
                },
            )
            .optional()?)
    }

    fn save_verse_streak(&self, streak: &VerseStreak) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO verse_streaks (user_id, verse_reference, current_guess_streak,
                                        longest_guess_streak, last_guess_date)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, verse_reference) DO UPDATE SET
                 current_guess_streak = excluded.current_guess_streak,
                 longest_guess_streak = excluded.longest_guess_streak,
                 last_guess_date = excluded.last_guess_date",
            params![
                streak.user_id.0,
                streak.verse_reference,
                streak.current_guess_streak,
                streak.longest_guess_streak,
                streak.last_guess_date.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn upsert_word_progress(&self, progress: &WordProgress) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO word_progress (user_id, verse_reference, word_index, word,
                                        is_correct, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id, verse_reference, word_index) DO UPDATE SET
                 word = excluded.word,
                 is_correct = excluded.is_correct,
                 updated_at = excluded.updated_at",
            params![
                progress.user_id.0,
                progress.verse_reference,
                progress.word_index,
                progress.word,
                progress.is_correct as i32,
                progress.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn insert_attempt(
        &self,
        user_id: UserId,
        reference: &str,
        words_correct: i64,
        total_words: i64,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO verse_attempts (user_id, verse_reference, words_correct,
                                         total_words, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user_id.0,
                reference,
                words_correct,
                total_words,
                now.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn attempts_newest_first(
        &self,
        user_id: UserId,
        reference: &str,
    ) -> StoreResult<Vec<VerseAttempt>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, verse_reference, words_correct, total_words, created_at
             FROM verse_attempts WHERE user_id = ?1 AND verse_reference = ?2
             ORDER BY created_at DESC, id DESC",
        )?;
        let attempts = stmt
            .query_map(params![user_id.0, reference], attempt_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(attempts)
    }

    fn last_perfect_attempt(
        &self,
        user_id: UserId,
        reference: &str,
    ) -> StoreResult<Option<DateTime<Utc>>> {
        let conn = self.conn.lock().unwrap();
        let ts: Option<String> = conn
            .query_row(
                "SELECT created_at FROM verse_attempts
                 WHERE user_id = ?1 AND verse_reference = ?2
                   AND words_correct = total_words
                 ORDER BY created_at DESC LIMIT 1",
                params![user_id.0, reference],
                |row| row.get(0),
            )
            .optional()?;
        Ok(ts.as_deref().map(parse_ts))
    }

    fn insert_point_event(
        &self,
        user_id: UserId,
        event_type: PointEventType,
        points: i64,
        metadata: serde_json::Value,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO point_events (user_id, event_type, points, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user_id.0,
                event_type.as_str(),
                points,
                metadata.to_string(),
                now.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn delete_point_events(&self, user_id: UserId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM point_events WHERE user_id = ?1",
            params![user_id.0],
        )?;
        Ok(())
    }

    fn points_by_event_type(
        &self,
        user_id: UserId,
    ) -> StoreResult<Vec<(PointEventType, i64)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT event_type, SUM(points) FROM point_events
             WHERE user_id = ?1 GROUP BY event_type ORDER BY event_type",
        )?;
        let rows = stmt
            .query_map(params![user_id.0], |row| {
                let event_type: String = row.get(0)?;
                let points: i64 = row.get(1)?;
                Ok((event_type, points))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(t, p)| PointEventType::from_str(&t).map(|t| (t, p)))
            .collect())
    }

    fn daily_point_totals(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<DailyPoints>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT DATE(created_at), SUM(points) FROM point_events
             WHERE user_id = ?1 AND created_at >= ?2
             GROUP BY DATE(created_at) ORDER BY DATE(created_at)",
        )?;
        let rows = stmt
            .query_map(params![user_id.0, since.to_rfc3339()], |row| {
                let date: String = row.get(0)?;
                let points: i64 = row.get(1)?;
                Ok((date, points))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(date, points)| {
                NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                    .ok()
                    .map(|date| DailyPoints { date, points })
            })
            .collect())
    }

    fn points_since(
        &self,
        user_id: UserId,
        since: Option<DateTime<Utc>>,
    ) -> StoreResult<i64> {
        let conn = self.conn.lock().unwrap();
        let total: Option<i64> = match since {
            Some(since) => conn.query_row(
                "SELECT SUM(points) FROM point_events WHERE user_id = ?1 AND created_at >= ?2",
                params![user_id.0, since.to_rfc3339()],
                |row| row.get(0),
            )?,
            None => conn.query_row(
                "SELECT SUM(points) FROM point_events WHERE user_id = ?1",
                params![user_id.0],
                |row| row.get(0),
            )?,
        };
        Ok(total.unwrap_or(0))
    }

    fn insert_mastered(
        &self,
        user_id: UserId,
        reference: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO mastered_verses (user_id, verse_reference, mastered_at)
             VALUES (?1, ?2, ?3)",
            params![user_id.0, reference, now.to_rfc3339()],
        )?;
        Ok(())
    }

    fn get_mastered(
        &self,
        user_id: UserId,
        reference: &str,
    ) -> StoreResult<Option<MasteredVerse>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT user_id, verse_reference, mastered_at FROM mastered_verses
                 WHERE user_id = ?1 AND verse_reference = ?2",
                params![user_id.0, reference],
                |row| {
                    Ok(MasteredVerse {
                        user_id: UserId(row.get(0)?),
                        verse_reference: row.get(1)?,
                        mastered_at: parse_ts(&row.get::<_, String>(2)?),
                    })
                },
            )
            .optional()?)
    }
}

impl GroupStore for SqliteStore {
    fn create_group(
        &self,
        name: &str,
        invite_code: &str,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> StoreResult<Group> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO groups (name, invite_code, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, invite_code, created_by.0, now.to_rfc3339()],
        )?;
        let id = GroupId(tx.last_insert_rowid());
        tx.execute(
            "INSERT INTO group_members (group_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
            params![id.0, created_by.0, now.to_rfc3339()],
        )?;

        tx.commit()?;

        Ok(Group {
            id,
            name: name.to_string(),
            invite_code: invite_code.to_string(),
            created_by,
            created_at: now,
        })
    }

    fn get_group_by_invite(&self, invite_code: &str) -> StoreResult<Option<Group>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id, name, invite_code, created_by, created_at FROM groups
                 WHERE invite_code = ?1",
                params![invite_code],
                group_from_row,
            )
            .optional()?)
    }

    fn get_group(&self, group_id: GroupId) -> StoreResult<Option<Group>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT id, name, invite_code, created_by, created_at FROM groups
                 WHERE id = ?1",
                params![group_id.0],
                group_from_row,
            )
            .optional()?)
    }

    fn add_member(
        &self,
        group_id: GroupId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO group_members (group_id, user_id, joined_at)
             VALUES (?1, ?2, ?3)",
            params![group_id.0, user_id.0, now.to_rfc3339()],
        )?;
        Ok(())
    }

    fn is_member(&self, group_id: GroupId, user_id: UserId) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM group_members WHERE group_id = ?1 AND user_id = ?2",
            params![group_id.0, user_id.0],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn member_ids(&self, group_id: GroupId) -> StoreResult<Vec<UserId>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id FROM group_members WHERE group_id = ?1 ORDER BY joined_at",
        )?;
        let ids = stmt
            .query_map(params![group_id.0], |row| Ok(UserId(row.get(0)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: GroupId(row.get(0)?),
        name: row.get(1)?,
        invite_code: row.get(2)?,
        created_by: UserId(row.get(3)?),
        created_at: parse_ts(&row.get::<_, String>(4)?),
    })
}
