//! In-memory storage implementation
//!
//! Backs the integration tests and local development. One struct implements
//! every store trait, mirroring what the SQLite store does on disk.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;
use versekeep_core::PointEventType;

use super::{
    DailyPoints, Group, GroupId, GroupStore, MasteredVerse, PendingLogin, PointEvent,
    ProgressStore, Session, SessionStore, StoreResult, User, UserId, UserStats, UserStore,
    Verse, VerseAttempt, VerseStatus, VerseStore, VerseStreak, VerseUpdate, WordProgress,
};
use crate::error::ApiError;

/// In-memory datastore
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    pending_logins: RwLock<HashMap<String, PendingLogin>>,
    sessions: RwLock<HashMap<String, Session>>,
    verses: RwLock<HashMap<(UserId, String), Verse>>,
    stats: RwLock<HashMap<UserId, UserStats>>,
    verse_streaks: RwLock<HashMap<(UserId, String), VerseStreak>>,
    point_events: RwLock<Vec<PointEvent>>,
    word_progress: RwLock<HashMap<(UserId, String, i64), WordProgress>>,
    attempts: RwLock<Vec<VerseAttempt>>,
    mastered: RwLock<HashMap<(UserId, String), MasteredVerse>>,
    groups: RwLock<HashMap<GroupId, Group>>,
    members: RwLock<HashMap<GroupId, Vec<UserId>>>,
    next_user_id: AtomicI64,
    next_verse_id: AtomicI64,
    next_event_id: AtomicI64,
    next_attempt_id: AtomicI64,
    next_group_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            pending_logins: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            verses: RwLock::new(HashMap::new()),
            stats: RwLock::new(HashMap::new()),
            verse_streaks: RwLock::new(HashMap::new()),
            point_events: RwLock::new(Vec::new()),
            word_progress: RwLock::new(HashMap::new()),
            attempts: RwLock::new(Vec::new()),
            mastered: RwLock::new(HashMap::new()),
            groups: RwLock::new(HashMap::new()),
            members: RwLock::new(HashMap::new()),
            next_user_id: AtomicI64::new(1),
            next_verse_id: AtomicI64::new(1),
            next_event_id: AtomicI64::new(1),
            next_attempt_id: AtomicI64::new(1),
            next_group_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for MemoryStore {
    fn create_user(&self, email: &str, now: DateTime<Utc>) -> StoreResult<User> {
        let user = User {
            id: UserId(self.next_user_id.fetch_add(1, Ordering::SeqCst)),
            email: email.to_lowercase(),
            created_at: now,
            last_login_at: now,
        };
        self.users.write().unwrap().insert(user.id, user.clone());
        Ok(user)
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        Ok(self.users.read().unwrap().get(&user_id).cloned())
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let normalized = email.to_lowercase();
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.email == normalized)
            .cloned())
    }

    fn touch_last_login(&self, user_id: UserId, now: DateTime<Utc>) -> StoreResult<()> {
        let mut users = self.users.write().unwrap();
        match users.get_mut(&user_id) {
            Some(user) => {
                user.last_login_at = now;
                Ok(())
            }
            None => Err(ApiError::UserNotFound),
        }
    }

    fn anonymize_user(&self, user_id: UserId, placeholder: &str) -> StoreResult<()> {
        let mut users = self.users.write().unwrap();
        match users.get_mut(&user_id) {
            Some(user) => {
                user.email = placeholder.to_string();
                Ok(())
            }
            None => Err(ApiError::UserNotFound),
        }
    }

    fn create_pending_login(&self, pending: PendingLogin) -> StoreResult<()> {
        self.pending_logins
            .write()
            .unwrap()
            .insert(pending.code.clone(), pending);
        Ok(())
    }

    fn get_pending_login(&self, code: &str) -> StoreResult<Option<PendingLogin>> {
        Ok(self.pending_logins.read().unwrap().get(code).cloned())
    }

    fn delete_pending_login(&self, code: &str) -> StoreResult<()> {
        self.pending_logins.write().unwrap().remove(code);
        Ok(())
    }

    fn cleanup_expired_logins(&self, max_age_minutes: i64) -> StoreResult<u64> {
        let cutoff = Utc::now() - Duration::minutes(max_age_minutes);
        let mut pending = self.pending_logins.write().unwrap();
        let before = pending.len();
        pending.retain(|_, p| p.created_at > cutoff);
        Ok((before - pending.len()) as u64)
    }
}

impl SessionStore for MemoryStore {
    fn create_session(&self, user_id: UserId, ttl_days: i64) -> StoreResult<Session> {
        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id,
            created_at: now,
            expires_at: now + Duration::days(ttl_days),
        };
        self.sessions
            .write()
            .unwrap()
            .insert(session.token.clone(), session.clone());
        Ok(session)
    }

    fn get_session(&self, token: &str) -> StoreResult<Option<Session>> {
        let sessions = self.sessions.read().unwrap();
        Ok(sessions
            .get(token)
            .filter(|s| s.expires_at > Utc::now())
            .cloned())
    }

    fn delete_session(&self, token: &str) -> StoreResult<()> {
        self.sessions.write().unwrap().remove(token);
        Ok(())
    }

    fn delete_sessions_for_user(&self, user_id: UserId) -> StoreResult<()> {
        self.sessions
            .write()
            .unwrap()
            .retain(|_, s| s.user_id != user_id);
        Ok(())
    }
}

impl VerseStore for MemoryStore {
    fn add_verse(
        &self,
        user_id: UserId,
        reference: &str,
        text: &str,
        translation: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<Verse> {
        let key = (user_id, reference.to_string());
        let mut verses = self.verses.write().unwrap();
        if verses.contains_key(&key) {
            return Err(ApiError::VerseAlreadyExists);
        }
        let verse = Verse {
            id: self.next_verse_id.fetch_add(1, Ordering::SeqCst),
            user_id,
            reference: reference.to_string(),
            text: text.to_string(),
            translation: translation.map(str::to_string),
            status: VerseStatus::Learning,
            created_at: now,
        };
        verses.insert(key, verse.clone());
        Ok(verse)
    }

    fn get_verse(&self, user_id: UserId, reference: &str) -> StoreResult<Option<Verse>> {
        Ok(self
            .verses
            .read()
            .unwrap()
            .get(&(user_id, reference.to_string()))
            .cloned())
    }

    fn list_verses(&self, user_id: UserId) -> StoreResult<Vec<Verse>> {
        let mut verses: Vec<Verse> = self
            .verses
            .read()
            .unwrap()
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        verses.sort_by_key(|v| v.id);
        Ok(verses)
    }

    fn update_verse(
        &self,
        user_id: UserId,
        reference: &str,
        update: &VerseUpdate,
    ) -> StoreResult<Option<Verse>> {
        let mut verses = self.verses.write().unwrap();
        let Some(verse) = verses.get_mut(&(user_id, reference.to_string())) else {
            return Ok(None);
        };
        if let Some(text) = &update.text {
            verse.text = text.clone();
        }
        if let Some(translation) = &update.translation {
            verse.translation = Some(translation.clone());
        }
        if let Some(status) = update.status {
            verse.status = status;
        }
        Ok(Some(verse.clone()))
    }

    fn delete_verse_data(&self, user_id: UserId, reference: &str) -> StoreResult<bool> {
        let key = (user_id, reference.to_string());
        let removed = self.verses.write().unwrap().remove(&key).is_some();
        if !removed {
            return Ok(false);
        }
        self.word_progress
            .write()
            .unwrap()
            .retain(|(uid, vref, _), _| !(*uid == user_id && vref == reference));
        self.attempts
            .write()
            .unwrap()
            .retain(|a| !(a.user_id == user_id && a.verse_reference == reference));
        self.verse_streaks.write().unwrap().remove(&key);
        Ok(true)
    }
}

impl ProgressStore for MemoryStore {
    fn get_user_stats(&self, user_id: UserId) -> StoreResult<Option<UserStats>> {
        Ok(self.stats.read().unwrap().get(&user_id).cloned())
    }

    fn ensure_user_stats(&self, user_id: UserId, now: DateTime<Utc>) -> StoreResult<UserStats> {
        let mut stats = self.stats.write().unwrap();
        Ok(stats
            .entry(user_id)
            .or_insert_with(|| UserStats::new(user_id, now))
            .clone())
    }

    fn save_user_stats(&self, new_stats: &UserStats) -> StoreResult<()> {
        let mut stats = self.stats.write().unwrap();
        // Merge keeps the original creation timestamp, like the SQL upsert.
        let created_at = stats
            .get(&new_stats.user_id)
            .map(|s| s.created_at)
            .unwrap_or(new_stats.created_at);
        let mut row = new_stats.clone();
        row.created_at = created_at;
        stats.insert(row.user_id, row);
        Ok(())
    }

    fn get_verse_streak(
        &self,
        user_id: UserId,
        reference: &str,
    ) -> StoreResult<Option<VerseStreak>> {
        Ok(self
            .verse_streaks
            .read()
            .unwrap()
            .get(&(user_id, reference.to_string()))
            .cloned())
    }

    fn save_verse_streak(&self, streak: &VerseStreak) -> StoreResult<()> {
        self.verse_streaks.write().unwrap().insert(
            (streak.user_id, streak.verse_reference.clone()),
            streak.clone(),
        );
        Ok(())
    }

    fn upsert_word_progress(&self, progress: &WordProgress) -> StoreResult<()> {
        self.word_progress.write().unwrap().insert(
            (
                progress.user_id,
                progress.verse_reference.clone(),
                progress.word_index,
            ),
            progress.clone(),
        );
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
        let attempt = VerseAttempt {
            id: self.next_attempt_id.fetch_add(1, Ordering::SeqCst),
            user_id,
            verse_reference: reference.to_string(),
            words_correct,
            total_words,
            created_at: now,
        };
        self.attempts.write().unwrap().push(attempt);
        Ok(())
    }

    fn attempts_newest_first(
        &self,
        user_id: UserId,
        reference: &str,
    ) -> StoreResult<Vec<VerseAttempt>> {
        let mut attempts: Vec<VerseAttempt> = self
            .attempts
            .read()
            .unwrap()
            .iter()
            .filter(|a| a.user_id == user_id && a.verse_reference == reference)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(attempts)
    }

    fn last_perfect_attempt(
        &self,
        user_id: UserId,
        reference: &str,
    ) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(self
            .attempts
            .read()
            .unwrap()
            .iter()
            .filter(|a| {
                a.user_id == user_id
                    && a.verse_reference == reference
                    && a.words_correct == a.total_words
            })
            .map(|a| a.created_at)
            .max())
    }

    fn insert_point_event(
        &self,
        user_id: UserId,
        event_type: PointEventType,
        points: i64,
        metadata: serde_json::Value,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let event = PointEvent {
            id: self.next_event_id.fetch_add(1, Ordering::SeqCst),
            user_id,
            event_type,
            points,
            metadata,
            created_at: now,
        };
        self.point_events.write().unwrap().push(event);
        Ok(())
    }

    fn delete_point_events(&self, user_id: UserId) -> StoreResult<()> {
        self.point_events
            .write()
            .unwrap()
            .retain(|e| e.user_id != user_id);
        Ok(())
    }

    fn points_by_event_type(
        &self,
        user_id: UserId,
    ) -> StoreResult<Vec<(PointEventType, i64)>> {
        let events = self.point_events.read().unwrap();
        let mut totals: HashMap<PointEventType, i64> = HashMap::new();
        for event in events.iter().filter(|e| e.user_id == user_id) {
            *totals.entry(event.event_type).or_insert(0) += event.points;
        }
        let mut breakdown: Vec<(PointEventType, i64)> = totals.into_iter().collect();
        breakdown.sort_by_key(|(t, _)| t.as_str());
        Ok(breakdown)
    }

    fn daily_point_totals(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<DailyPoints>> {
        let events = self.point_events.read().unwrap();
        let mut totals: HashMap<chrono::NaiveDate, i64> = HashMap::new();
        for event in events
            .iter()
            .filter(|e| e.user_id == user_id && e.created_at >= since)
        {
            *totals.entry(event.created_at.date_naive()).or_insert(0) += event.points;
        }
        let mut days: Vec<DailyPoints> = totals
            .into_iter()
            .map(|(date, points)| DailyPoints { date, points })
            .collect();
        days.sort_by_key(|d| d.date);
        Ok(days)
    }

    fn points_since(
        &self,
        user_id: UserId,
        since: Option<DateTime<Utc>>,
    ) -> StoreResult<i64> {
        let events = self.point_events.read().unwrap();
        Ok(events
            .iter()
            .filter(|e| e.user_id == user_id && since.is_none_or(|s| e.created_at >= s))
            .map(|e| e.points)
            .sum())
    }

    fn insert_mastered(
        &self,
        user_id: UserId,
        reference: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.mastered.write().unwrap().insert(
            (user_id, reference.to_string()),
            MasteredVerse {
                user_id,
                verse_reference: reference.to_string(),
                mastered_at: now,
            },
        );
        Ok(())
    }

    fn get_mastered(
        &self,
        user_id: UserId,
        reference: &str,
    ) -> StoreResult<Option<MasteredVerse>> {
        Ok(self
            .mastered
            .read()
            .unwrap()
            .get(&(user_id, reference.to_string()))
            .cloned())
    }
}

impl GroupStore for MemoryStore {
    fn create_group(
        &self,
        name: &str,
        invite_code: &str,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> StoreResult<Group> {
        let group = Group {
            id: GroupId(self.next_group_id.fetch_add(1, Ordering::SeqCst)),
            name: name.to_string(),
            invite_code: invite_code.to_string(),
            created_by,
            created_at: now,
        };
        self.groups.write().unwrap().insert(group.id, group.clone());
        self.members
            .write()
            .unwrap()
            .insert(group.id, vec![created_by]);
        Ok(group)
    }

    fn get_group_by_invite(&self, invite_code: &str) -> StoreResult<Option<Group>> {
        Ok(self
            .groups
            .read()
            .unwrap()
            .values()
            .find(|g| g.invite_code == invite_code)
            .cloned())
    }

    fn get_group(&self, group_id: GroupId) -> StoreResult<Option<Group>> {
        Ok(self.groups.read().unwrap().get(&group_id).cloned())
    }

    fn add_member(
        &self,
        group_id: GroupId,
        user_id: UserId,
        _now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut members = self.members.write().unwrap();
        let group_members = members.entry(group_id).or_default();
        if !group_members.contains(&user_id) {
            group_members.push(user_id);
        }
        Ok(())
    }

    fn is_member(&self, group_id: GroupId, user_id: UserId) -> StoreResult<bool> {
        Ok(self
            .members
            .read()
            .unwrap()
            .get(&group_id)
            .is_some_and(|m| m.contains(&user_id)))
    }

    fn member_ids(&self, group_id: GroupId) -> StoreResult<Vec<UserId>> {
        Ok(self
            .members
            .read()
            .unwrap()
            .get(&group_id)
            .cloned()
            .unwrap_or_default())
    }
}
