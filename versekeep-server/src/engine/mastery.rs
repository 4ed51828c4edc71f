//! Mastery detection and status reporting

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use versekeep_core::mastery::{self, Attempt};
use versekeep_core::points::{PointEventType, MASTERY_BONUS};

use crate::error::ApiError;
use crate::store::{ProgressStore, UserId, VerseAttempt};

fn as_history(attempts: &[VerseAttempt]) -> Vec<Attempt> {
    attempts
        .iter()
        .map(|a| Attempt {
            words_correct: a.words_correct,
            total_words: a.total_words,
        })
        .collect()
}

/// Check whether the verse's attempt history has newly reached mastery, and
/// if so record it exactly once: the permanent record, the 500-point ledger
/// entry, and the stats rollup move together.
pub fn evaluate_mastery<P: ProgressStore>(
    store: &P,
    user_id: UserId,
    reference: &str,
    now: DateTime<Utc>,
) -> Result<bool, ApiError> {
    let attempts = store.attempts_newest_first(user_id, reference)?;
    if !mastery::qualifies(&as_history(&attempts)) {
        return Ok(false);
    }

    if store.get_mastered(user_id, reference)?.is_some() {
        return Ok(false);
    }

    store.insert_mastered(user_id, reference, now)?;
    store.insert_point_event(
        user_id,
        PointEventType::MasteryAchieved,
        MASTERY_BONUS,
        json!({ "verse_reference": reference }),
        now,
    )?;

    let mut stats = store.ensure_user_stats(user_id, now)?;
    stats.verses_mastered += 1;
    stats.total_points += MASTERY_BONUS;
    store.save_user_stats(&stats)?;

    tracing::info!(user_id = user_id.0, reference = %reference, "Verse mastered");

    Ok(true)
}

/// Mastery progress for one verse, as reported to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryStatus {
    pub perfect_attempts_in_row: i64,
    pub recorded_attempts: i64,
    pub last_attempt_date: Option<DateTime<Utc>>,
    pub total_attempts: i64,
    pub is_mastered: bool,
    pub mastery_date: Option<DateTime<Utc>>,
}

/// Build the mastery status report for a verse.
///
/// `recorded_attempts` counts attempts at this verse; `total_attempts` is the
/// user's global counter from the stats rollup.
pub fn mastery_status<P: ProgressStore>(
    store: &P,
    user_id: UserId,
    reference: &str,
) -> Result<MasteryStatus, ApiError> {
    let attempts = store.attempts_newest_first(user_id, reference)?;
    let mastered = store.get_mastered(user_id, reference)?;
    let total_attempts = store
        .get_user_stats(user_id)?
        .map(|s| s.total_attempts)
        .unwrap_or(0);

    Ok(MasteryStatus {
        perfect_attempts_in_row: mastery::perfect_run_length(&as_history(&attempts)) as i64,
        recorded_attempts: attempts.len() as i64,
        last_attempt_date: attempts.first().map(|a| a.created_at),
        total_attempts,
        is_mastered: mastered.is_some(),
        mastery_date: mastered.map(|m| m.mastered_at),
    })
}
