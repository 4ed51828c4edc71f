//! Word-guess and attempt recording

use chrono::{DateTime, Utc};
use serde_json::json;
use versekeep_core::points::{self, PointEventType};
use versekeep_core::cooldown;

use super::{evaluate_mastery, update_daily_streak};
use crate::error::ApiError;
use crate::store::{ProgressStore, UserId, VerseStreak, WordProgress};

/// What a word guess earned the user.
#[derive(Debug, Clone, Copy)]
pub struct WordGuessOutcome {
    pub streak_length: i64,
    pub points_earned: i64,
}

/// Advance the word-guess streak for a correct word and award its points.
///
/// The streak continues only while the user stays on the same verse; guessing
/// a word of a different verse starts over at 1. Returns the new streak
/// length, the points added to the rollup, and whether this run is a new
/// all-time longest. The caller appends the matching ledger entry.
pub fn apply_correct_word<P: ProgressStore>(
    store: &P,
    user_id: UserId,
    reference: &str,
    now: DateTime<Utc>,
) -> Result<(i64, i64, bool), ApiError> {
    let mut stats = store.ensure_user_stats(user_id, now)?;

    let streak = if stats.current_verse_reference.as_deref() == Some(reference) {
        stats.current_verse_streak + 1
    } else {
        1
    };
    let is_new_longest = streak > stats.longest_word_guess_streak;
    let points_earned = points::word_points(streak);

    stats.total_points += points_earned;
    stats.current_verse_streak = streak;
    stats.current_verse_reference = Some(reference.to_string());
    stats.longest_word_guess_streak = stats.longest_word_guess_streak.max(streak);
    store.save_user_stats(&stats)?;

    update_verse_streak(store, user_id, reference, streak, is_new_longest, now)?;

    Ok((streak, points_earned, is_new_longest))
}

/// Propagate a correct-word streak to the per-verse streak row.
fn update_verse_streak<P: ProgressStore>(
    store: &P,
    user_id: UserId,
    reference: &str,
    streak: i64,
    is_new_longest: bool,
    now: DateTime<Utc>,
) -> Result<(), ApiError> {
    match store.get_verse_streak(user_id, reference)? {
        Some(mut row) => {
            row.current_guess_streak = streak;
            if is_new_longest || streak > row.longest_guess_streak {
                row.longest_guess_streak = row.longest_guess_streak.max(streak);
            }
            row.last_guess_date = now;
            store.save_verse_streak(&row)?;
        }
        None => {
            store.save_verse_streak(&VerseStreak {
                user_id,
                verse_reference: reference.to_string(),
                current_guess_streak: streak,
                longest_guess_streak: streak,
                last_guess_date: now,
            })?;
        }
    }
    Ok(())
}

/// Record one word guess: daily streak, word-slot upsert, then either the
/// streak advance with its ledger entry or the streak reset.
pub fn record_word_guess<P: ProgressStore>(
    store: &P,
    user_id: UserId,
    reference: &str,
    word_index: i64,
    word: &str,
    is_correct: bool,
    now: DateTime<Utc>,
) -> Result<WordGuessOutcome, ApiError> {
    update_daily_streak(store, user_id, now)?;

    store.upsert_word_progress(&WordProgress {
        user_id,
        verse_reference: reference.to_string(),
        word_index,
        word: word.to_string(),
        is_correct,
        updated_at: now,
    })?;

    if is_correct {
        let (streak_length, points_earned, is_new_longest) =
            apply_correct_word(store, user_id, reference, now)?;

        store.insert_point_event(
            user_id,
            PointEventType::WordCorrect,
            points_earned,
            json!({
                "verse_reference": reference,
                "word_index": word_index,
                "word": word,
                "streak_length": streak_length,
                "multiplier": points::multiplier(streak_length),
                "is_new_longest": is_new_longest,
            }),
            now,
        )?;

        Ok(WordGuessOutcome {
            streak_length,
            points_earned,
        })
    } else {
        // A miss resets the run but remembers which verse broke it.
        let mut stats = store.ensure_user_stats(user_id, now)?;
        stats.current_verse_streak = 0;
        stats.current_verse_reference = Some(reference.to_string());
        store.save_user_stats(&stats)?;

        if let Some(mut row) = store.get_verse_streak(user_id, reference)? {
            row.current_guess_streak = 0;
            row.last_guess_date = now;
            store.save_verse_streak(&row)?;
        }

        Ok(WordGuessOutcome {
            streak_length: 0,
            points_earned: 0,
        })
    }
}

/// Record a recitation attempt, enforcing the perfect-attempt cooldown, then
/// award points and run mastery detection.
pub fn record_attempt<P: ProgressStore>(
    store: &P,
    user_id: UserId,
    reference: &str,
    words_correct: i64,
    total_words: i64,
    now: DateTime<Utc>,
) -> Result<(), ApiError> {
    if words_correct == total_words {
        if let Some(last) = store.last_perfect_attempt(user_id, reference)? {
            if let Some(hours) = cooldown::hours_remaining(last, now) {
                return Err(ApiError::CooldownActive { hours });
            }
        }
    }

    update_daily_streak(store, user_id, now)?;

    store.insert_attempt(user_id, reference, words_correct, total_words, now)?;

    let points_earned = points::attempt_points(words_correct);
    let mut stats = store.ensure_user_stats(user_id, now)?;
    stats.total_points += points_earned;
    stats.total_attempts += 1;
    store.save_user_stats(&stats)?;

    store.insert_point_event(
        user_id,
        PointEventType::VerseAttempt,
        points_earned,
        json!({
            "verse_reference": reference,
            "words_correct": words_correct,
            "total_words": total_words,
        }),
        now,
    )?;

    evaluate_mastery(store, user_id, reference, now)?;

    Ok(())
}
