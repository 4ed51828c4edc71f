//! Daily streak updates and verse-streak resets

use chrono::{DateTime, Utc};
use serde_json::json;
use versekeep_core::points::PointEventType;
use versekeep_core::streak::{self, StreakState};

use crate::error::ApiError;
use crate::store::{ProgressStore, UserId};

/// Apply a qualifying activity at `now` to the user's daily streak.
///
/// No-op when the user has no stats row yet; the row appears with the first
/// scored event, and the next activity initializes the streak. When an
/// increment crosses day one, the daily-streak bonus is added to the rollup
/// and logged to the ledger together.
pub fn update_daily_streak<P: ProgressStore>(
    store: &P,
    user_id: UserId,
    now: DateTime<Utc>,
) -> Result<(), ApiError> {
    let Some(mut stats) = store.get_user_stats(user_id)? else {
        return Ok(());
    };

    let state = StreakState {
        current: stats.current_streak,
        longest: stats.longest_streak,
        last_activity: stats.last_activity_date,
        created_at: stats.created_at,
    };
    let decision = streak::advance(&state, now);

    stats.current_streak = decision.current;
    stats.longest_streak = decision.longest;
    stats.last_activity_date = now;
    if let Some(bonus) = decision.bonus {
        stats.total_points += bonus;
        store.save_user_stats(&stats)?;
        store.insert_point_event(
            user_id,
            PointEventType::DailyStreak,
            bonus,
            json!({ "streak_days": decision.current }),
            now,
        )?;
    } else {
        store.save_user_stats(&stats)?;
    }

    Ok(())
}

/// Zero the global current-verse streak and the per-verse streak row.
///
/// Used by the explicit reset endpoint and the RESET sentinel; the longest
/// streaks are untouched.
pub fn reset_verse_streak<P: ProgressStore>(
    store: &P,
    user_id: UserId,
    reference: &str,
    now: DateTime<Utc>,
) -> Result<(), ApiError> {
    if let Some(mut stats) = store.get_user_stats(user_id)? {
        stats.current_verse_streak = 0;
        stats.current_verse_reference = None;
        store.save_user_stats(&stats)?;
    }

    if let Some(mut verse_streak) = store.get_verse_streak(user_id, reference)? {
        verse_streak.current_guess_streak = 0;
        verse_streak.last_guess_date = now;
        store.save_verse_streak(&verse_streak)?;
    }

    Ok(())
}
