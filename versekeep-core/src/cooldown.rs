//! Perfect-attempt cooldown arithmetic
//!
//! Perfect attempts are rate-limited to one per 24 wall-clock hours per verse.
//! Unlike the daily streak this deliberately keys off elapsed time, not
//! calendar-day boundaries.

use chrono::{DateTime, Duration, Utc};

/// Hours a perfect attempt locks out further perfect attempts on a verse.
pub const PERFECT_COOLDOWN_HOURS: i64 = 24;

/// Whole hours remaining before another perfect attempt is allowed.
///
/// Returns `None` once the cooldown has elapsed; otherwise the ceiling of the
/// remaining time in hours, suitable for a retry-after message.
pub fn hours_remaining(last_perfect: DateTime<Utc>, now: DateTime<Utc>) -> Option<i64> {
    let elapsed = now - last_perfect;
    let remaining = Duration::hours(PERFECT_COOLDOWN_HOURS) - elapsed;
    if remaining <= Duration::zero() {
        return None;
    }
    Some((remaining.num_seconds() + 3599) / 3600)
}
