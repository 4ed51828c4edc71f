//! Daily login streak state machine
//!
//! Streaks count consecutive UTC calendar days with at least one qualifying
//! activity. The transition rules have overlapping conditions whose precedence
//! matters; `advance` evaluates them in a fixed order so that calling it twice
//! on the same UTC day never increments twice.

use chrono::{DateTime, Duration, Utc};

/// Points awarded when a daily streak continues past its first day.
pub const DAILY_STREAK_BONUS: i64 = 50;

/// The streak-relevant slice of a user's stats row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakState {
    pub current: i64,
    pub longest: i64,
    pub last_activity: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// The result of advancing a streak to a new activity timestamp.
///
/// `last_activity` is always refreshed to the event time by the caller;
/// `bonus` carries the daily-streak award when an increment crosses day one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakDecision {
    pub current: i64,
    pub longest: i64,
    pub bonus: Option<i64>,
}

/// Advance the streak state for an activity at `now`.
///
/// Rules, in order of precedence:
/// 1. First-ever activity (last activity still equals row creation):
///    current = longest = 1.
/// 2. Last activity more than one calendar day ago: reset to 0 without
///    incrementing; the next day's activity starts a fresh streak.
/// 3. Last activity was yesterday: increment, raise longest, award the
///    bonus when the new streak exceeds one day.
/// 4. Last activity was today but the streak is still 0 (today's increment
///    has not happened yet): increment as in rule 3.
/// 5. Otherwise the streak already counted today; only the timestamp moves.
pub fn advance(state: &StreakState, now: DateTime<Utc>) -> StreakDecision {
    if state.last_activity == state.created_at {
        return StreakDecision {
            current: 1,
            longest: state.longest.max(1),
            bonus: None,
        };
    }

    let yesterday = (now - Duration::days(1)).date_naive();
    let last_day = state.last_activity.date_naive();

    if last_day < yesterday {
        return StreakDecision {
            current: 0,
            longest: state.longest,
            bonus: None,
        };
    }

    if last_day == yesterday || (last_day == now.date_naive() && state.current == 0) {
        let current = state.current + 1;
        let longest = state.longest.max(current);
        let bonus = (current > 1).then_some(DAILY_STREAK_BONUS);
        return StreakDecision {
            current,
            longest,
            bonus,
        };
    }

    StreakDecision {
        current: state.current,
        longest: state.longest,
        bonus: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn state(current: i64, longest: i64, last: DateTime<Utc>) -> StreakState {
        StreakState {
            current,
            longest,
            last_activity: last,
            created_at: at(1, 0),
        }
    }

    #[test]
    fn first_activity_initializes_to_one() {
        let s = StreakState {
            current: 0,
            longest: 0,
            last_activity: at(1, 0),
            created_at: at(1, 0),
        };
        let d = advance(&s, at(1, 12));
        assert_eq!(d.current, 1);
        assert_eq!(d.longest, 1);
        assert_eq!(d.bonus, None);
    }

    #[test]
    fn consecutive_day_increments() {
        let d = advance(&state(1, 1, at(2, 20)), at(3, 8));
        assert_eq!(d.current, 2);
        assert_eq!(d.longest, 2);
        assert_eq!(d.bonus, Some(DAILY_STREAK_BONUS));
    }

    #[test]
    fn gap_of_two_days_resets_without_increment() {
        let d = advance(&state(5, 5, at(2, 10)), at(5, 10));
        assert_eq!(d.current, 0);
        assert_eq!(d.longest, 5);
        assert_eq!(d.bonus, None);
    }

    #[test]
    fn same_day_after_reset_increments_once() {
        // A reset earlier today (case 2) leaves current at 0; the next call
        // on the same day starts the new streak at 1 without a bonus.
        let d = advance(&state(0, 5, at(5, 10)), at(5, 11));
        assert_eq!(d.current, 1);
        assert_eq!(d.longest, 5);
        assert_eq!(d.bonus, None);
    }

    #[test]
    fn same_day_repeat_is_idempotent() {
        let d = advance(&state(3, 4, at(3, 8)), at(3, 22));
        assert_eq!(d.current, 3);
        assert_eq!(d.longest, 4);
        assert_eq!(d.bonus, None);
    }

    #[test]
    fn bonus_only_past_first_day() {
        let d1 = advance(&state(0, 0, at(2, 9)), at(2, 10));
        assert_eq!(d1.current, 1);
        assert_eq!(d1.bonus, None);

        let d2 = advance(&state(1, 1, at(2, 10)), at(3, 10));
        assert_eq!(d2.current, 2);
        assert_eq!(d2.bonus, Some(DAILY_STREAK_BONUS));
    }

    #[test]
    fn current_never_exceeds_longest() {
        let mut s = state(0, 0, at(1, 0));
        s.created_at = at(1, 0);
        for day in 1..10 {
            let d = advance(&s, at(day, 12));
            assert!(d.current <= d.longest);
            s.current = d.current;
            s.longest = d.longest;
            s.last_activity = at(day, 12);
        }
    }

    #[test]
    fn day_boundary_uses_calendar_dates_not_elapsed_hours() {
        // 23:00 yesterday to 01:00 today is two hours apart but still counts
        // as a consecutive calendar day.
        let d = advance(&state(2, 2, at(2, 23)), at(3, 1));
        assert_eq!(d.current, 3);
    }
}
