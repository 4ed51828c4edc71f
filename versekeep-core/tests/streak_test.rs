//! Multi-day streak progression scenarios

use chrono::{DateTime, TimeZone, Utc};
use versekeep_core::streak::{advance, StreakState, DAILY_STREAK_BONUS};

fn day(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, d, h, 0, 0).unwrap()
}

/// Drive the state machine the way the server does: apply each decision and
/// refresh the activity timestamp.
fn apply(state: &mut StreakState, now: DateTime<Utc>) -> Option<i64> {
    let decision = advance(state, now);
    state.current = decision.current;
    state.longest = decision.longest;
    state.last_activity = now;
    decision.bonus
}

#[test]
fn week_of_activity_builds_streak_with_bonuses() {
    let mut state = StreakState {
        current: 0,
        longest: 0,
        last_activity: day(1, 9),
        created_at: day(1, 9),
    };

    // First activity of all time.
    assert_eq!(apply(&mut state, day(1, 10)), None);
    assert_eq!(state.current, 1);

    // Six more consecutive days, each awarding the bonus.
    for d in 2..=7 {
        assert_eq!(apply(&mut state, day(d, 8)), Some(DAILY_STREAK_BONUS));
    }
    assert_eq!(state.current, 7);
    assert_eq!(state.longest, 7);
}

#[test]
fn second_activity_same_day_changes_nothing_but_timestamp() {
    let mut state = StreakState {
        current: 0,
        longest: 0,
        last_activity: day(1, 9),
        created_at: day(1, 9),
    };
    apply(&mut state, day(1, 10));
    apply(&mut state, day(2, 10));
    assert_eq!(state.current, 2);

    assert_eq!(apply(&mut state, day(2, 23)), None);
    assert_eq!(state.current, 2);
    assert_eq!(state.last_activity, day(2, 23));
}

#[test]
fn lapse_resets_then_rebuilds() {
    let mut state = StreakState {
        current: 0,
        longest: 0,
        last_activity: day(1, 9),
        created_at: day(1, 9),
    };
    apply(&mut state, day(1, 10));
    apply(&mut state, day(2, 10));
    apply(&mut state, day(3, 10));
    assert_eq!(state.current, 3);

    // Three silent days: first activity back resets to 0 with no increment.
    assert_eq!(apply(&mut state, day(7, 10)), None);
    assert_eq!(state.current, 0);
    assert_eq!(state.longest, 3);

    // A later event the same day starts the new streak at 1.
    assert_eq!(apply(&mut state, day(7, 12)), None);
    assert_eq!(state.current, 1);

    // And the next day continues it.
    assert_eq!(apply(&mut state, day(8, 12)), Some(DAILY_STREAK_BONUS));
    assert_eq!(state.current, 2);
    assert_eq!(state.longest, 3);
}
