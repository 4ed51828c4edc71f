//! Daily streak behavior driven over the HTTP surface

mod common;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use common::{create_test_server, day, get_stats, sign_in};

async fn post_points_at(
    server: &axum_test::TestServer,
    token: &str,
    at: DateTime<Utc>,
) {
    let response = server
        .post("/gamification/points")
        .authorization_bearer(token)
        .json(&json!({
            "event_type": "verse_added",
            "points": 5,
            "created_at": at,
        }))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_first_activity_starts_streak_at_one() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;

    post_points_at(&server, &token, day(0)).await;

    let stats = get_stats(&server, &token).await;
    assert_eq!(stats["current_streak"], 1);
    assert_eq!(stats["longest_streak"], 1);
    // No bonus for a streak of 1.
    assert!(stats["points_by_type"].get("daily_streak").is_none());
}

#[tokio::test]
async fn test_same_day_activity_is_idempotent() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;

    post_points_at(&server, &token, day(0)).await;
    post_points_at(&server, &token, day(0) + Duration::hours(3)).await;
    post_points_at(&server, &token, day(0) + Duration::hours(9)).await;

    let stats = get_stats(&server, &token).await;
    assert_eq!(stats["current_streak"], 1);
    assert!(stats["points_by_type"].get("daily_streak").is_none());
}

#[tokio::test]
async fn test_consecutive_days_increment_and_pay_bonus() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;

    post_points_at(&server, &token, day(0)).await;
    post_points_at(&server, &token, day(1)).await;
    post_points_at(&server, &token, day(2)).await;

    let stats = get_stats(&server, &token).await;
    assert_eq!(stats["current_streak"], 3);
    assert_eq!(stats["longest_streak"], 3);
    // 50 for day 2 and 50 for day 3.
    assert_eq!(stats["points_by_type"]["daily_streak"], 100);
    assert_eq!(stats["total_points"], 3 * 5 + 100);
}

#[tokio::test]
async fn test_gap_resets_without_increment() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;

    post_points_at(&server, &token, day(0)).await;
    post_points_at(&server, &token, day(1)).await;
    post_points_at(&server, &token, day(2)).await;

    // Two missed days: the streak resets to 0 on the day back.
    post_points_at(&server, &token, day(5)).await;
    let stats = get_stats(&server, &token).await;
    assert_eq!(stats["current_streak"], 0);
    assert_eq!(stats["longest_streak"], 3);

    // A second activity the same day restarts the count at 1, no bonus.
    post_points_at(&server, &token, day(5) + Duration::hours(2)).await;
    let stats = get_stats(&server, &token).await;
    assert_eq!(stats["current_streak"], 1);
    assert_eq!(stats["points_by_type"]["daily_streak"], 100);

    // From there the streak rebuilds and pays again on day two.
    post_points_at(&server, &token, day(6)).await;
    let stats = get_stats(&server, &token).await;
    assert_eq!(stats["current_streak"], 2);
    assert_eq!(stats["points_by_type"]["daily_streak"], 150);
}

#[tokio::test]
async fn test_longest_streak_never_decreases() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;

    for n in 0..4 {
        post_points_at(&server, &token, day(n)).await;
    }
    post_points_at(&server, &token, day(10)).await;
    post_points_at(&server, &token, day(11)).await;

    let stats = get_stats(&server, &token).await;
    assert_eq!(stats["current_streak"], 1);
    assert_eq!(stats["longest_streak"], 4);
}
