//! Recitation attempt and perfect-attempt cooldown tests

mod common;

use axum::http::StatusCode;
use chrono::Duration;

use common::{add_verse, create_test_server, day, get_stats, post_attempt, sign_in};

#[tokio::test]
async fn test_attempt_awards_points_per_correct_word() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;
    add_verse(&server, &token, "John 3:16", "For God so loved the world").await;

    let response = post_attempt(&server, &token, "John 3:16", 4, 5, None).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);

    let stats = get_stats(&server, &token).await;
    assert_eq!(stats["total_attempts"], 1);
    assert_eq!(stats["points_by_type"]["verse_attempt"], 4);
}

#[tokio::test]
async fn test_attempt_requires_owned_verse() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;

    post_attempt(&server, &token, "Rev 22:21", 3, 5, None)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_attempt_validates_counts() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;
    add_verse(&server, &token, "John 3:16", "For God so loved the world").await;

    post_attempt(&server, &token, "John 3:16", 0, 0, None)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    post_attempt(&server, &token, "John 3:16", 6, 5, None)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    post_attempt(&server, &token, "John 3:16", -1, 5, None)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_second_perfect_attempt_hits_cooldown() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;
    add_verse(&server, &token, "John 3:16", "For God so loved the world").await;

    post_attempt(&server, &token, "John 3:16", 5, 5, Some(day(0)))
        .await
        .assert_status_ok();

    // Two hours later: 22 whole hours remain.
    let response = post_attempt(
        &server,
        &token,
        "John 3:16",
        5,
        5,
        Some(day(0) + Duration::hours(2)),
    )
    .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = response.json();
    assert_eq!(
        body["error"],
        "Perfect attempt already recorded for this verse. Try again in 22 hour(s)."
    );

    // The blocked attempt left no trace.
    let stats = get_stats(&server, &token).await;
    assert_eq!(stats["total_attempts"], 1);
}

#[tokio::test]
async fn test_cooldown_clears_after_24_hours() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;
    add_verse(&server, &token, "John 3:16", "For God so loved the world").await;

    post_attempt(&server, &token, "John 3:16", 5, 5, Some(day(0)))
        .await
        .assert_status_ok();
    post_attempt(&server, &token, "John 3:16", 5, 5, Some(day(1)))
        .await
        .assert_status_ok();

    let stats = get_stats(&server, &token).await;
    assert_eq!(stats["total_attempts"], 2);
}

#[tokio::test]
async fn test_imperfect_attempts_are_never_gated() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;
    add_verse(&server, &token, "John 3:16", "For God so loved the world").await;

    post_attempt(&server, &token, "John 3:16", 5, 5, Some(day(0)))
        .await
        .assert_status_ok();
    post_attempt(
        &server,
        &token,
        "John 3:16",
        4,
        5,
        Some(day(0) + Duration::hours(1)),
    )
    .await
    .assert_status_ok();

    let stats = get_stats(&server, &token).await;
    assert_eq!(stats["total_attempts"], 2);
}

#[tokio::test]
async fn test_cooldown_is_per_verse() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;
    add_verse(&server, &token, "John 3:16", "For God so loved the world").await;
    add_verse(&server, &token, "Ps 23:1", "The Lord is my shepherd").await;

    post_attempt(&server, &token, "John 3:16", 5, 5, Some(day(0)))
        .await
        .assert_status_ok();
    post_attempt(
        &server,
        &token,
        "Ps 23:1",
        5,
        5,
        Some(day(0) + Duration::hours(1)),
    )
    .await
    .assert_status_ok();
}
