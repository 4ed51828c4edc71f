//! Verse CRUD tests

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{add_verse, create_test_server, get_stats, post_attempt, sign_in};

#[tokio::test]
async fn test_add_verse_awards_points() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;

    let response = server
        .post("/verses")
        .authorization_bearer(&token)
        .json(&json!({
            "reference": "John 3:16",
            "text": "For God so loved the world",
            "translation": "ESV",
        }))
        .await;
    response.assert_status_ok();

    let verse: serde_json::Value = response.json();
    assert_eq!(verse["reference"], "John 3:16");
    assert_eq!(verse["translation"], "ESV");
    assert_eq!(verse["status"], "learning");

    let stats = get_stats(&server, &token).await;
    assert_eq!(stats["total_points"], 10);
    assert_eq!(stats["points_by_type"]["verse_added"], 10);
}

#[tokio::test]
async fn test_duplicate_reference_conflicts() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;
    add_verse(&server, &token, "John 3:16", "For God so loved the world").await;

    let response = server
        .post("/verses")
        .authorization_bearer(&token)
        .json(&json!({ "reference": "John 3:16", "text": "again" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_add_verse_validates_fields() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;

    server
        .post("/verses")
        .authorization_bearer(&token)
        .json(&json!({ "reference": "  ", "text": "words" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .post("/verses")
        .authorization_bearer(&token)
        .json(&json!({ "reference": "Ps 23:1", "text": "" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_and_get_verses() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;
    add_verse(&server, &token, "John 3:16", "For God so loved the world").await;
    add_verse(&server, &token, "Ps 23:1", "The Lord is my shepherd").await;

    let response = server.get("/verses").authorization_bearer(&token).await;
    response.assert_status_ok();
    let verses: serde_json::Value = response.json();
    assert_eq!(verses.as_array().unwrap().len(), 2);

    let response = server
        .get("/verses/Ps%2023:1")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let verse: serde_json::Value = response.json();
    assert_eq!(verse["text"], "The Lord is my shepherd");

    server
        .get("/verses/Rev%2022:21")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_verses_are_per_user() {
    let (server, email_sender) = create_test_server();
    let alice = sign_in(&server, &email_sender, "alice@example.com").await;
    let bob = sign_in(&server, &email_sender, "bob@example.com").await;
    add_verse(&server, &alice, "John 3:16", "For God so loved the world").await;

    server
        .get("/verses/John%203:16")
        .authorization_bearer(&bob)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_verse() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;
    add_verse(&server, &token, "John 3:16", "For God so loved the world").await;

    let response = server
        .put("/verses/John%203:16")
        .authorization_bearer(&token)
        .json(&json!({ "status": "reviewing" }))
        .await;
    response.assert_status_ok();
    let verse: serde_json::Value = response.json();
    assert_eq!(verse["status"], "reviewing");
    assert_eq!(verse["text"], "For God so loved the world");

    server
        .put("/verses/Rev%2022:21")
        .authorization_bearer(&token)
        .json(&json!({ "status": "reviewing" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_verse_keeps_points_and_attempt_count() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;
    add_verse(&server, &token, "John 3:16", "For God so loved the world").await;

    post_attempt(&server, &token, "John 3:16", 4, 5, None)
        .await
        .assert_status_ok();
    let before = get_stats(&server, &token).await;

    server
        .delete("/verses/John%203:16")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    server
        .get("/verses/John%203:16")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // The ledger and the global attempt counter survive verse deletion.
    let after = get_stats(&server, &token).await;
    assert_eq!(after["total_points"], before["total_points"]);
    assert_eq!(after["total_attempts"], before["total_attempts"]);

    server
        .delete("/verses/John%203:16")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
