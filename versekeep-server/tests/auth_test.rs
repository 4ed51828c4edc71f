//! Magic-link authentication and account lifecycle tests

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{add_verse, create_test_server, get_stats, sign_in};

#[tokio::test]
async fn test_full_login_flow() {
    let (server, email_sender) = create_test_server();

    let response = server
        .post("/auth/stage")
        .json(&json!({ "email": "alice@example.com" }))
        .await;
    response.assert_status_ok();

    let code = email_sender.get_code("alice@example.com").unwrap();
    assert_eq!(code.len(), 6);

    let response = server
        .post("/auth/complete")
        .json(&json!({ "code": code }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().is_some());
    assert!(body["user_id"].as_i64().is_some());
}

#[tokio::test]
async fn test_stage_rejects_invalid_email() {
    let (server, _) = create_test_server();

    let response = server
        .post("/auth/stage")
        .json(&json!({ "email": "nope" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_complete_rejects_unknown_code() {
    let (server, _) = create_test_server();

    let response = server
        .post("/auth/complete")
        .json(&json!({ "code": "000000" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_code_is_single_use() {
    let (server, email_sender) = create_test_server();

    server
        .post("/auth/stage")
        .json(&json!({ "email": "alice@example.com" }))
        .await
        .assert_status_ok();
    let code = email_sender.get_code("alice@example.com").unwrap();

    server
        .post("/auth/complete")
        .json(&json!({ "code": code }))
        .await
        .assert_status_ok();

    let response = server
        .post("/auth/complete")
        .json(&json!({ "code": code }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_repeat_login_reuses_account() {
    let (server, email_sender) = create_test_server();

    server
        .post("/auth/stage")
        .json(&json!({ "email": "alice@example.com" }))
        .await
        .assert_status_ok();
    let code = email_sender.get_code("alice@example.com").unwrap();
    let response = server
        .post("/auth/complete")
        .json(&json!({ "code": code }))
        .await;
    let first: serde_json::Value = response.json();

    server
        .post("/auth/stage")
        .json(&json!({ "email": "Alice@Example.com" }))
        .await
        .assert_status_ok();
    let code = email_sender.get_code("alice@example.com").unwrap();
    let response = server
        .post("/auth/complete")
        .json(&json!({ "code": code }))
        .await;
    let second: serde_json::Value = response.json();

    assert_eq!(first["user_id"], second["user_id"]);
}

#[tokio::test]
async fn test_logout_invalidates_token() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;

    server
        .post("/auth/logout")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    let response = server.get("/verses").authorization_bearer(&token).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_context() {
    let (server, email_sender) = create_test_server();

    let response = server.get("/auth/context").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["authenticated"], false);

    let token = sign_in(&server, &email_sender, "alice@example.com").await;
    let response = server
        .get("/auth/context")
        .authorization_bearer(&token)
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["authenticated"], true);
    assert!(body["user_id"].as_i64().is_some());
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (server, _) = create_test_server();

    server
        .get("/verses")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .get("/gamification/stats")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .post("/progress/word")
        .json(&json!({
            "verse_reference": "John 3:16",
            "word_index": 0,
            "word": "For",
            "is_correct": true,
        }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delete_account_anonymizes() {
    let (server, email_sender) = create_test_server();
    let token = sign_in(&server, &email_sender, "alice@example.com").await;
    add_verse(&server, &token, "John 3:16", "For God so loved the world").await;

    let stats = get_stats(&server, &token).await;
    assert_eq!(stats["total_points"], 10);

    server
        .delete("/account")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    // Sessions are gone with the identity.
    server
        .get("/verses")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    // The email is free again and maps to a fresh account.
    let token = sign_in(&server, &email_sender, "alice@example.com").await;
    let response = server.get("/verses").authorization_bearer(&token).await;
    response.assert_status_ok();
    let verses: serde_json::Value = response.json();
    assert_eq!(verses.as_array().unwrap().len(), 0);
}
