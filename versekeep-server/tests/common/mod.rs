//! Common test utilities for server integration tests

use std::sync::Arc;
use std::sync::RwLock;

use axum_test::{TestResponse, TestServer};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use versekeep_server::{routes, AppState, EmailSender, MemoryStore};

/// Mock email sender that captures login codes
#[derive(Default, Clone)]
pub struct MockEmailSender {
    /// Captured (email, code) pairs
    pub sent: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get the last login code sent to an email
    pub fn get_code(&self, email: &str) -> Option<String> {
        self.sent
            .read()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| e == email)
            .map(|(_, c)| c.clone())
    }
}

impl EmailSender for MockEmailSender {
    fn send_login_code(&self, email: &str, code: &str) -> Result<(), String> {
        self.sent
            .write()
            .unwrap()
            .push((email.to_string(), code.to_string()));
        Ok(())
    }
}

/// Create a test server backed by the in-memory store
pub fn create_test_server() -> (TestServer, MockEmailSender) {
    let email_sender = MockEmailSender::new();
    let state = Arc::new(AppState::new(MemoryStore::new(), email_sender.clone()));

    let app = routes::create_router(state);
    let server = TestServer::new(app).expect("Failed to create test server");

    (server, email_sender)
}

/// Run the full magic-link flow and return the bearer token
pub async fn sign_in(server: &TestServer, email_sender: &MockEmailSender, email: &str) -> String {
    let response = server
        .post("/auth/stage")
        .json(&json!({ "email": email }))
        .await;
    response.assert_status_ok();

    let code = email_sender.get_code(email).expect("no login code sent");

    let response = server
        .post("/auth/complete")
        .json(&json!({ "code": code }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    body["token"].as_str().expect("token in response").to_string()
}

/// Add a verse for the signed-in user
pub async fn add_verse(server: &TestServer, token: &str, reference: &str, text: &str) {
    let response = server
        .post("/verses")
        .authorization_bearer(token)
        .json(&json!({ "reference": reference, "text": text }))
        .await;
    response.assert_status_ok();
}

/// Post a word guess, optionally backdated
pub async fn post_word(
    server: &TestServer,
    token: &str,
    reference: &str,
    word_index: i64,
    word: &str,
    is_correct: bool,
    created_at: Option<DateTime<Utc>>,
) -> TestResponse {
    let mut body = json!({
        "verse_reference": reference,
        "word_index": word_index,
        "word": word,
        "is_correct": is_correct,
    });
    if let Some(at) = created_at {
        body["created_at"] = json!(at);
    }
    server
        .post("/progress/word")
        .authorization_bearer(token)
        .json(&body)
        .await
}

/// Post a recitation attempt, optionally backdated
pub async fn post_attempt(
    server: &TestServer,
    token: &str,
    reference: &str,
    words_correct: i64,
    total_words: i64,
    created_at: Option<DateTime<Utc>>,
) -> TestResponse {
    let mut body = json!({
        "verse_reference": reference,
        "words_correct": words_correct,
        "total_words": total_words,
    });
    if let Some(at) = created_at {
        body["created_at"] = json!(at);
    }
    server
        .post("/progress/attempt")
        .authorization_bearer(token)
        .json(&body)
        .await
}

/// Fetch the signed-in user's stats
pub async fn get_stats(server: &TestServer, token: &str) -> serde_json::Value {
    let response = server
        .get("/gamification/stats")
        .authorization_bearer(token)
        .await;
    response.assert_status_ok();
    response.json()
}

/// Noon UTC, `n` days after a fixed base date. Backdating events to fixed
/// days keeps the calendar-day streak logic deterministic.
pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::days(n)
}
