//! Magic-link authentication endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::email::EmailSender;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Datastore, PendingLogin, SessionStore, UserStore};

/// Generate a random 6-digit login code
fn generate_login_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(100000..1000000);
    code.to_string()
}

#[derive(Deserialize)]
pub struct StageLoginRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct StageLoginResponse {
    pub success: bool,
}

/// POST /auth/stage
/// Start sign-in by emailing a one-time code. Works for new and existing
/// accounts alike; the user row is created on first completed login.
pub async fn stage_login<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    Json(req): Json<StageLoginRequest>,
) -> Result<Json<StageLoginResponse>, ApiError>
where
    D: Datastore,
    E: EmailSender,
{
    let email = req.email.trim().to_lowercase();
    if email.len() < 3 || !email.contains('@') {
        return Err(ApiError::Validation("valid email required".to_string()));
    }

    // Opportunistic cleanup of stale codes.
    let _ = state
        .store
        .cleanup_expired_logins(state.login_code_ttl_minutes);

    let code = generate_login_code();
    state.store.create_pending_login(PendingLogin {
        code: code.clone(),
        email: email.clone(),
        created_at: Utc::now(),
    })?;

    state
        .email_sender
        .send_login_code(&email, &code)
        .map_err(ApiError::Internal)?;

    Ok(Json(StageLoginResponse { success: true }))
}

#[derive(Deserialize)]
pub struct CompleteLoginRequest {
    pub code: String,
}

#[derive(Serialize)]
pub struct CompleteLoginResponse {
    pub success: bool,
    pub token: String,
    pub user_id: i64,
}

/// POST /auth/complete
/// Redeem a login code for a bearer-token session.
pub async fn complete_login<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    Json(req): Json<CompleteLoginRequest>,
) -> Result<Json<CompleteLoginResponse>, ApiError>
where
    D: Datastore,
    E: EmailSender,
{
    let pending = state
        .store
        .get_pending_login(&req.code)?
        .ok_or(ApiError::InvalidLoginCode)?;

    let age = Utc::now() - pending.created_at;
    if age.num_minutes() > state.login_code_ttl_minutes {
        state.store.delete_pending_login(&req.code)?;
        return Err(ApiError::LoginCodeExpired);
    }

    state.store.delete_pending_login(&req.code)?;

    let now = Utc::now();
    let user = match state.store.get_user_by_email(&pending.email)? {
        Some(user) => {
            state.store.touch_last_login(user.id, now)?;
            user
        }
        None => state.store.create_user(&pending.email, now)?,
    };

    let session = state.store.create_session(user.id, state.session_ttl_days)?;

    Ok(Json(CompleteLoginResponse {
        success: true,
        token: session.token,
        user_id: user.id.0,
    }))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// POST /auth/logout
pub async fn logout<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    headers: HeaderMap,
) -> Json<LogoutResponse>
where
    D: Datastore,
    E: EmailSender,
{
    if let Ok(session) = super::require_session(&headers, &state.store) {
        let _ = state.store.delete_session(&session.token);
    }

    Json(LogoutResponse { success: true })
}

#[derive(Serialize)]
pub struct SessionContext {
    pub authenticated: bool,
    pub user_id: Option<i64>,
    pub server_time: i64,
}

/// GET /auth/context
pub async fn get_context<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    headers: HeaderMap,
) -> Json<SessionContext>
where
    D: Datastore,
    E: EmailSender,
{
    let session = super::require_session(&headers, &state.store).ok();

    Json(SessionContext {
        authenticated: session.is_some(),
        user_id: session.map(|s| s.user_id.0),
        server_time: Utc::now().timestamp(),
    })
}
