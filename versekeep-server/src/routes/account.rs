//! Account management endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::email::EmailSender;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Datastore, ProgressStore, SessionStore, UserStore};

#[derive(Serialize)]
pub struct DeleteAccountResponse {
    pub success: bool,
}

/// DELETE /account
/// Anonymize the account: identity is scrubbed in place, sessions and the
/// point-event ledger are removed, the user row itself stays.
pub async fn delete_account<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    headers: HeaderMap,
) -> Result<Json<DeleteAccountResponse>, ApiError>
where
    D: Datastore,
    E: EmailSender,
{
    let session = super::require_session(&headers, &state.store)?;

    let placeholder = format!("deleted-{}@anonymized.invalid", Uuid::new_v4());
    state.store.anonymize_user(session.user_id, &placeholder)?;
    state.store.delete_point_events(session.user_id)?;
    state.store.delete_sessions_for_user(session.user_id)?;

    tracing::info!(user_id = session.user_id.0, "Account anonymized");

    Ok(Json(DeleteAccountResponse { success: true }))
}
