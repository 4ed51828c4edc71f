//! Group creation and membership endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::email::EmailSender;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Datastore, GroupStore};

/// Short human-shareable invite code derived from a v4 uuid.
fn generate_invite_code() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

#[derive(Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct CreateGroupResponse {
    pub group_id: i64,
    pub invite_code: String,
}

/// POST /groups
pub async fn create_group<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    headers: HeaderMap,
    Json(req): Json<CreateGroupRequest>,
) -> Result<Json<CreateGroupResponse>, ApiError>
where
    D: Datastore,
    E: EmailSender,
{
    let session = super::require_session(&headers, &state.store)?;

    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("name required".to_string()));
    }

    let now = Utc::now();
    let invite_code = generate_invite_code();
    let group = state
        .store
        .create_group(name, &invite_code, session.user_id, now)?;

    tracing::info!(group_id = group.id.0, "Group created");

    Ok(Json(CreateGroupResponse {
        group_id: group.id.0,
        invite_code: group.invite_code,
    }))
}

#[derive(Deserialize)]
pub struct JoinGroupRequest {
    pub invite_code: String,
}

#[derive(Serialize)]
pub struct JoinGroupResponse {
    pub success: bool,
    pub group_id: i64,
}

/// POST /groups/join
pub async fn join_group<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    headers: HeaderMap,
    Json(req): Json<JoinGroupRequest>,
) -> Result<Json<JoinGroupResponse>, ApiError>
where
    D: Datastore,
    E: EmailSender,
{
    let session = super::require_session(&headers, &state.store)?;

    let group = state
        .store
        .get_group_by_invite(req.invite_code.trim())?
        .ok_or(ApiError::InvalidInviteCode)?;

    state.store.add_member(group.id, session.user_id, Utc::now())?;

    Ok(Json(JoinGroupResponse {
        success: true,
        group_id: group.id.0,
    }))
}
