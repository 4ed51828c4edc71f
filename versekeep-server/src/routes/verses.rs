//! Verse CRUD endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use versekeep_core::points::{PointEventType, VERSE_ADDED_POINTS};

use crate::email::EmailSender;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{
    Datastore, ProgressStore, Verse, VerseStatus, VerseStore, VerseUpdate,
};

#[derive(Serialize)]
pub struct VerseResponse {
    pub id: i64,
    pub reference: String,
    pub text: String,
    pub translation: Option<String>,
    pub status: VerseStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Verse> for VerseResponse {
    fn from(verse: Verse) -> Self {
        Self {
            id: verse.id,
            reference: verse.reference,
            text: verse.text,
            translation: verse.translation,
            status: verse.status,
            created_at: verse.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct AddVerseRequest {
    pub reference: String,
    pub text: String,
    pub translation: Option<String>,
}

/// POST /verses
/// Add a verse to memorize; awards the flat verse-added points.
pub async fn add_verse<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    headers: HeaderMap,
    Json(req): Json<AddVerseRequest>,
) -> Result<Json<VerseResponse>, ApiError>
where
    D: Datastore,
    E: EmailSender,
{
    let session = super::require_session(&headers, &state.store)?;

    let reference = req.reference.trim();
    if reference.is_empty() {
        return Err(ApiError::Validation("reference required".to_string()));
    }
    if req.text.trim().is_empty() {
        return Err(ApiError::Validation("text required".to_string()));
    }

    let now = Utc::now();
    let verse = state.store.add_verse(
        session.user_id,
        reference,
        req.text.trim(),
        req.translation.as_deref(),
        now,
    )?;

    // Ledger entry and rollup move together.
    let mut stats = state.store.ensure_user_stats(session.user_id, now)?;
    stats.total_points += VERSE_ADDED_POINTS;
    state.store.save_user_stats(&stats)?;
    state.store.insert_point_event(
        session.user_id,
        PointEventType::VerseAdded,
        VERSE_ADDED_POINTS,
        json!({ "verse_reference": verse.reference }),
        now,
    )?;

    Ok(Json(verse.into()))
}

/// GET /verses
pub async fn list_verses<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<VerseResponse>>, ApiError>
where
    D: Datastore,
    E: EmailSender,
{
    let session = super::require_session(&headers, &state.store)?;
    let verses = state.store.list_verses(session.user_id)?;
    Ok(Json(verses.into_iter().map(Into::into).collect()))
}

/// GET /verses/:reference
pub async fn get_verse<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    headers: HeaderMap,
    Path(reference): Path<String>,
) -> Result<Json<VerseResponse>, ApiError>
where
    D: Datastore,
    E: EmailSender,
{
    let session = super::require_session(&headers, &state.store)?;
    let verse = state
        .store
        .get_verse(session.user_id, &reference)?
        .ok_or(ApiError::VerseNotFound)?;
    Ok(Json(verse.into()))
}

/// PUT /verses/:reference
pub async fn update_verse<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    headers: HeaderMap,
    Path(reference): Path<String>,
    Json(update): Json<VerseUpdate>,
) -> Result<Json<VerseResponse>, ApiError>
where
    D: Datastore,
    E: EmailSender,
{
    let session = super::require_session(&headers, &state.store)?;
    let verse = state
        .store
        .update_verse(session.user_id, &reference, &update)?
        .ok_or(ApiError::VerseNotFound)?;
    Ok(Json(verse.into()))
}

#[derive(Serialize)]
pub struct DeleteVerseResponse {
    pub success: bool,
}

/// DELETE /verses/:reference
/// Removes the verse and its practice data in one atomic batch. Mastery
/// records and point events are kept.
pub async fn delete_verse<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    headers: HeaderMap,
    Path(reference): Path<String>,
) -> Result<Json<DeleteVerseResponse>, ApiError>
where
    D: Datastore,
    E: EmailSender,
{
    let session = super::require_session(&headers, &state.store)?;
    if !state.store.delete_verse_data(session.user_id, &reference)? {
        return Err(ApiError::VerseNotFound);
    }
    Ok(Json(DeleteVerseResponse { success: true }))
}
