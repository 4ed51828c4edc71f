//! Word-guess, attempt, and mastery endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::email::EmailSender;
use crate::engine;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Datastore, VerseStore};

#[derive(Deserialize)]
pub struct WordGuessRequest {
    pub verse_reference: String,
    pub word_index: i64,
    pub word: String,
    pub is_correct: bool,
    /// Override the event time; used by clients replaying offline practice.
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct WordGuessResponse {
    pub success: bool,
    pub streak_length: i64,
    pub points_earned: i64,
}

/// POST /progress/word
pub async fn record_word<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    headers: HeaderMap,
    Json(req): Json<WordGuessRequest>,
) -> Result<Json<WordGuessResponse>, ApiError>
where
    D: Datastore,
    E: EmailSender,
{
    let session = super::require_session(&headers, &state.store)?;
    let now = req.created_at.unwrap_or_else(Utc::now);

    // The reset sentinel skips ownership verification and scoring entirely.
    if req.word_index == -1 && req.word == "RESET" && !req.is_correct {
        engine::reset_verse_streak(&state.store, session.user_id, &req.verse_reference, now)?;
        return Ok(Json(WordGuessResponse {
            success: true,
            streak_length: 0,
            points_earned: 0,
        }));
    }

    if req.word_index < 0 {
        return Err(ApiError::Validation("word_index must be non-negative".to_string()));
    }

    state
        .store
        .get_verse(session.user_id, &req.verse_reference)?
        .ok_or(ApiError::VerseNotFound)?;

    let outcome = engine::record_word_guess(
        &state.store,
        session.user_id,
        &req.verse_reference,
        req.word_index,
        &req.word,
        req.is_correct,
        now,
    )?;

    Ok(Json(WordGuessResponse {
        success: true,
        streak_length: outcome.streak_length,
        points_earned: outcome.points_earned,
    }))
}

#[derive(Deserialize)]
pub struct AttemptRequest {
    pub verse_reference: String,
    pub words_correct: i64,
    pub total_words: i64,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct AttemptResponse {
    pub success: bool,
}

/// POST /progress/attempt
pub async fn record_attempt<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    headers: HeaderMap,
    Json(req): Json<AttemptRequest>,
) -> Result<Json<AttemptResponse>, ApiError>
where
    D: Datastore,
    E: EmailSender,
{
    let session = super::require_session(&headers, &state.store)?;

    if req.total_words < 1 {
        return Err(ApiError::Validation("total_words must be at least 1".to_string()));
    }
    if req.words_correct < 0 || req.words_correct > req.total_words {
        return Err(ApiError::Validation(
            "words_correct must be between 0 and total_words".to_string(),
        ));
    }

    state
        .store
        .get_verse(session.user_id, &req.verse_reference)?
        .ok_or(ApiError::VerseNotFound)?;

    let now = req.created_at.unwrap_or_else(Utc::now);
    engine::record_attempt(
        &state.store,
        session.user_id,
        &req.verse_reference,
        req.words_correct,
        req.total_words,
        now,
    )?;

    Ok(Json(AttemptResponse { success: true }))
}

/// GET /progress/mastery/:reference
pub async fn get_mastery<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    headers: HeaderMap,
    Path(reference): Path<String>,
) -> Result<Json<engine::MasteryStatus>, ApiError>
where
    D: Datastore,
    E: EmailSender,
{
    let session = super::require_session(&headers, &state.store)?;

    state
        .store
        .get_verse(session.user_id, &reference)?
        .ok_or(ApiError::VerseNotFound)?;

    let status = engine::mastery_status(&state.store, session.user_id, &reference)?;
    Ok(Json(status))
}

#[derive(Deserialize)]
pub struct ResetStreakRequest {
    pub verse_reference: String,
}

#[derive(Serialize)]
pub struct ResetStreakResponse {
    pub success: bool,
}

/// POST /progress/verse-streak/reset
/// Like the word-guess sentinel, this does not require verse ownership.
pub async fn reset_verse_streak<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    headers: HeaderMap,
    Json(req): Json<ResetStreakRequest>,
) -> Result<Json<ResetStreakResponse>, ApiError>
where
    D: Datastore,
    E: EmailSender,
{
    let session = super::require_session(&headers, &state.store)?;
    engine::reset_verse_streak(&state.store, session.user_id, &req.verse_reference, Utc::now())?;
    Ok(Json(ResetStreakResponse { success: true }))
}
