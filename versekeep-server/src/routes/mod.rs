//! HTTP routes for the server

mod account;
mod auth;
mod gamification;
mod groups;
mod progress;
mod verses;

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::email::EmailSender;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Datastore, Session, SessionStore};

/// Create the router with all routes
pub fn create_router<D, E>(state: Arc<AppState<D, E>>) -> Router
where
    D: Datastore + 'static,
    E: EmailSender + 'static,
{
    Router::new()
        .route("/auth/stage", post(auth::stage_login))
        .route("/auth/complete", post(auth::complete_login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/context", get(auth::get_context))
        .route("/account", delete(account::delete_account))
        .route("/verses", post(verses::add_verse).get(verses::list_verses))
        .route(
            "/verses/:reference",
            get(verses::get_verse)
                .put(verses::update_verse)
                .delete(verses::delete_verse),
        )
        .route("/progress/word", post(progress::record_word))
        .route("/progress/attempt", post(progress::record_attempt))
        .route("/progress/mastery/:reference", get(progress::get_mastery))
        .route("/progress/verse-streak/reset", post(progress::reset_verse_streak))
        .route("/gamification/points", post(gamification::record_points))
        .route("/gamification/stats", get(gamification::get_stats))
        .route("/gamification/leaderboard/:group_id", get(gamification::get_leaderboard))
        .route("/groups", post(groups::create_group))
        .route("/groups/join", post(groups::join_group))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolve the bearer token on a request to a live session.
pub(crate) fn require_session<D: Datastore>(
    headers: &HeaderMap,
    store: &D,
) -> Result<Session, ApiError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::NotAuthenticated)?;

    store.get_session(token)?.ok_or(ApiError::NotAuthenticated)
}
