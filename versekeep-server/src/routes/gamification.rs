//! Points recorder, stats, and leaderboard endpoints

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use versekeep_core::points::{self, PointEventType};

use crate::email::EmailSender;
use crate::engine;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Datastore, GroupId, GroupStore, ProgressStore, UserId, UserStore};

#[derive(Deserialize)]
pub struct RecordPointsRequest {
    pub event_type: String,
    pub points: Option<i64>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct RecordPointsResponse {
    pub success: bool,
    pub points_earned: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak_length: Option<i64>,
}

/// POST /gamification/points
///
/// Generic point recorder. `word_correct` events compute their own streak and
/// points server-side; the caller's `points` value is ignored for them. Other
/// event types record the caller-supplied points verbatim.
pub async fn record_points<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    headers: HeaderMap,
    Json(req): Json<RecordPointsRequest>,
) -> Result<Json<RecordPointsResponse>, ApiError>
where
    D: Datastore,
    E: EmailSender,
{
    let session = super::require_session(&headers, &state.store)?;

    let event_type = PointEventType::from_str(&req.event_type)
        .ok_or_else(|| ApiError::Validation(format!("unknown event_type: {}", req.event_type)))?;

    let now = req.created_at.unwrap_or_else(Utc::now);
    let metadata = req.metadata.unwrap_or(serde_json::Value::Null);

    // Points-bearing activity always feeds the daily streak. A stats row must
    // exist first so the streak machine has something to advance.
    state.store.ensure_user_stats(session.user_id, now)?;
    engine::update_daily_streak(&state.store, session.user_id, now)?;

    if event_type == PointEventType::WordCorrect {
        let reference = metadata
            .get("verse_reference")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ApiError::Validation("word_correct requires metadata.verse_reference".to_string())
            })?
            .to_string();

        let (streak_length, points_earned, is_new_longest) =
            engine::apply_correct_word(&state.store, session.user_id, &reference, now)?;

        state.store.insert_point_event(
            session.user_id,
            PointEventType::WordCorrect,
            points_earned,
            json!({
                "verse_reference": reference,
                "streak_length": streak_length,
                "multiplier": points::multiplier(streak_length),
                "is_new_longest": is_new_longest,
            }),
            now,
        )?;

        return Ok(Json(RecordPointsResponse {
            success: true,
            points_earned,
            streak_length: Some(streak_length),
        }));
    }

    let points_earned = match req.points {
        Some(p) if p >= 0 => p,
        Some(_) => return Err(ApiError::Validation("points must be non-negative".to_string())),
        None => return Err(ApiError::Validation("points required".to_string())),
    };

    let mut stats = state.store.ensure_user_stats(session.user_id, now)?;
    stats.total_points += points_earned;
    state.store.save_user_stats(&stats)?;
    state
        .store
        .insert_point_event(session.user_id, event_type, points_earned, metadata, now)?;

    Ok(Json(RecordPointsResponse {
        success: true,
        points_earned,
        streak_length: None,
    }))
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub total_points: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub verses_mastered: i64,
    pub total_attempts: i64,
    pub current_verse_streak: i64,
    pub current_verse_reference: Option<String>,
    pub longest_word_guess_streak: i64,
    pub last_activity_date: DateTime<Utc>,
    pub points_by_type: BTreeMap<String, i64>,
    pub daily_points: Vec<crate::store::DailyPoints>,
}

/// GET /gamification/stats
pub async fn get_stats<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, ApiError>
where
    D: Datastore,
    E: EmailSender,
{
    let session = super::require_session(&headers, &state.store)?;

    let now = Utc::now();
    let stats = state.store.ensure_user_stats(session.user_id, now)?;

    let points_by_type = state
        .store
        .points_by_event_type(session.user_id)?
        .into_iter()
        .map(|(ty, points)| (ty.as_str().to_string(), points))
        .collect();

    let daily_points = state
        .store
        .daily_point_totals(session.user_id, now - Duration::days(30))?;

    Ok(Json(StatsResponse {
        total_points: stats.total_points,
        current_streak: stats.current_streak,
        longest_streak: stats.longest_streak,
        verses_mastered: stats.verses_mastered,
        total_attempts: stats.total_attempts,
        current_verse_streak: stats.current_verse_streak,
        current_verse_reference: stats.current_verse_reference,
        longest_word_guess_streak: stats.longest_word_guess_streak,
        last_activity_date: stats.last_activity_date,
        points_by_type,
        daily_points,
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Metric {
    Points,
    CurrentStreak,
    LongestStreak,
    VersesMastered,
}

impl Metric {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "points" => Some(Metric::Points),
            "current_streak" => Some(Metric::CurrentStreak),
            "longest_streak" => Some(Metric::LongestStreak),
            "verses_mastered" => Some(Metric::VersesMastered),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Metric::Points => "points",
            Metric::CurrentStreak => "current_streak",
            Metric::LongestStreak => "longest_streak",
            Metric::VersesMastered => "verses_mastered",
        }
    }
}

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    pub metric: Option<String>,
    pub timeframe: Option<String>,
}

#[derive(Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: i64,
    pub email: String,
    pub value: i64,
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub group_id: i64,
    pub metric: String,
    pub timeframe: String,
    pub entries: Vec<LeaderboardEntry>,
}

/// GET /gamification/leaderboard/:group_id
pub async fn get_leaderboard<D, E>(
    State(state): State<Arc<AppState<D, E>>>,
    headers: HeaderMap,
    Path(group_id): Path<i64>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, ApiError>
where
    D: Datastore,
    E: EmailSender,
{
    let session = super::require_session(&headers, &state.store)?;
    let group_id = GroupId(group_id);

    let metric = match query.metric.as_deref() {
        None => Metric::Points,
        Some(s) => Metric::parse(s)
            .ok_or_else(|| ApiError::Validation(format!("unknown metric: {s}")))?,
    };

    let timeframe = query.timeframe.as_deref().unwrap_or("all");
    let now = Utc::now();
    let since = match timeframe {
        "all" => None,
        "week" => Some(now - Duration::days(7)),
        "month" => Some(now - Duration::days(30)),
        other => {
            return Err(ApiError::Validation(format!("unknown timeframe: {other}")));
        }
    };

    state
        .store
        .get_group(group_id)?
        .ok_or(ApiError::GroupNotFound)?;
    if !state.store.is_member(group_id, session.user_id)? {
        return Err(ApiError::NotGroupMember);
    }

    let mut scored: Vec<(UserId, i64)> = Vec::new();
    for member in state.store.member_ids(group_id)? {
        let value = match metric {
            Metric::Points => state.store.points_since(member, since)?,
            Metric::CurrentStreak => stats_field(&state.store, member, |s| s.current_streak)?,
            Metric::LongestStreak => stats_field(&state.store, member, |s| s.longest_streak)?,
            Metric::VersesMastered => stats_field(&state.store, member, |s| s.verses_mastered)?,
        };
        scored.push((member, value));
    }
    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0 .0.cmp(&b.0 .0)));

    let mut entries = Vec::with_capacity(scored.len());
    for (rank, (user_id, value)) in scored.into_iter().enumerate() {
        let email = state
            .store
            .get_user(user_id)?
            .map(|u| u.email)
            .unwrap_or_default();
        entries.push(LeaderboardEntry {
            rank: rank + 1,
            user_id: user_id.0,
            email,
            value,
        });
    }

    Ok(Json(LeaderboardResponse {
        group_id: group_id.0,
        metric: metric.as_str().to_string(),
        timeframe: timeframe.to_string(),
        entries,
    }))
}

fn stats_field<P: ProgressStore>(
    store: &P,
    user_id: UserId,
    field: impl Fn(&crate::store::UserStats) -> i64,
) -> Result<i64, ApiError> {
    Ok(store.get_user_stats(user_id)?.map(|s| field(&s)).unwrap_or(0))
}
