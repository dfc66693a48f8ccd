use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{ScoredTrack, TrackId, UserId};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct AddEventRequest {
    pub user_id: UserId,
    pub track_id: TrackId,
}

#[derive(Debug, Serialize)]
pub struct AddEventResponse {
    pub user_id: UserId,
    pub track_id: TrackId,
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub user_id: UserId,
    #[serde(default = "default_events_n")]
    pub n: usize,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<TrackId>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct SimilarTracksQuery {
    pub track_id: TrackId,
    #[serde(default = "default_similar_k")]
    pub k: usize,
}

#[derive(Debug, Serialize)]
pub struct SimilarTracksResponse {
    pub tracks: Vec<ScoredTrack>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationsQuery {
    pub user_id: UserId,
    #[serde(default = "default_recommendations_k")]
    pub k: usize,
    /// Optional per-request deadline for the online path, milliseconds.
    pub deadline_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recs: Vec<TrackId>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_events: u64,
    pub unique_users: usize,
    pub personal_served: u64,
    pub fallback_served: u64,
    pub personal_users: usize,
    pub popular_tracks: usize,
    pub similarity_pairs: usize,
    pub uptime_secs: i64,
}

fn default_events_n() -> usize {
    5
}

fn default_similar_k() -> usize {
    10
}

fn default_recommendations_k() -> usize {
    100
}

fn require_positive(value: usize, name: &str) -> AppResult<()> {
    if value == 0 {
        return Err(AppError::InvalidInput(format!("{} must be positive", name)));
    }
    Ok(())
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Records a played track in the user's history.
///
/// Tracks absent from every artifact are invalid and rejected; everything
/// else is appended, evicting the oldest entry past the cap.
pub async fn add_event(
    State(state): State<AppState>,
    Json(request): Json<AddEventRequest>,
) -> AppResult<(StatusCode, Json<AddEventResponse>)> {
    if !state.is_known_track(request.track_id) {
        return Err(AppError::InvalidInput(format!(
            "unknown track id {}",
            request.track_id
        )));
    }

    state.history.add_event(request.user_id, request.track_id);
    tracing::debug!(
        user_id = request.user_id,
        track_id = request.track_id,
        "event recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(AddEventResponse {
            user_id: request.user_id,
            track_id: request.track_id,
        }),
    ))
}

/// Returns the user's most recent events, most-recent-first.
/// Unknown users get an empty list.
pub async fn get_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> AppResult<Json<EventsResponse>> {
    require_positive(query.n, "n")?;

    let events = state.history.recent_events(query.user_id, query.n);
    let count = events.len();
    Ok(Json(EventsResponse { events, count }))
}

/// Returns a track's nearest neighbors with scores, best first.
/// Unknown tracks get an empty list.
pub async fn similar_tracks(
    State(state): State<AppState>,
    Query(query): Query<SimilarTracksQuery>,
) -> AppResult<Json<SimilarTracksResponse>> {
    require_positive(query.k, "k")?;

    let tracks = state.similarity.similar(query.track_id, query.k);
    Ok(Json(SimilarTracksResponse { tracks }))
}

/// Offline recommendations: the personal table row, or the popularity
/// fallback when the user has none.
pub async fn recommendations_offline(
    State(state): State<AppState>,
    Query(query): Query<RecommendationsQuery>,
) -> AppResult<Json<RecommendationsResponse>> {
    require_positive(query.k, "k")?;

    let recs = state.recommender.offline(query.user_id, query.k);
    Ok(Json(RecommendationsResponse { recs }))
}

/// Online recommendations derived from recent events. Empty without
/// history; the popularity fallback is deliberately not applied here.
pub async fn recommendations_online(
    State(state): State<AppState>,
    Query(query): Query<RecommendationsQuery>,
) -> AppResult<Json<RecommendationsResponse>> {
    require_positive(query.k, "k")?;

    let recs = state.recommender.online(query.user_id, query.k).await;
    Ok(Json(RecommendationsResponse { recs }))
}

/// Blended recommendations: online interleaved with offline, deduplicated,
/// capped at `k`.
pub async fn recommendations(
    State(state): State<AppState>,
    Query(query): Query<RecommendationsQuery>,
) -> AppResult<Json<RecommendationsResponse>> {
    require_positive(query.k, "k")?;
    if query.deadline_ms == Some(0) {
        return Err(AppError::InvalidInput(
            "deadline_ms must be positive".to_string(),
        ));
    }

    let deadline = query.deadline_ms.map(Duration::from_millis);
    let recs = state
        .recommender
        .blended(query.user_id, query.k, deadline)
        .await;
    Ok(Json(RecommendationsResponse { recs }))
}

/// Serving-side counters for quick operational checks.
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let counters = state.recommender.serve_counters();
    let snapshot = state.catalog.snapshot();

    Json(StatsResponse {
        total_events: state.history.event_count(),
        unique_users: state.history.user_count(),
        personal_served: counters.personal,
        fallback_served: counters.fallback,
        personal_users: snapshot.personal_user_count(),
        popular_tracks: snapshot.popular_len(),
        similarity_pairs: state.similarity.pair_count(),
        uptime_secs: (chrono::Utc::now() - state.started_at).num_seconds(),
    })
}
