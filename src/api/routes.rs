use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Event history
        .route("/events", post(handlers::add_event))
        .route("/events", get(handlers::get_events))
        // Similarity lookup
        .route("/similar_tracks", get(handlers::similar_tracks))
        // Recommendations
        .route(
            "/recommendations/offline",
            get(handlers::recommendations_offline),
        )
        .route(
            "/recommendations/online",
            get(handlers::recommendations_online),
        )
        .route("/recommendations", get(handlers::recommendations))
        // Observability
        .route("/stats", get(handlers::stats))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        // Outermost so the trace span can pick the ID out of extensions
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
