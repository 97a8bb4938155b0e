use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Host SDK events
        .route("/contacts/events", post(handlers::post_contact_event))
        // Recording queries
        .route("/recording/status", get(handlers::get_recording_status))
        .route(
            "/channels/:channel/artifact",
            get(handlers::get_channel_artifact),
        )
        .route("/channels/:channel/trace", get(handlers::get_channel_trace))
        // The page glue posts events from another origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
