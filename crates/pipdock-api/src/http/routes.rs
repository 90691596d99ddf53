//! HTTP route definitions.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::http::handlers::{health, list_history, post_message};
use crate::state::AppState;

/// Create the API router.
///
/// ```text
/// POST /messages - controller message, always 200 with {ok, error?}
/// GET  /history  - viewing history
/// GET  /health   - {"status": "ok", "session": <state>, ...}
/// ```
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/messages", post(post_message))
        .route("/history", get(list_history))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
