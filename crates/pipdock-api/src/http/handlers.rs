//! Request handlers.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use pipdock_protocols::{ControllerRequest, HistoryEntry, Reply, SessionState};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::state::AppState;

/// Forward one message to the router. Failures travel in the reply body.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ControllerRequest>,
) -> Json<Reply> {
    state.increment_requests();
    debug!("POST /messages {}", request.kind());
    Json(state.router.send(request).await)
}

pub async fn list_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<HistoryEntry>>, (StatusCode, Json<Reply>)> {
    state.history.entries().await.map(Json).map_err(|e| {
        error!("Failed to read history: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Reply::error(e.to_string())),
        )
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub session: SessionState,
    pub uptime_seconds: u64,
    pub requests: u64,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        session: state.controller.session_state(),
        uptime_seconds: state.uptime().as_secs(),
        requests: state.request_count(),
    })
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
