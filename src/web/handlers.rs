//! # HTTP Handlers
//!
//! | Handler | Method | Route | Returns |
//! |---------|--------|-------|---------|
//! | [`query`] | POST | `/query` | `{"response": <string \| object>}` |
//! | [`health`] | GET | `/health` | `{"status": "ok"}` |
//!
//! ## Error boundary
//!
//! Any failure inside the query pipeline is caught here: the error
//! chain goes to the logs at `error` level and the caller gets the
//! fixed apology reply with HTTP 200. Clients never see internal
//! detail, and by contract they never see an error status either.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::state::AppState;
use crate::render::{Reply, ERROR_REPLY};

/// Request body of `POST /query`.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// The user's free-text question.
    pub message: String,
}

/// Response body of `POST /query`.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    /// Rendered reply: a sentence or a small structured payload.
    pub response: Reply,
}

/// POST `/query`: answer one free-text question.
///
/// Embedding is a CPU-bound forward pass, so the pipeline runs on the
/// blocking thread pool rather than the async runtime.
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Json<QueryResponse> {
    tracing::debug!(message = %request.message, "Received query");

    let orchestrator = state.orchestrator.clone();
    let message = request.message;
    let handled =
        tokio::task::spawn_blocking(move || orchestrator.handle(&message)).await;

    let response = match handled {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => {
            tracing::error!(error = ?e, "Query handling failed");
            Reply::Text(ERROR_REPLY.to_string())
        }
        Err(e) => {
            tracing::error!(error = %e, "Query task panicked or was cancelled");
            Reply::Text(ERROR_REPLY.to_string())
        }
    };

    Json(QueryResponse { response })
}

/// GET `/health`: readiness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
