//! # Web Layer
//!
//! Axum router, handlers, and shared state for the query service.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Client (JSON over HTTP)                      │
//! ├──────────────────────────────────────────────┤
//! │ Axum Router (this module)                    │
//! │  ├── POST /query  → free-text question       │
//! │  └── GET  /health → readiness probe          │
//! ├──────────────────────────────────────────────┤
//! │ Orchestrator (NLU → lookup → render)         │
//! └──────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use state::AppState;

/// Builds the router with every route of the service.
///
/// CORS is wide open: the service carries no credentials and no
/// authentication, and browser-based frontends call it directly.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/query", post(handlers::query))
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
