//! Shared application state for the axum handlers.

use std::sync::Arc;

use crate::nlu::embedder::Embedder;
use crate::orchestrator::Orchestrator;

/// State passed to every handler via the axum `State` extractor.
///
/// The orchestrator (model, example embeddings, record store) is built
/// once at startup and never mutated afterwards, so a plain `Arc` is
/// all the sharing it needs.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator<Embedder>>,
}
