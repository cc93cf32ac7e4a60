//! # Onboard Chat
//!
//! A small conversational query service over corporate onboarding
//! records. Free-text questions arrive on `POST /query`; the service
//! classifies the intent by embedding similarity against a configured
//! example corpus, extracts a WCIS ID and entity name from the text,
//! looks up the matching record, and answers with a canned per-intent
//! template.
//!
//! ## Startup flow
//!
//! ```text
//! main()
//!   ├── Configure tracing/logging (RUST_LOG, default info)
//!   ├── Load config/intents.json  (example corpus)
//!   ├── Load data/onboarding_data.json  (record store)
//!   ├── Load all-MiniLM-L6-v2 + embed the corpus  (blocking thread)
//!   ├── Build the orchestrator
//!   └── Serve on 0.0.0.0:3000
//! ```
//!
//! Every startup failure is fatal: a service that cannot classify or
//! look anything up must not accept queries.
//!
//! ## Usage
//!
//! ```bash
//! cargo run
//! # then:
//! curl -X POST http://localhost:3000/query \
//!   -H 'content-type: application/json' \
//!   -d '{"message": "How far is Apple with WCIS ID 123456?"}'
//! ```

mod config;
mod nlu;
mod orchestrator;
mod render;
mod store;
mod web;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::{INTENT_CONFIG_PATH, RECORDS_PATH};
use crate::nlu::embedder::Embedder;
use crate::nlu::NluPipeline;
use crate::orchestrator::{Orchestrator, DEFAULT_MIN_CONFIDENCE};
use crate::store::{RecordStore, DEFAULT_COLLECTION};
use crate::web::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG overrides the default level, e.g. RUST_LOG=debug cargo run
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Onboard Chat starting...");

    let intents = config::load_intents(INTENT_CONFIG_PATH)?;
    let total_examples: usize = intents.iter().map(|cfg| cfg.examples.len()).sum();
    tracing::info!(
        intents = intents.len(),
        examples = total_examples,
        "Intent corpus loaded"
    );

    let record_store = RecordStore::load(RECORDS_PATH)?;

    // Every intent must route to a collection that actually exists
    for cfg in &intents {
        let source = cfg.source.as_deref().unwrap_or(DEFAULT_COLLECTION);
        if !record_store.has_collection(source) {
            bail!(
                "Intent {:?} routes to collection {:?}, which {} does not define",
                cfg.intent.label(),
                source,
                RECORDS_PATH
            );
        }
    }

    // Model load and corpus embedding are CPU-heavy; keep them off the
    // async runtime. Failure here is fatal.
    let entity_names = record_store.entity_names();
    let pipeline_intents = intents.clone();
    let pipeline = tokio::task::spawn_blocking(move || -> Result<NluPipeline<Embedder>> {
        let embedder = Embedder::load()?;
        NluPipeline::new(embedder, &pipeline_intents, entity_names)
    })
    .await
    .context("Model loading task failed")??;
    tracing::info!("NLU pipeline initialized");

    let orchestrator = Arc::new(Orchestrator::new(
        pipeline,
        record_store,
        &intents,
        DEFAULT_MIN_CONFIDENCE,
    ));

    let app = web::create_router(AppState { orchestrator });

    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Server running at http://localhost:3000");

    axum::serve(listener, app).await?;

    Ok(())
}
