//! # NLU Pipeline
//!
//! Turns a raw message into everything the orchestrator needs to answer
//! it: the classified intent and the extracted identifying fields.
//!
//! ```text
//! Message
//!   ├── 1. NFC normalize (Unicode)
//!   ├── 2. Classify intent (IntentClassifier, cosine argmax)
//!   ├── 3. Extract WCIS ID (regex)
//!   └── 4. Extract entity name (known-name containment)
//!             ↓
//!          Analysis
//! ```
//!
//! ## Sub-modules
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`embedder`] | Text → 384-dim vector via candle (and the [`embedder::Embed`] trait) |
//! | [`intent`] | Nearest-neighbor intent classification |
//! | [`extractor`] | WCIS ID + entity name extraction |
//!
//! The pipeline is immutable after construction and holds no per-request
//! state; one instance serves every request for the process lifetime.

pub mod embedder;
pub mod extractor;
pub mod intent;

use anyhow::Result;
use unicode_normalization::UnicodeNormalization;

use crate::config::IntentConfig;

use embedder::Embed;
use extractor::FieldExtractor;
use intent::{IntentClassifier, IntentMatch};

/// Everything derived from one message. Ephemeral, one per request.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Best-matching intent with its confidence score.
    pub intent: IntentMatch,
    /// Extracted numeric identifier, if any.
    pub wcis_id: Option<String>,
    /// Extracted entity name, if any.
    pub entity: Option<String>,
}

/// NLU pipeline: embedder + intent classifier + field extractor.
///
/// Generic over [`Embed`] so the whole pipeline runs under test with a
/// stub embedder instead of a loaded model.
pub struct NluPipeline<E: Embed> {
    embedder: E,
    classifier: IntentClassifier,
    extractor: FieldExtractor,
}

impl<E: Embed> NluPipeline<E> {
    /// Builds the pipeline: embeds the example corpus (one batched
    /// forward pass) and fixes the entity-name scan order.
    ///
    /// # Errors
    ///
    /// Returns an error if the corpus is empty or embedding fails.
    pub fn new(embedder: E, intents: &[IntentConfig], entity_names: Vec<String>) -> Result<Self> {
        let classifier = IntentClassifier::new(&embedder, intents)?;
        let extractor = FieldExtractor::new(entity_names);
        Ok(Self {
            embedder,
            classifier,
            extractor,
        })
    }

    /// Analyzes one message: normalize, classify, extract.
    ///
    /// # Errors
    ///
    /// Returns an error only if embedding the message fails; absent
    /// fields are a normal outcome, not an error.
    pub fn analyze(&self, text: &str) -> Result<Analysis> {
        // NFC keeps accented company names comparable regardless of how
        // the client encoded them
        let text: String = text.nfc().collect();

        let intent = self.classifier.classify(&text, &self.embedder)?;
        let wcis_id = self.extractor.wcis_id(&text);
        let entity = self.extractor.entity(&text);

        tracing::debug!(
            intent = intent.intent.label(),
            score = %format!("{:.2}", intent.score),
            wcis_id = ?wcis_id,
            entity = ?entity,
            "Message analyzed"
        );

        Ok(Analysis {
            intent,
            wcis_id,
            entity,
        })
    }
}

/// Cosine of the angle between two vectors.
///
/// Edge cases all collapse to `0.0`:
/// - vectors of different lengths
/// - empty vectors
/// - a zero vector (norm 0)
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
