//! # Query Orchestration
//!
//! The [`Orchestrator`] runs the whole answer path for one message:
//!
//! ```text
//! Message
//!   ├── small-talk shortcut ────────────→ canned greeting (no model, no store)
//!   ├── NLU analysis (classify + extract)
//!   ├── score < threshold ──────────────→ canned "couldn't understand"
//!   ├── no identifying field ───────────→ canned "no record found"
//!   ├── store lookup (per-intent source)
//!   │     └── no match ─────────────────→ canned "no record found"
//!   └── render(intent, record)
//! ```
//!
//! Linear, read-only, no loops back. Errors bubble up as
//! `anyhow::Result`; the web handler turns them into the apology reply.

use std::collections::HashMap;

use anyhow::Result;

use crate::config::IntentConfig;
use crate::nlu::embedder::Embed;
use crate::nlu::intent::Intent;
use crate::nlu::NluPipeline;
use crate::render::{render, Reply, GREETING_REPLY, NOT_FOUND_REPLY, UNKNOWN_INTENT_REPLY};
use crate::store::{RecordFilter, RecordStore};

/// Classification scores below this answer with the canned
/// "couldn't understand" reply instead of acting on a junk match.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.35;

/// Greeting phrases answered directly, bypassing the pipeline.
/// Single words match whole words only; phrases match as substrings.
const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "how are you",
    "thank you",
    "thanks",
];

/// Orchestrates NLU, lookup, and rendering for each request.
///
/// Immutable after construction; shared behind an `Arc` by the web
/// layer. Nothing on this path mutates state, so no locking is needed.
pub struct Orchestrator<E: Embed> {
    pipeline: NluPipeline<E>,
    store: RecordStore,
    /// Intent → record collection, from the `source` config annotation.
    sources: HashMap<Intent, String>,
    min_confidence: f32,
}

impl<E: Embed> Orchestrator<E> {
    pub fn new(
        pipeline: NluPipeline<E>,
        store: RecordStore,
        intents: &[IntentConfig],
        min_confidence: f32,
    ) -> Self {
        let sources = intents
            .iter()
            .filter_map(|cfg| {
                cfg.source
                    .as_ref()
                    .map(|source| (cfg.intent, source.clone()))
            })
            .collect();
        Self {
            pipeline,
            store,
            sources,
            min_confidence,
        }
    }

    /// Answers one message.
    ///
    /// # Errors
    ///
    /// Returns an error only when the NLU pipeline fails (embedding);
    /// every "soft" miss (low confidence, nothing extracted, no record)
    /// is a canned [`Reply`], not an error.
    pub fn handle(&self, message: &str) -> Result<Reply> {
        if is_small_talk(message) {
            tracing::debug!("Small talk, answering without lookup");
            return Ok(Reply::Text(GREETING_REPLY.to_string()));
        }

        let analysis = self.pipeline.analyze(message)?;

        if analysis.intent.score < self.min_confidence {
            tracing::info!(
                intent = analysis.intent.intent.label(),
                score = %format!("{:.2}", analysis.intent.score),
                "Best match below confidence threshold"
            );
            return Ok(Reply::Text(UNKNOWN_INTENT_REPLY.to_string()));
        }

        let filter = RecordFilter {
            wcis_id: analysis.wcis_id.clone(),
            entity: analysis.entity.clone(),
        };
        if filter.is_empty() {
            tracing::info!("No identifying field extracted, skipping lookup");
            return Ok(Reply::Text(NOT_FOUND_REPLY.to_string()));
        }

        let intent = analysis.intent.intent;
        let source = self.sources.get(&intent).map(String::as_str);
        match self.store.find(source, &filter) {
            Some(record) => Ok(render(intent, record, message, analysis.wcis_id.as_deref())),
            None => {
                tracing::info!(?filter, "No record matched");
                Ok(Reply::Text(NOT_FOUND_REPLY.to_string()))
            }
        }
    }
}

/// Whether the lowercased, trimmed message is plain small talk.
///
/// Single-word greetings must appear as a whole word ("hi" does not
/// fire inside "which"); multi-word greetings match as phrases.
fn is_small_talk(message: &str) -> bool {
    let lower = message.trim().to_lowercase();
    GREETINGS.iter().any(|greeting| {
        if greeting.contains(' ') {
            lower.contains(greeting)
        } else {
            lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word == *greeting)
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::nlu::embedder::testing::StubEmbedder;
    use crate::store::ClientRecord;

    const STATUS_EXAMPLE: &str = "How far is the company with the WCIS ID?";
    const PENDING_EXAMPLE: &str = "What is pending for the company?";

    fn intents() -> Vec<IntentConfig> {
        vec![
            IntentConfig {
                intent: Intent::OnboardingStatus,
                examples: vec![STATUS_EXAMPLE.to_string()],
                source: None,
            },
            IntentConfig {
                intent: Intent::PendingSteps,
                examples: vec![PENDING_EXAMPLE.to_string()],
                source: None,
            },
        ]
    }

    fn apple() -> ClientRecord {
        ClientRecord {
            company: Some("Apple".to_string()),
            wcis_id: Some("123456".to_string()),
            status: Some("70%".to_string()),
            steps: BTreeMap::from([("KYC".to_string(), "pending".to_string())]),
            ..ClientRecord::default()
        }
    }

    fn orchestrator(entries: &[(&str, &[f32])]) -> Orchestrator<StubEmbedder> {
        let embedder = StubEmbedder::new(entries);
        let store = RecordStore::from_records(vec![apple()]);
        let pipeline = NluPipeline::new(embedder, &intents(), store.entity_names()).unwrap();
        Orchestrator::new(pipeline, store, &intents(), DEFAULT_MIN_CONFIDENCE)
    }

    #[test]
    fn answers_the_status_question() {
        let orchestrator = orchestrator(&[
            (STATUS_EXAMPLE, &[1.0, 0.0]),
            (PENDING_EXAMPLE, &[0.0, 1.0]),
            ("How far is Apple with WCIS ID 123456?", &[0.9, 0.1]),
        ]);

        let reply = orchestrator
            .handle("How far is Apple with WCIS ID 123456?")
            .unwrap();
        assert_eq!(
            reply,
            Reply::Text("Apple onboarding is 70% complete.".to_string())
        );
    }

    #[test]
    fn small_talk_bypasses_the_pipeline() {
        // The stub has no vector for the greeting; reaching the
        // classifier would error, so a greeting proves the shortcut
        let orchestrator = orchestrator(&[
            (STATUS_EXAMPLE, &[1.0, 0.0]),
            (PENDING_EXAMPLE, &[0.0, 1.0]),
        ]);

        let reply = orchestrator.handle("Hello there!").unwrap();
        assert_eq!(reply, Reply::Text(GREETING_REPLY.to_string()));
    }

    #[test]
    fn greeting_words_do_not_fire_inside_other_words() {
        assert!(is_small_talk("hi"));
        assert!(is_small_talk("  Hey!  "));
        assert!(is_small_talk("good morning to you"));
        assert!(!is_small_talk("which steps are pending for Adobe"));
        assert!(!is_small_talk("the shipment is high priority"));
    }

    #[test]
    fn low_confidence_gets_the_fallback_reply() {
        let orchestrator = orchestrator(&[
            (STATUS_EXAMPLE, &[1.0, 0.0]),
            (PENDING_EXAMPLE, &[0.0, 1.0]),
            ("please reboot the fax machine", &[-1.0, -1.0]),
        ]);

        let reply = orchestrator.handle("please reboot the fax machine").unwrap();
        assert_eq!(reply, Reply::Text(UNKNOWN_INTENT_REPLY.to_string()));
    }

    #[test]
    fn no_identifying_field_means_not_found_without_lookup() {
        let orchestrator = orchestrator(&[
            (STATUS_EXAMPLE, &[1.0, 0.0]),
            (PENDING_EXAMPLE, &[0.0, 1.0]),
            ("How far is the onboarding going?", &[0.95, 0.0]),
        ]);

        let reply = orchestrator.handle("How far is the onboarding going?").unwrap();
        assert_eq!(reply, Reply::Text(NOT_FOUND_REPLY.to_string()));
    }

    #[test]
    fn unmatched_filter_means_not_found() {
        let orchestrator = orchestrator(&[
            (STATUS_EXAMPLE, &[1.0, 0.0]),
            (PENDING_EXAMPLE, &[0.0, 1.0]),
            ("How far is WCIS ID 999999?", &[0.9, 0.0]),
        ]);

        let reply = orchestrator.handle("How far is WCIS ID 999999?").unwrap();
        assert_eq!(reply, Reply::Text(NOT_FOUND_REPLY.to_string()));
    }

    #[test]
    fn pending_steps_end_to_end() {
        let orchestrator = orchestrator(&[
            (STATUS_EXAMPLE, &[1.0, 0.0]),
            (PENDING_EXAMPLE, &[0.0, 1.0]),
            ("What is pending for Apple with WCIS ID 123456?", &[0.1, 0.9]),
        ]);

        let reply = orchestrator
            .handle("What is pending for Apple with WCIS ID 123456?")
            .unwrap();
        assert_eq!(
            reply,
            Reply::Text("Pending steps for Apple: KYC".to_string())
        );
    }
}
