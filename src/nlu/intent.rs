//! # Intent Classification
//!
//! The [`IntentClassifier`] decides what kind of question the user is
//! asking by nearest-neighbor similarity against the example corpus:
//!
//! | Intent | Example |
//! |--------|---------|
//! | [`OnboardingStatus`](Intent::OnboardingStatus) | "How far is Apple with WCIS ID 123456?" |
//! | [`PendingSteps`](Intent::PendingSteps) | "What is pending for Apple?" |
//! | [`StepStatus`](Intent::StepStatus) | "Is KYC completed for Apple?" |
//! | [`WhoIsCustomer`](Intent::WhoIsCustomer) | "Who is WCIS ID 123456 registered to?" |
//! | [`CurrentMilestone`](Intent::CurrentMilestone) | "Which milestone is Apple at?" |
//! | ... | (see the enum for the full set) |
//!
//! ## Algorithm
//!
//! ```text
//! Startup:  every example phrase → embedding   (one batched forward pass)
//! Request:  message → embedding
//!           linear scan over all example embeddings
//!           argmax of cosine similarity, first match wins ties
//! ```
//!
//! The corpus is a couple dozen phrases at most; a linear scan per
//! request is deliberate. No index, no cache, no early termination.
//!
//! The classifier itself always returns its best match with a score in
//! [-1, 1]; the orchestrator decides whether the score clears the
//! minimum-confidence threshold.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::cosine_similarity;
use super::embedder::Embed;
use crate::config::IntentConfig;

/// The kinds of question the service understands.
///
/// Deserialized from the snake_case labels in `config/intents.json`;
/// an unknown label is a startup error. Response rendering matches
/// exhaustively over this enum, so adding a variant without a renderer
/// arm is a compile error rather than a silent fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Overall onboarding progress ("How far is Apple?").
    OnboardingStatus,
    /// Steps whose status is not yet "complete".
    PendingSteps,
    /// Status of one named step ("Is KYC completed?").
    StepStatus,
    /// Which entity an identifier belongs to.
    WhoIsCustomer,
    /// Milestone the onboarding currently sits at.
    CurrentMilestone,
    /// Full milestone list.
    MilestoneStatus,
    /// Account-level milestone list.
    AccountsMilestoneStatus,
    /// Bank-side contact list.
    InternalContacts,
    /// Customer-side contact list.
    ExternalContacts,
}

impl Intent {
    /// The snake_case label, as used in config and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::OnboardingStatus => "onboarding_status",
            Intent::PendingSteps => "pending_steps",
            Intent::StepStatus => "step_status",
            Intent::WhoIsCustomer => "who_is_customer",
            Intent::CurrentMilestone => "current_milestone",
            Intent::MilestoneStatus => "milestone_status",
            Intent::AccountsMilestoneStatus => "accounts_milestone_status",
            Intent::InternalContacts => "internal_contacts",
            Intent::ExternalContacts => "external_contacts",
        }
    }
}

/// Best-matching example for a message.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentMatch {
    /// Intent of the winning example.
    pub intent: Intent,
    /// The example phrase itself (useful in debug logs).
    pub example: String,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
}

/// One example phrase with its precomputed embedding.
struct IntentExample {
    intent: Intent,
    phrase: String,
    embedding: Vec<f32>,
}

/// Nearest-neighbor intent classifier over precomputed example embeddings.
///
/// Construction embeds the whole corpus once; the table is read-only for
/// the process lifetime.
pub struct IntentClassifier {
    examples: Vec<IntentExample>,
}

impl IntentClassifier {
    /// Embeds the example corpus and builds the lookup table.
    ///
    /// Examples keep the order of the config file, which fixes the
    /// tie-break order of [`classify`](IntentClassifier::classify).
    ///
    /// # Errors
    ///
    /// Returns an error if the corpus is empty or embedding fails.
    pub fn new<E: Embed>(embedder: &E, intents: &[IntentConfig]) -> Result<Self> {
        let pairs: Vec<(Intent, &String)> = intents
            .iter()
            .flat_map(|cfg| cfg.examples.iter().map(|phrase| (cfg.intent, phrase)))
            .collect();
        if pairs.is_empty() {
            bail!("Intent corpus has no example phrases");
        }

        let phrases: Vec<String> = pairs.iter().map(|(_, p)| (*p).clone()).collect();
        let embeddings = embedder.embed_batch(&phrases)?;

        let examples = pairs
            .into_iter()
            .zip(embeddings)
            .map(|((intent, phrase), embedding)| IntentExample {
                intent,
                phrase: phrase.clone(),
                embedding,
            })
            .collect();

        Ok(Self { examples })
    }

    /// Classifies a message: embed once, linear scan, argmax.
    ///
    /// Deterministic for identical input and a frozen corpus. Ties go to
    /// the first example reaching the maximum, in corpus order.
    pub fn classify<E: Embed>(&self, text: &str, embedder: &E) -> Result<IntentMatch> {
        let embedding = embedder.embed(text)?;

        // new() rejects an empty corpus, so examples[0] exists
        let mut best = &self.examples[0];
        let mut best_score = cosine_similarity(&embedding, &best.embedding);
        for example in &self.examples[1..] {
            let score = cosine_similarity(&embedding, &example.embedding);
            if score > best_score {
                best = example;
                best_score = score;
            }
        }

        Ok(IntentMatch {
            intent: best.intent,
            example: best.phrase.clone(),
            score: best_score,
        })
    }
}
