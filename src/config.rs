//! Intent-corpus configuration.
//!
//! The example corpus lives in `config/intents.json` as a JSON array:
//!
//! ```json
//! [
//!   {
//!     "intent": "onboarding_status",
//!     "examples": ["How far is Apple with WCIS ID 123456?"],
//!     "source": "clients"
//!   }
//! ]
//! ```
//!
//! `intent` must be one of the known labels ([`Intent`] is an exhaustive
//! enum, so a typo fails deserialization at startup instead of silently
//! falling through at request time). `source` optionally names the
//! record collection that intent reads from; when omitted, lookups go to
//! the default `clients` collection.
//!
//! Loaded once at startup and never reloaded.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::nlu::intent::Intent;

/// Default location of the example corpus, relative to the project root.
pub const INTENT_CONFIG_PATH: &str = "config/intents.json";

/// Default location of the records file, relative to the project root.
pub const RECORDS_PATH: &str = "data/onboarding_data.json";

/// One intent with its representative example phrases.
#[derive(Debug, Clone, Deserialize)]
pub struct IntentConfig {
    /// Intent label (validated against the [`Intent`] enum by serde).
    pub intent: Intent,
    /// Example phrases the classifier embeds at startup.
    pub examples: Vec<String>,
    /// Record collection this intent reads from, if not the default.
    #[serde(default)]
    pub source: Option<String>,
}

/// Loads and validates the example corpus from a JSON file.
///
/// # Errors
///
/// Returns an error if the file is unreadable, fails to parse, contains
/// an unknown intent label, is empty, or has an intent with no examples.
pub fn load_intents(path: impl AsRef<Path>) -> Result<Vec<IntentConfig>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read intent config {}", path.display()))?;
    let intents: Vec<IntentConfig> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse intent config {}", path.display()))?;

    if intents.is_empty() {
        bail!("Intent config {} defines no intents", path.display());
    }
    for cfg in &intents {
        if cfg.examples.is_empty() {
            bail!(
                "Intent {:?} in {} has no example phrases",
                cfg.intent.label(),
                path.display()
            );
        }
    }

    Ok(intents)
}
