//! Record store: named collections of onboarding records, loaded once
//! from a local JSON file and read-only afterwards.
//!
//! Two file shapes are accepted:
//!
//! ```json
//! [ {"company": "Apple", ...} ]                      // flat array
//! { "clients": [...], "corporate": [...] }           // named collections
//! ```
//!
//! A flat array becomes the default `clients` collection. Intents may
//! route to a named collection via their `source` annotation; everything
//! else reads `clients`.
//!
//! Lookup is a single-field conjunction (exact WCIS ID, anchored
//! case-insensitive entity name) returning at most one record. The store
//! enforces no uniqueness of its own; the first match in collection
//! order wins. An empty filter finds nothing: a query from which no
//! identifying field could be extracted must not pick an arbitrary
//! record.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Collection consulted when an intent has no `source` annotation.
pub const DEFAULT_COLLECTION: &str = "clients";

/// A loosely-typed onboarding record.
///
/// Every field is optional; the renderer substitutes placeholders for
/// whatever is missing. Aliases accept the field spellings used by the
/// corporate data files (`LegalEntityName`, `wcisId`, ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientRecord {
    /// Company / legal entity the record describes.
    #[serde(default, alias = "LegalEntityName")]
    pub company: Option<String>,
    /// Numeric identifier, stored as a string.
    #[serde(default, alias = "wcisId")]
    pub wcis_id: Option<String>,
    /// Overall onboarding progress, e.g. `"70%"`.
    #[serde(default)]
    pub status: Option<String>,
    /// Onboarding step name → step status. BTreeMap keeps replies in a
    /// stable order.
    #[serde(default)]
    pub steps: BTreeMap<String, String>,
    /// Milestone the onboarding currently sits at.
    #[serde(default, alias = "currentMilestone")]
    pub current_milestone: Option<String>,
    /// Milestone history, kept untyped.
    #[serde(default)]
    pub milestones: Vec<serde_json::Value>,
    /// Account-level milestones, kept untyped.
    #[serde(default, alias = "accountsMilestones")]
    pub accounts_milestones: Vec<serde_json::Value>,
    /// Bank-side contacts, kept untyped.
    #[serde(default, alias = "internalContacts")]
    pub internal_contacts: Vec<serde_json::Value>,
    /// Customer-side contacts, kept untyped.
    #[serde(default, alias = "externalContacts")]
    pub external_contacts: Vec<serde_json::Value>,
}

/// Conjunction filter over the two identifying fields.
///
/// A present `wcis_id` requires exact equality; a present `entity`
/// requires anchored case-insensitive equality with the record's
/// company name. Both present means both must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub wcis_id: Option<String>,
    pub entity: Option<String>,
}

impl RecordFilter {
    /// True when no identifying field was extracted.
    pub fn is_empty(&self) -> bool {
        self.wcis_id.is_none() && self.entity.is_none()
    }

    /// Whether `record` satisfies every present constraint.
    pub fn matches(&self, record: &ClientRecord) -> bool {
        if self.is_empty() {
            return false;
        }
        if let Some(id) = &self.wcis_id {
            if record.wcis_id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if let Some(entity) = &self.entity {
            let matched = record
                .company
                .as_deref()
                .is_some_and(|company| company.to_lowercase() == entity.to_lowercase());
            if !matched {
                return false;
            }
        }
        true
    }
}

/// Accepts both file shapes; see the module docs.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordsFile {
    Collections(HashMap<String, Vec<ClientRecord>>),
    Flat(Vec<ClientRecord>),
}

/// In-memory, read-only record store.
pub struct RecordStore {
    collections: HashMap<String, Vec<ClientRecord>>,
}

impl RecordStore {
    /// Loads the store from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or matches neither
    /// accepted shape.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read records file {}", path.display()))?;
        let file: RecordsFile = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse records file {}", path.display()))?;

        let collections = match file {
            RecordsFile::Collections(map) => map,
            RecordsFile::Flat(records) => {
                HashMap::from([(DEFAULT_COLLECTION.to_string(), records)])
            }
        };

        let total: usize = collections.values().map(Vec::len).sum();
        tracing::info!(
            collections = collections.len(),
            records = total,
            "Record store loaded"
        );
        Ok(Self { collections })
    }

    /// Builds a store from a flat record list (used by tests).
    pub fn from_records(records: Vec<ClientRecord>) -> Self {
        Self {
            collections: HashMap::from([(DEFAULT_COLLECTION.to_string(), records)]),
        }
    }

    pub fn has_collection(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Returns at most one record from `collection` (default `clients`)
    /// satisfying `filter`. An empty filter returns `None`.
    pub fn find(&self, collection: Option<&str>, filter: &RecordFilter) -> Option<&ClientRecord> {
        if filter.is_empty() {
            return None;
        }
        let name = collection.unwrap_or(DEFAULT_COLLECTION);
        self.collections
            .get(name)?
            .iter()
            .find(|record| filter.matches(record))
    }

    /// Every known company name, deduplicated case-insensitively and
    /// ordered longest-first (then lexicographically).
    ///
    /// The extractor scans names in this order, so a message mentioning
    /// "Apple Inc" resolves to that name even when "Apple" is also known.
    pub fn entity_names(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut names: Vec<String> = self
            .collections
            .values()
            .flatten()
            .filter_map(|record| record.company.clone())
            .filter(|name| seen.insert(name.to_lowercase()))
            .collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        names
    }
}
