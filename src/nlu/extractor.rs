//! # Field Extraction
//!
//! The [`FieldExtractor`] pulls the two identifying fields out of a raw
//! message:
//!
//! | Field | Strategy | Example |
//! |-------|----------|---------|
//! | WCIS ID | first `\b\d{6,}\b` match | "…with WCIS ID **123456**?" |
//! | Entity | case-insensitive containment of a known name | "How far is **Apple**…" |
//!
//! Known entity names come from the record store at startup and are
//! scanned longest-first (then lexicographically), so when both
//! "Apple Inc" and "Apple" are known and present, the longer name wins.
//! The scan order is fixed at construction; extraction is deterministic.
//!
//! Both extractors return `None` when nothing matches. Absence is a
//! routing outcome the orchestrator handles, not an error.

use regex::Regex;

/// Extracts WCIS IDs and entity names from free text.
pub struct FieldExtractor {
    /// Matches a run of 6 or more digits on word boundaries.
    id_re: Regex,
    /// Known entity names as (original, lowercase) pairs, longest first.
    entity_names: Vec<(String, String)>,
}

impl FieldExtractor {
    /// Builds an extractor over the given set of known entity names.
    ///
    /// Names are re-sorted longest-first (then lexicographically) here,
    /// so callers do not have to pre-order them.
    pub fn new(mut entity_names: Vec<String>) -> Self {
        entity_names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let entity_names = entity_names
            .into_iter()
            .map(|name| {
                let lower = name.to_lowercase();
                (name, lower)
            })
            .collect();
        Self {
            id_re: Regex::new(r"\b\d{6,}\b").unwrap(),
            entity_names,
        }
    }

    /// First run of 6+ digits in the text, or `None`.
    pub fn wcis_id(&self, text: &str) -> Option<String> {
        self.id_re.find(text).map(|m| m.as_str().to_string())
    }

    /// First known entity name contained in the text (any casing),
    /// or `None`. Returns the name in its stored spelling.
    pub fn entity(&self, text: &str) -> Option<String> {
        let lower = text.to_lowercase();
        self.entity_names
            .iter()
            .find(|(_, name_lower)| lower.contains(name_lower))
            .map(|(name, _)| name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> FieldExtractor {
        FieldExtractor::new(vec![
            "Apple".to_string(),
            "Adobe".to_string(),
            "Apple Inc".to_string(),
        ])
    }

    // ─── wcis_id ───────────────────────────────────────────────

    #[test]
    fn id_needs_six_digits() {
        let ext = extractor();
        assert_eq!(ext.wcis_id("WCIS ID 123456"), Some("123456".to_string()));
        assert_eq!(ext.wcis_id("WCIS ID 12345"), None);
    }

    #[test]
    fn id_takes_the_first_match() {
        let ext = extractor();
        assert_eq!(
            ext.wcis_id("ids 111111 and 222222"),
            Some("111111".to_string())
        );
    }

    #[test]
    fn id_respects_word_boundaries() {
        let ext = extractor();
        assert_eq!(ext.wcis_id("ref#123456."), Some("123456".to_string()));
        // Digits glued to letters sit on no word boundary
        assert_eq!(ext.wcis_id("ab123456cd"), None);
        assert_eq!(ext.wcis_id("no digits here"), None);
    }

    #[test]
    fn longer_runs_are_kept_whole() {
        let ext = extractor();
        assert_eq!(
            ext.wcis_id("account 1234567890"),
            Some("1234567890".to_string())
        );
    }

    // ─── entity ────────────────────────────────────────────────

    #[test]
    fn entity_is_found_in_any_casing() {
        let ext = extractor();
        assert_eq!(
            ext.entity("how far is aPpLe with wcis id 123456?"),
            Some("Apple".to_string())
        );
    }

    #[test]
    fn entity_absent_when_no_known_name() {
        let ext = extractor();
        assert_eq!(ext.entity("how far is Globex?"), None);
    }

    #[test]
    fn longest_name_wins() {
        let ext = extractor();
        assert_eq!(
            ext.entity("status of Apple Inc please"),
            Some("Apple Inc".to_string())
        );
        // The shorter name still matches on its own
        assert_eq!(ext.entity("status of Apple please"), Some("Apple".to_string()));
    }

    #[test]
    fn no_names_means_no_entity() {
        let ext = FieldExtractor::new(Vec::new());
        assert_eq!(ext.entity("how far is Apple?"), None);
    }
}
