//! Response rendering: one template per intent, populated from the
//! matched record.
//!
//! Replies come in two shapes, matching the wire contract
//! (`{"response": <string | object>}`): simple intents render a
//! formatted sentence, list-valued intents render a small structured
//! payload. Missing record fields become placeholder literals
//! (`"Unknown"` for names, `"Not Available"` for milestones,
//! `"unknown"` for statuses) instead of errors.

use serde::Serialize;
use serde_json::{json, Value};

use crate::nlu::intent::Intent;
use crate::store::ClientRecord;

/// Canned reply when no record matches the extracted fields (or none
/// could be extracted at all).
pub const NOT_FOUND_REPLY: &str = "Sorry, no record found.";

/// Canned reply when classification confidence is below the threshold.
pub const UNKNOWN_INTENT_REPLY: &str = "Sorry, I couldn't understand your request.";

/// Canned reply for any internal failure; detail stays in the logs.
pub const ERROR_REPLY: &str =
    "An error occurred while processing your request. Please try again later.";

/// Canned reply to small talk.
pub const GREETING_REPLY: &str =
    "Hello! Ask me about a client onboarding, for example: \"How far is Apple with WCIS ID 123456?\"";

/// Step names the step-status intent recognizes in the message text.
pub const KNOWN_STEPS: &[&str] = &["KYC", "AccountOpening", "LegalEntity"];

/// A rendered response: either a sentence or a small JSON payload.
///
/// Serialized untagged, so `Text` becomes a bare JSON string and
/// `Payload` the object itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Text(String),
    Payload(Value),
}

impl Reply {
    fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }
}

/// Renders the reply for `intent` from the matched record.
///
/// `message` is the original user text (the step-status intent scans it
/// again for a step name); `wcis_id` is the identifier extracted from
/// the message, preferred over the record's own when naming the
/// customer.
///
/// The match is exhaustive: a new [`Intent`] variant without an arm
/// here is a compile error.
pub fn render(intent: Intent, record: &ClientRecord, message: &str, wcis_id: Option<&str>) -> Reply {
    match intent {
        Intent::OnboardingStatus => Reply::text(format!(
            "{} onboarding is {} complete.",
            company(record),
            record.status.as_deref().unwrap_or("unknown")
        )),

        Intent::PendingSteps => {
            let pending: Vec<&str> = record
                .steps
                .iter()
                .filter(|(_, status)| status.as_str() != "complete")
                .map(|(step, _)| step.as_str())
                .collect();
            let listed = if pending.is_empty() {
                "None".to_string()
            } else {
                pending.join(", ")
            };
            Reply::text(format!("Pending steps for {}: {}", company(record), listed))
        }

        Intent::StepStatus => {
            let lower = message.to_lowercase();
            match KNOWN_STEPS
                .iter()
                .find(|step| lower.contains(&step.to_lowercase()))
            {
                Some(step) => {
                    let status = record
                        .steps
                        .get(*step)
                        .map(String::as_str)
                        .unwrap_or("unknown");
                    Reply::text(format!(
                        "{} status for {}: {}",
                        step,
                        company(record),
                        status
                    ))
                }
                None => Reply::text("Step not recognized."),
            }
        }

        Intent::WhoIsCustomer => {
            let id = wcis_id
                .or(record.wcis_id.as_deref())
                .unwrap_or("Unknown");
            Reply::text(format!("WCIS ID {} belongs to {}.", id, company(record)))
        }

        Intent::CurrentMilestone => Reply::text(format!(
            "Current milestone for {} is {}.",
            company(record),
            record.current_milestone.as_deref().unwrap_or("Not Available")
        )),

        Intent::MilestoneStatus => Reply::Payload(json!({
            "LegalEntityName": company(record),
            "milestones": record.milestones,
        })),

        Intent::AccountsMilestoneStatus => Reply::Payload(json!({
            "LegalEntityName": company(record),
            "accountsMilestones": record.accounts_milestones,
        })),

        Intent::InternalContacts => Reply::Payload(json!({
            "LegalEntityName": company(record),
            "internalContacts": record.internal_contacts,
        })),

        Intent::ExternalContacts => Reply::Payload(json!({
            "LegalEntityName": company(record),
            "externalContacts": record.external_contacts,
        })),
    }
}

/// Display name for the record's entity.
fn company(record: &ClientRecord) -> &str {
    record.company.as_deref().unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn apple() -> ClientRecord {
        ClientRecord {
            company: Some("Apple".to_string()),
            wcis_id: Some("123456".to_string()),
            status: Some("70%".to_string()),
            steps: BTreeMap::from([
                ("KYC".to_string(), "pending".to_string()),
                ("AccountOpening".to_string(), "complete".to_string()),
                ("LegalEntity".to_string(), "complete".to_string()),
            ]),
            ..ClientRecord::default()
        }
    }

    #[test]
    fn onboarding_status_sentence() {
        let reply = render(
            Intent::OnboardingStatus,
            &apple(),
            "How far is Apple with WCIS ID 123456?",
            Some("123456"),
        );
        assert_eq!(
            reply,
            Reply::Text("Apple onboarding is 70% complete.".to_string())
        );
    }

    #[test]
    fn pending_steps_lists_incomplete_only() {
        let reply = render(Intent::PendingSteps, &apple(), "What is pending for Apple?", None);
        assert_eq!(
            reply,
            Reply::Text("Pending steps for Apple: KYC".to_string())
        );
    }

    #[test]
    fn pending_steps_all_complete_says_none() {
        let mut record = apple();
        for status in record.steps.values_mut() {
            *status = "complete".to_string();
        }
        let reply = render(Intent::PendingSteps, &record, "What is pending?", None);
        assert_eq!(
            reply,
            Reply::Text("Pending steps for Apple: None".to_string())
        );
    }

    #[test]
    fn step_status_scans_the_message() {
        let reply = render(
            Intent::StepStatus,
            &apple(),
            "Is KYC completed for Apple with WCIS ID 123456?",
            Some("123456"),
        );
        match reply {
            Reply::Text(text) => assert!(text.contains("KYC status for Apple: pending")),
            Reply::Payload(_) => panic!("expected text reply"),
        }
    }

    #[test]
    fn step_status_is_case_insensitive() {
        let reply = render(Intent::StepStatus, &apple(), "is kyc done yet?", None);
        assert_eq!(
            reply,
            Reply::Text("KYC status for Apple: pending".to_string())
        );
    }

    #[test]
    fn step_status_unrecognized_step() {
        let reply = render(Intent::StepStatus, &apple(), "Is the paperwork done?", None);
        assert_eq!(reply, Reply::Text("Step not recognized.".to_string()));
    }

    #[test]
    fn who_is_customer_prefers_extracted_id() {
        let reply = render(Intent::WhoIsCustomer, &apple(), "who owns 999999?", Some("999999"));
        assert_eq!(
            reply,
            Reply::Text("WCIS ID 999999 belongs to Apple.".to_string())
        );
    }

    #[test]
    fn who_is_customer_falls_back_to_record_id() {
        let reply = render(Intent::WhoIsCustomer, &apple(), "who is the customer?", None);
        assert_eq!(
            reply,
            Reply::Text("WCIS ID 123456 belongs to Apple.".to_string())
        );
    }

    #[test]
    fn missing_fields_become_placeholders() {
        let record = ClientRecord::default();
        assert_eq!(
            render(Intent::OnboardingStatus, &record, "", None),
            Reply::Text("Unknown onboarding is unknown complete.".to_string())
        );
        assert_eq!(
            render(Intent::CurrentMilestone, &record, "", None),
            Reply::Text("Current milestone for Unknown is Not Available.".to_string())
        );
    }

    #[test]
    fn contact_intents_render_payloads() {
        let mut record = apple();
        record.internal_contacts = vec![serde_json::json!({"name": "Jane", "role": "KYC analyst"})];

        let reply = render(Intent::InternalContacts, &record, "who works on Apple?", None);
        match reply {
            Reply::Payload(value) => {
                assert_eq!(value["LegalEntityName"], "Apple");
                assert_eq!(value["internalContacts"][0]["name"], "Jane");
            }
            Reply::Text(_) => panic!("expected payload reply"),
        }
    }

    #[test]
    fn replies_serialize_untagged() {
        let text = serde_json::to_value(Reply::Text("hi".to_string())).unwrap();
        assert_eq!(text, serde_json::json!("hi"));

        let payload = Reply::Payload(serde_json::json!({"LegalEntityName": "Apple"}));
        let value = serde_json::to_value(payload).unwrap();
        assert_eq!(value["LegalEntityName"], "Apple");
    }
}
