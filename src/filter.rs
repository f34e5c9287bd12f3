//! Contact filter — policy evaluation plus projection to the draft-generator
//! field set. Pure and order-preserving.

use chrono::NaiveDate;
use serde::Serialize;

use crate::contact::Contact;
use crate::policy::FollowUpPolicy;

/// A contact that is due for outreach, projected down to the fields the
/// draft generator needs. `contact_id` is carried as the join key for the
/// enrichment map; it is not rendered into prompts.
#[derive(Debug, Clone, Serialize)]
pub struct Prospect {
    pub contact_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub status: Option<String>,
    pub role: Option<String>,
    pub company: Option<String>,
    pub meeting_notes: Option<String>,
}

impl Prospect {
    /// Display name for logging and email subjects.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.contact_id)
    }
}

/// Apply the policy across `contacts` and project the due ones.
///
/// Input order is preserved; contacts that are not due are simply dropped.
pub fn select(
    contacts: &[Contact],
    policy: &FollowUpPolicy,
    today: NaiveDate,
) -> Vec<Prospect> {
    contacts
        .iter()
        .filter(|c| policy.is_due(c, today))
        .map(|c| Prospect {
            contact_id: c.id.clone(),
            name: c.name.clone(),
            email: c.email.clone(),
            status: c.status.clone(),
            role: c.role.clone(),
            company: c.company.clone(),
            meeting_notes: c.meeting_notes.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::policy::NEVER;

    fn contact(id: &str, status: &str, date_last_contacted: Option<&str>) -> Contact {
        Contact {
            id: id.into(),
            name: Some(format!("Contact {id}")),
            created_time: None,
            last_edited_time: None,
            url: None,
            email: Some(format!("{id}@example.com")),
            linkedin_url: None,
            date_last_contacted: date_last_contacted.map(String::from),
            status: Some(status.into()),
            next_steps: None,
            role: Some("Engineer".into()),
            contact_type: None,
            meeting_notes: Some("met at a meetup".into()),
            company: Some("Acme".into()),
        }
    }

    fn scenario_policy() -> FollowUpPolicy {
        let mut intervals = HashMap::new();
        intervals.insert("No Contact Yet".to_string(), 1);
        intervals.insert("Closed".to_string(), NEVER);
        FollowUpPolicy::new(intervals)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn end_to_end_scenario_keeps_only_the_due_contact() {
        // A: contacted 3 days ago with a 1-day interval → due.
        // B: "Closed" maps to NEVER → not due even after 100 days.
        let contacts = vec![
            contact("a", "No Contact Yet", Some("2024-06-12")),
            contact("b", "Closed", Some("2024-03-07")),
        ];
        let selected = select(&contacts, &scenario_policy(), today());
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].contact_id, "a");
    }

    #[test]
    fn end_to_end_scenario_missing_date_included_by_default() {
        let contacts = vec![contact("c", "No Contact Yet", None)];
        let selected = select(&contacts, &scenario_policy(), today());
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].contact_id, "c");
    }

    #[test]
    fn projection_carries_the_drafting_fields() {
        let contacts = vec![contact("a", "No Contact Yet", None)];
        let selected = select(&contacts, &scenario_policy(), today());
        let p = &selected[0];
        assert_eq!(p.name.as_deref(), Some("Contact a"));
        assert_eq!(p.email.as_deref(), Some("a@example.com"));
        assert_eq!(p.status.as_deref(), Some("No Contact Yet"));
        assert_eq!(p.role.as_deref(), Some("Engineer"));
        assert_eq!(p.company.as_deref(), Some("Acme"));
        assert_eq!(p.meeting_notes.as_deref(), Some("met at a meetup"));
    }

    #[test]
    fn selection_preserves_input_order_and_is_deterministic() {
        let contacts = vec![
            contact("z", "No Contact Yet", Some("2024-06-01")),
            contact("m", "Closed", None),
            contact("a", "No Contact Yet", Some("2024-06-02")),
            contact("k", "No Contact Yet", None),
        ];
        let policy = scenario_policy();
        let first = select(&contacts, &policy, today());
        let second = select(&contacts, &policy, today());
        let ids: Vec<&str> = first.iter().map(|p| p.contact_id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "k"]);
        assert_eq!(
            ids,
            second
                .iter()
                .map(|p| p.contact_id.as_str())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn empty_input_selects_nothing() {
        assert!(select(&[], &scenario_policy(), today()).is_empty());
    }
}
