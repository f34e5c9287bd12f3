//! Contact entity and the hosted-table record normalizer.
//!
//! The hosted table returns deeply nested "page" records where every property
//! is wrapped in a type-tagged object (`title`, `rich_text`, `select`, ...).
//! The normalizer flattens one page into a `Contact` with plain named fields.
//! A `Contact` is immutable for the duration of a run — company research is
//! joined from a separate map, never written back onto the entity.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// One networking relationship, normalized from a single table record.
///
/// `id` is the only required field; everything else may be absent
/// (absence is `None`, never an empty string).
#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    /// Opaque record identifier from the hosted table.
    pub id: String,
    pub name: Option<String>,
    pub created_time: Option<DateTime<Utc>>,
    pub last_edited_time: Option<DateTime<Utc>>,
    /// URL of the source page in the hosted table.
    pub url: Option<String>,
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
    /// Raw calendar-date string as returned by the table (e.g. "2024-05-01").
    /// Parsed lazily by the policy engine so an unparsable value fails closed
    /// there instead of dropping the whole record here.
    pub date_last_contacted: Option<String>,
    pub status: Option<String>,
    pub next_steps: Option<String>,
    pub role: Option<String>,
    pub contact_type: Option<String>,
    pub meeting_notes: Option<String>,
    pub company: Option<String>,
}

impl Contact {
    /// Normalize one raw page record. Returns `None` (logged) when the record
    /// has no identifier — such records cannot participate in the pipeline.
    pub fn from_page(page: &Value) -> Option<Self> {
        let Some(id) = page.get("id").and_then(Value::as_str) else {
            warn!("Skipping table record without an id");
            return None;
        };

        let props = page.get("properties").unwrap_or(&Value::Null);

        Some(Self {
            id: id.to_string(),
            name: title_text(props, "Name of the Contact"),
            created_time: timestamp(page, "created_time"),
            last_edited_time: timestamp(page, "last_edited_time"),
            url: page
                .get("url")
                .and_then(Value::as_str)
                .map(str::to_string),
            email: props
                .get("Email")
                .and_then(|p| p.get("email"))
                .and_then(Value::as_str)
                .map(str::to_string),
            linkedin_url: props
                .get("LinkedIn URL")
                .and_then(|p| p.get("url"))
                .and_then(Value::as_str)
                .map(str::to_string),
            date_last_contacted: props
                .get("Date Last Contacted")
                .and_then(|p| p.get("date"))
                .and_then(|d| d.get("start"))
                .and_then(Value::as_str)
                .map(str::to_string),
            status: select_name(props, "Status"),
            next_steps: rich_text(props, "Next Steps"),
            role: rich_text(props, "Role"),
            contact_type: select_name(props, "Contact Type"),
            meeting_notes: rich_text(props, "Meeting notes/other"),
            company: rich_text(props, "Company"),
        })
    }

    /// Display name for logging — falls back to the record id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

// ── Property extraction helpers ─────────────────────────────────────

/// Join a `title` property's text fragments with spaces.
fn title_text(props: &Value, key: &str) -> Option<String> {
    join_plain_text(props.get(key)?.get("title")?)
}

/// Join a `rich_text` property's text fragments with spaces.
fn rich_text(props: &Value, key: &str) -> Option<String> {
    join_plain_text(props.get(key)?.get("rich_text")?)
}

/// Extract a `select` property's option name.
fn select_name(props: &Value, key: &str) -> Option<String> {
    props
        .get(key)?
        .get("select")?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

/// Join an array of text objects on their `plain_text` field.
/// An empty fragment list yields `None`, not an empty string.
fn join_plain_text(fragments: &Value) -> Option<String> {
    let parts: Vec<&str> = fragments
        .as_array()?
        .iter()
        .filter_map(|t| t.get("plain_text").and_then(Value::as_str))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Parse a top-level RFC 3339 timestamp field on the page record.
fn timestamp(page: &Value, key: &str) -> Option<DateTime<Utc>> {
    page.get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_page() -> Value {
        json!({
            "id": "page-123",
            "created_time": "2024-03-01T10:00:00.000Z",
            "last_edited_time": "2024-04-15T18:30:00.000Z",
            "url": "https://table.example.com/page-123",
            "properties": {
                "Name of the Contact": {
                    "title": [
                        {"plain_text": "Ada"},
                        {"plain_text": "Lovelace"}
                    ]
                },
                "Email": {"email": "ada@example.com"},
                "LinkedIn URL": {"url": "https://linkedin.com/in/ada"},
                "Date Last Contacted": {"date": {"start": "2024-04-01"}},
                "Status": {"select": {"name": "Follow-up Sent"}},
                "Next Steps": {"rich_text": [{"plain_text": "Schedule a call"}]},
                "Role": {"rich_text": [{"plain_text": "Engineer"}]},
                "Contact Type": {"select": {"name": "Recruiter"}},
                "Meeting notes/other": {"rich_text": [{"plain_text": "Met at conf"}]},
                "Company": {"rich_text": [{"plain_text": "Analytical"}, {"plain_text": "Engines"}]}
            }
        })
    }

    #[test]
    fn normalizes_full_record() {
        let contact = Contact::from_page(&sample_page()).unwrap();
        assert_eq!(contact.id, "page-123");
        assert_eq!(contact.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(contact.email.as_deref(), Some("ada@example.com"));
        assert_eq!(contact.linkedin_url.as_deref(), Some("https://linkedin.com/in/ada"));
        assert_eq!(contact.date_last_contacted.as_deref(), Some("2024-04-01"));
        assert_eq!(contact.status.as_deref(), Some("Follow-up Sent"));
        assert_eq!(contact.next_steps.as_deref(), Some("Schedule a call"));
        assert_eq!(contact.role.as_deref(), Some("Engineer"));
        assert_eq!(contact.contact_type.as_deref(), Some("Recruiter"));
        assert_eq!(contact.meeting_notes.as_deref(), Some("Met at conf"));
        assert_eq!(contact.company.as_deref(), Some("Analytical Engines"));
        assert!(contact.created_time.is_some());
        assert!(contact.last_edited_time.is_some());
    }

    #[test]
    fn missing_properties_become_none() {
        let page = json!({"id": "sparse-1", "properties": {}});
        let contact = Contact::from_page(&page).unwrap();
        assert_eq!(contact.id, "sparse-1");
        assert!(contact.name.is_none());
        assert!(contact.email.is_none());
        assert!(contact.status.is_none());
        assert!(contact.date_last_contacted.is_none());
        assert!(contact.created_time.is_none());
    }

    #[test]
    fn record_without_id_is_dropped() {
        let page = json!({"properties": {"Email": {"email": "x@y.com"}}});
        assert!(Contact::from_page(&page).is_none());
    }

    #[test]
    fn empty_title_array_is_none_not_empty_string() {
        let page = json!({
            "id": "t-1",
            "properties": {"Name of the Contact": {"title": []}}
        });
        let contact = Contact::from_page(&page).unwrap();
        assert!(contact.name.is_none());
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let page = json!({"id": "anon-7", "properties": {}});
        let contact = Contact::from_page(&page).unwrap();
        assert_eq!(contact.display_name(), "anon-7");
    }

    #[test]
    fn unparsable_timestamp_is_none() {
        let page = json!({"id": "t-2", "created_time": "yesterday", "properties": {}});
        let contact = Contact::from_page(&page).unwrap();
        assert!(contact.created_time.is_none());
    }
}
