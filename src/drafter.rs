//! Draft generator — one personalized follow-up email per due contact.
//!
//! Contacts are processed in order, one completion request each. The default
//! is strictly sequential (call-volume limits, deterministic logs); when
//! `max_in_flight` is raised, an order-preserving bounded fan-out is used
//! instead. A single contact's failure never aborts the batch and no retries
//! are performed — the contact is logged and dropped from the output.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use tracing::{info, warn};

use crate::enrich::{CompanyResearch, EnrichmentMap};
use crate::error::DraftError;
use crate::filter::Prospect;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

/// System prompt for every draft request.
const SYSTEM_PROMPT: &str = "You are an assistant that drafts networking follow-up \
emails on behalf of your user. These emails are essential to their career. \
Write only the email body — no commentary, no subject line.";

// ── Templates ───────────────────────────────────────────────────────

/// Example-email templates keyed by contact status, with a default set for
/// statuses that have no dedicated examples.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    by_status: HashMap<String, String>,
    default: String,
}

/// Built-in default examples, used when no template directory is configured.
const DEFAULT_EXAMPLES: &str = include_str!("templates/default.txt");
const FIRST_TOUCH_EXAMPLES: &str = include_str!("templates/no_contact_yet.txt");
const FOLLOW_UP_EXAMPLES: &str = include_str!("templates/follow_up_sent.txt");

impl TemplateSet {
    /// The built-in example sets.
    pub fn builtin() -> Self {
        let mut by_status = HashMap::new();
        by_status.insert("No Contact Yet".to_string(), FIRST_TOUCH_EXAMPLES.to_string());
        by_status.insert("Follow-up Sent".to_string(), FOLLOW_UP_EXAMPLES.to_string());
        Self {
            by_status,
            default: DEFAULT_EXAMPLES.to_string(),
        }
    }

    /// Load templates from a directory of `.txt` files, one per status.
    ///
    /// The file stem is the status label with spaces as underscores, matched
    /// case-insensitively; `default.txt` replaces the fallback set. Statuses
    /// without a file keep the built-in examples.
    pub fn from_dir(dir: &Path) -> std::io::Result<Self> {
        let mut set = Self::builtin();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let text = std::fs::read_to_string(&path)?;
            if stem.eq_ignore_ascii_case("default") {
                set.default = text;
            } else {
                set.by_status.insert(stem.replace('_', " "), text);
            }
        }
        Ok(set)
    }

    /// Examples for a status, falling back to the default set.
    pub fn for_status(&self, status: Option<&str>) -> &str {
        status
            .and_then(|s| {
                self.by_status
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(s))
                    .map(|(_, v)| v.as_str())
            })
            .unwrap_or(&self.default)
    }
}

// ── Drafter ─────────────────────────────────────────────────────────

/// Configuration for the draft loop.
#[derive(Debug, Clone)]
pub struct DrafterConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Completion requests in flight at once. 1 (the default) keeps the loop
    /// strictly sequential; higher values fan out but preserve output order.
    pub max_in_flight: usize,
}

impl Default for DrafterConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 512,
            max_in_flight: 1,
        }
    }
}

/// A generated follow-up email paired with its contact.
#[derive(Debug, Clone, Serialize)]
pub struct Draft {
    pub prospect: Prospect,
    pub body: String,
}

/// Generates follow-up drafts for filtered contacts.
pub struct Drafter {
    llm: Arc<dyn LlmProvider>,
    templates: TemplateSet,
    config: DrafterConfig,
}

impl Drafter {
    pub fn new(llm: Arc<dyn LlmProvider>, templates: TemplateSet, config: DrafterConfig) -> Self {
        Self {
            llm,
            templates,
            config,
        }
    }

    /// Draft one email per prospect. Failed generations are omitted from the
    /// output; successful ones keep the input order.
    pub async fn draft_all(
        &self,
        prospects: &[Prospect],
        research: &EnrichmentMap,
    ) -> Vec<Draft> {
        let width = self.config.max_in_flight.max(1);
        info!(
            count = prospects.len(),
            in_flight = width,
            "Generating follow-up drafts"
        );

        let requests: Vec<_> = prospects
            .iter()
            .map(|p| self.draft_one(p, research.get(&p.contact_id)))
            .collect();
        let results: Vec<Result<Draft, DraftError>> = futures::stream::iter(requests)
            .buffered(width)
            .collect()
            .await;

        let mut drafts = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(draft) => drafts.push(draft),
                Err(e) => warn!(error = %e, "Skipping contact"),
            }
        }

        info!(
            drafted = drafts.len(),
            total = prospects.len(),
            "Draft generation complete"
        );
        drafts
    }

    async fn draft_one(
        &self,
        prospect: &Prospect,
        research: Option<&CompanyResearch>,
    ) -> Result<Draft, DraftError> {
        let examples = self.templates.for_status(prospect.status.as_deref());
        let request = CompletionRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(prospect, research, examples)),
        ])
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        let completion =
            self.llm
                .complete(request)
                .await
                .map_err(|e| DraftError::Generation {
                    contact: prospect.display_name().to_string(),
                    reason: e.to_string(),
                })?;

        info!(contact = prospect.display_name(), "Drafted follow-up email");
        Ok(Draft {
            prospect: prospect.clone(),
            body: completion.content,
        })
    }
}

/// Compose the user prompt from contact fields, research, and example emails.
fn build_user_prompt(
    prospect: &Prospect,
    research: Option<&CompanyResearch>,
    examples: &str,
) -> String {
    let mut prompt = format!(
        "Here are some example emails:\n{examples}\n\n\
         Write a follow-up email to {name} at {company}.\n\
         - Role: {role}\n\
         - Status: {status}\n\
         - Meeting notes: {notes}\n",
        name = prospect.name.as_deref().unwrap_or("this contact"),
        company = prospect.company.as_deref().unwrap_or("their company"),
        role = prospect.role.as_deref().unwrap_or("unknown"),
        status = prospect.status.as_deref().unwrap_or("unknown"),
        notes = prospect.meeting_notes.as_deref().unwrap_or("none"),
    );

    if let Some(summary) = research.and_then(|r| r.summary.as_deref()) {
        prompt.push_str(&format!("\nRecent information about the company:\n{summary}\n"));
    }

    prompt.push_str(
        "\nThe email should be professional and courteous while being pithy and powerful.",
    );
    prompt
}
