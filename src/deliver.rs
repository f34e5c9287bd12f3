//! Delivery service — SMTP via lettre.
//!
//! Batch delivery sends drafts to the configured operator address, either one
//! email per draft or a single concatenated digest. Per-draft send failures
//! are logged and skipped; a digest send failure fails the whole delivery
//! step (no partial digest is attempted). The ad-hoc path returns a
//! structured outcome and never errors to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::drafter::Draft;
use crate::error::DeliveryError;

/// Subject used for ad-hoc single sends.
const ADHOC_SUBJECT: &str = "Networking Connection";

/// How batch delivery packages the drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// One email per draft. Sends are independent; an earlier success is
    /// never rolled back by a later failure.
    PerDraft,
    /// One email concatenating every draft.
    Digest,
}

/// SMTP mailer configuration.
#[derive(Clone)]
pub struct MailerConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: SecretString,
    /// Sender mailbox; also the SMTP auth user's address.
    pub from_address: String,
    /// Operator mailbox that receives the drafts.
    pub operator_address: String,
    pub mode: DeliveryMode,
    /// Log drafts instead of opening SMTP sessions.
    pub dry_run: bool,
}

/// Structured result of an ad-hoc send.
#[derive(Debug, Clone, Serialize)]
pub struct SendOutcome {
    pub success: bool,
    pub message: String,
}

/// Sink for generated drafts plus the ad-hoc single-send operation.
#[async_trait]
pub trait Deliverer: Send + Sync {
    /// Deliver all drafts per the configured mode.
    async fn deliver_all(&self, drafts: &[Draft]) -> Result<(), DeliveryError>;

    /// Send one body to one recipient. Validates both fields before any SMTP
    /// connection is made and reports failure in the outcome, never as an
    /// error.
    async fn send_adhoc(&self, recipient: &str, body: &str) -> SendOutcome;
}

/// Low-level single-message send, split out of [`Mailer`] so the batch
/// policies can be exercised without a live SMTP server.
trait SmtpSender: Send + Sync {
    fn send_message(
        &self,
        config: &MailerConfig,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError>;
}

/// Production sender: one authenticated relay session per message, `from`
/// equal to the configured sender mailbox.
struct RelaySender;

impl SmtpSender for RelaySender {
    fn send_message(
        &self,
        config: &MailerConfig,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        let creds = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = SmtpTransport::relay(&config.smtp_host)
            .map_err(|e| DeliveryError::Smtp(format!("relay setup: {e}")))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        let email = Message::builder()
            .from(
                config
                    .from_address
                    .parse()
                    .map_err(|e| DeliveryError::InvalidAddress {
                        address: config.from_address.clone(),
                        reason: format!("{e}"),
                    })?,
            )
            .to(to.parse().map_err(|e| DeliveryError::InvalidAddress {
                address: to.to_string(),
                reason: format!("{e}"),
            })?)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| DeliveryError::Build(e.to_string()))?;

        transport
            .send(&email)
            .map_err(|e| DeliveryError::Smtp(e.to_string()))?;

        Ok(())
    }
}

/// SMTP deliverer.
pub struct Mailer {
    config: MailerConfig,
    sender: Arc<dyn SmtpSender>,
}

impl Mailer {
    pub fn new(config: MailerConfig) -> Self {
        Self {
            config,
            sender: Arc::new(RelaySender),
        }
    }

    #[cfg(test)]
    fn with_sender(config: MailerConfig, sender: Arc<dyn SmtpSender>) -> Self {
        Self { config, sender }
    }

    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        if self.config.dry_run {
            info!(to, subject, "Dry run — draft not sent:\n{body}");
            return Ok(());
        }

        self.sender.send_message(&self.config, to, subject, body)?;
        info!(to, "Email sent");
        Ok(())
    }
}

#[async_trait]
impl Deliverer for Mailer {
    async fn deliver_all(&self, drafts: &[Draft]) -> Result<(), DeliveryError> {
        if drafts.is_empty() {
            info!("No drafts to deliver");
            return Ok(());
        }

        match self.config.mode {
            DeliveryMode::PerDraft => {
                for draft in drafts {
                    let subject = format!("Draft email for {}", draft.prospect.display_name());
                    if let Err(e) = self.send(&self.config.operator_address, &subject, &draft.body)
                    {
                        warn!(
                            contact = draft.prospect.display_name(),
                            error = %e,
                            "Failed to send draft, continuing with the rest"
                        );
                    }
                }
                Ok(())
            }
            DeliveryMode::Digest => {
                let subject = format!("Follow-up drafts for {} contacts", drafts.len());
                let body = digest_body(drafts);
                self.send(&self.config.operator_address, &subject, &body)
                    .map_err(|e| {
                        error!(error = %e, "Digest send failed — delivery step aborted");
                        e
                    })
            }
        }
    }

    async fn send_adhoc(&self, recipient: &str, body: &str) -> SendOutcome {
        if recipient.trim().is_empty() || body.trim().is_empty() {
            return SendOutcome {
                success: false,
                message: "Recipient email and draft are required".into(),
            };
        }

        match self.send(recipient, ADHOC_SUBJECT, body) {
            Ok(()) => SendOutcome {
                success: true,
                message: "Email sent successfully".into(),
            },
            Err(e) => {
                error!(to = recipient, error = %e, "Ad-hoc send failed");
                SendOutcome {
                    success: false,
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Concatenate drafts into one digest body.
fn digest_body(drafts: &[Draft]) -> String {
    let mut body = String::new();
    for draft in drafts {
        body.push_str(&format!(
            "Draft for {name} <{email}>\n\n{text}\n\n---\n\n",
            name = draft.prospect.display_name(),
            email = draft.prospect.email.as_deref().unwrap_or("no email"),
            text = draft.body,
        ));
    }
    body
}
