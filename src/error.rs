//! Error types for the follow-up agent.

/// Top-level error type for the agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Draft error: {0}")]
    Draft(#[from] DraftError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Enrichment error: {0}")]
    Enrich(#[from] EnrichError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Hosted-table fetch errors. Any of these aborts the run — there is no retry.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Hosted table request failed: {0}")]
    Request(String),

    #[error("Hosted table returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode hosted table response: {0}")]
    Decode(String),
}

/// Managed secret store lookup errors.
///
/// These never propagate to callers of the resolver — a store failure
/// falls back to the process environment.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Secret store request failed: {0}")]
    Request(String),

    #[error("Secret store returned status {status} for {name}")]
    Status { name: String, status: u16 },

    #[error("Secret store response missing value for {name}")]
    MissingValue { name: String },
}

/// Generative-text provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider request failed: {0}")]
    RequestFailed(String),

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error("Authentication failed for provider")]
    AuthFailed,
}

/// Per-contact draft generation errors. Recovered locally — the contact is
/// dropped from the output and the batch continues.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("Draft generation failed for {contact}: {reason}")]
    Generation { contact: String, reason: String },
}

/// SMTP delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("SMTP send failed: {0}")]
    Smtp(String),
}

/// Company-scraper errors. Non-fatal — the contact is drafted without research.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("Scraper request failed: {0}")]
    Request(String),

    #[error("Scraper returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode scraper response: {0}")]
    Decode(String),
}

/// Result type alias for the agent.
pub type Result<T> = std::result::Result<T, Error>;
