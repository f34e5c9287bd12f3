//! Configuration — every component config is built here and passed in at
//! construction time. Nothing reads ambient globals after startup.
//!
//! Credentials go through the [`SecretResolver`](crate::secrets::SecretResolver)
//! (managed store → environment); plain tuning knobs come straight from the
//! environment.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::deliver::{DeliveryMode, MailerConfig};
use crate::drafter::DrafterConfig;
use crate::enrich::ScraperConfig;
use crate::error::ConfigError;
use crate::llm::LlmConfig;
use crate::policy::{FollowUpPolicy, NEVER};
use crate::secrets::SecretResolver;
use crate::table::TableConfig;

/// Fully resolved application configuration.
pub struct AppConfig {
    pub table: TableConfig,
    pub llm: LlmConfig,
    pub mailer: MailerConfig,
    pub policy: FollowUpPolicy,
    pub scraper: Option<ScraperConfig>,
    pub drafter: DrafterConfig,
    /// Directory of example-email templates; built-ins are used when unset.
    pub template_dir: Option<PathBuf>,
    pub port: u16,
}

/// The stock status→interval map, used when `FOLLOWUP_POLICY_JSON` is unset.
pub fn default_intervals() -> HashMap<String, i64> {
    HashMap::from([
        ("Call Scheduled".to_string(), NEVER),
        ("Follow-up Sent".to_string(), 40),
        ("1st Message Sent".to_string(), 10),
        ("Sent LinkedIn Request".to_string(), 5),
        ("No Contact Yet".to_string(), 1),
        ("Closed".to_string(), NEVER),
        ("No need for follow-up".to_string(), NEVER),
    ])
}

impl AppConfig {
    /// Load configuration, resolving credentials through `resolver`.
    pub async fn load(resolver: &SecretResolver) -> Result<Self, ConfigError> {
        let dry_run = env_flag("FOLLOWUP_DRY_RUN", false)?;

        let table = TableConfig {
            base_url: env_or("TABLE_BASE_URL", "https://api.notion.com"),
            database_id: require_secret(resolver, "DATABASE_ID", "the hosted table to query").await?,
            token: require_secret(resolver, "NOTION_TOKEN", "the hosted table auth token").await?,
            timeout_secs: env_parsed("FOLLOWUP_HTTP_TIMEOUT_SECS", 30)?,
        };

        let llm = LlmConfig {
            api_key: require_secret(resolver, "OPENAI_API_KEY", "the generative-text API key")
                .await?,
            model: env_or("LLM_MODEL", "gpt-4o-mini"),
            base_url: env_or("LLM_BASE_URL", "https://api.openai.com"),
            timeout_secs: env_parsed("FOLLOWUP_HTTP_TIMEOUT_SECS", 30)?,
        };

        // Mail credentials are only needed when sends actually happen.
        let (username, password, operator) = if dry_run {
            (
                String::new(),
                secrecy::SecretString::from(""),
                String::new(),
            )
        } else {
            let user = require_secret(resolver, "EMAIL_USER", "the sender mailbox address").await?;
            let pass =
                require_secret(resolver, "EMAIL_PASS", "the sender mailbox password").await?;
            let operator =
                require_secret(resolver, "MY_EMAIL", "the operator recipient address").await?;
            use secrecy::ExposeSecret;
            (
                user.expose_secret().to_string(),
                pass,
                operator.expose_secret().to_string(),
            )
        };

        let mailer = MailerConfig {
            smtp_host: env_or("SMTP_HOST", "smtp.gmail.com"),
            smtp_port: env_parsed("SMTP_PORT", 587)?,
            from_address: username.clone(),
            username,
            password,
            operator_address: operator,
            mode: parse_mode(&env_or("FOLLOWUP_DELIVERY_MODE", "per-draft"))?,
            dry_run,
        };

        let intervals = match std::env::var("FOLLOWUP_POLICY_JSON") {
            Ok(json) => policy_from_json(&json)?,
            Err(_) => default_intervals(),
        };
        let policy = FollowUpPolicy::new(intervals)
            .with_missing_date_due(env_flag("FOLLOWUP_MISSING_DATE_DUE", true)?);

        let scraper = match std::env::var("SCRAPER_URL") {
            Ok(base_url) => Some(ScraperConfig {
                base_url,
                timeout_secs: env_parsed("FOLLOWUP_HTTP_TIMEOUT_SECS", 30)?,
            }),
            Err(_) => None,
        };

        let drafter = DrafterConfig {
            max_in_flight: env_parsed("FOLLOWUP_MAX_IN_FLIGHT", 1)?,
            ..DrafterConfig::default()
        };

        Ok(Self {
            table,
            llm,
            mailer,
            policy,
            scraper,
            drafter,
            template_dir: std::env::var("DRAFT_TEMPLATE_DIR").ok().map(PathBuf::from),
            port: env_parsed("PORT", 8080)?,
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

async fn require_secret(
    resolver: &SecretResolver,
    name: &str,
    hint: &str,
) -> Result<secrecy::SecretString, ConfigError> {
    resolver
        .require(name, || ConfigError::MissingRequired {
            key: name.to_string(),
            hint: format!("Set {name} in the secret store or environment ({hint})."),
        })
        .await
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{e}"),
        }),
        Err(_) => Ok(default),
    }
}

fn env_flag(key: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => match raw.as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            other => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected a boolean, got {other:?}"),
            }),
        },
        Err(_) => Ok(default),
    }
}

fn parse_mode(raw: &str) -> Result<DeliveryMode, ConfigError> {
    match raw {
        "per-draft" | "per_draft" => Ok(DeliveryMode::PerDraft),
        "digest" => Ok(DeliveryMode::Digest),
        other => Err(ConfigError::InvalidValue {
            key: "FOLLOWUP_DELIVERY_MODE".to_string(),
            message: format!("expected \"per-draft\" or \"digest\", got {other:?}"),
        }),
    }
}

fn policy_from_json(json: &str) -> Result<HashMap<String, i64>, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::InvalidValue {
        key: "FOLLOWUP_POLICY_JSON".to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_intervals_cover_the_known_statuses() {
        let intervals = default_intervals();
        assert_eq!(intervals.get("No Contact Yet"), Some(&1));
        assert_eq!(intervals.get("Follow-up Sent"), Some(&40));
        assert_eq!(intervals.get("Call Scheduled"), Some(&NEVER));
        assert_eq!(intervals.get("No need for follow-up"), Some(&NEVER));
    }

    #[test]
    fn parse_mode_variants() {
        assert_eq!(parse_mode("per-draft").unwrap(), DeliveryMode::PerDraft);
        assert_eq!(parse_mode("per_draft").unwrap(), DeliveryMode::PerDraft);
        assert_eq!(parse_mode("digest").unwrap(), DeliveryMode::Digest);
        assert!(parse_mode("broadcast").is_err());
    }

    #[test]
    fn policy_json_overrides_parse() {
        let intervals = policy_from_json(r#"{"Hot Lead": 2, "Cold": -1}"#).unwrap();
        assert_eq!(intervals.get("Hot Lead"), Some(&2));
        assert_eq!(intervals.get("Cold"), Some(&-1));
    }

    #[test]
    fn malformed_policy_json_is_rejected() {
        assert!(policy_from_json("not json").is_err());
    }

    #[test]
    fn malformed_numeric_env_is_rejected() {
        // SAFETY: test-local variable, no concurrent reader in this process.
        unsafe { std::env::set_var("FOLLOWUP_TEST_TIMEOUT", "not-a-number") };
        let result = env_parsed::<u64>("FOLLOWUP_TEST_TIMEOUT", 30);
        unsafe { std::env::remove_var("FOLLOWUP_TEST_TIMEOUT") };
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn unset_numeric_env_uses_the_default() {
        assert_eq!(env_parsed::<u64>("FOLLOWUP_TEST_UNSET", 30).unwrap(), 30);
    }
}
