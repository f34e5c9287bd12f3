//! Two-tier secret resolution: managed store first, process environment second.
//!
//! A store miss or store failure of any kind falls back silently to a
//! same-named environment variable. The resolver never fails its caller —
//! `None` means neither source had the value, and callers decide what absence
//! means for them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::error::SecretError;

/// A managed secret store backend.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn fetch(&self, name: &str) -> Result<String, SecretError>;
}

// ── HTTP-backed store ───────────────────────────────────────────────

/// Managed secret store accessed over HTTP: `GET {base}/v1/secrets/{name}`
/// returns `{"value": "..."}`, optionally bearer-token authenticated.
pub struct HttpSecretStore {
    base_url: String,
    token: Option<SecretString>,
    http: reqwest::Client,
}

#[derive(serde::Deserialize)]
struct SecretPayload {
    value: Option<String>,
}

impl HttpSecretStore {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<SecretString>,
    ) -> Result<Self, SecretError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SecretError::Request(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            token,
            http,
        })
    }
}

#[async_trait]
impl SecretStore for HttpSecretStore {
    async fn fetch(&self, name: &str) -> Result<String, SecretError> {
        let url = format!("{}/v1/secrets/{name}", self.base_url.trim_end_matches('/'));
        let mut request = self.http.get(&url);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| SecretError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SecretError::Status {
                name: name.to_string(),
                status: response.status().as_u16(),
            });
        }

        let payload: SecretPayload = response
            .json()
            .await
            .map_err(|e| SecretError::Request(e.to_string()))?;

        payload.value.ok_or_else(|| SecretError::MissingValue {
            name: name.to_string(),
        })
    }
}

// ── Resolver ────────────────────────────────────────────────────────

/// Resolves named credentials, consulting the store (when configured) before
/// the process environment.
#[derive(Clone)]
pub struct SecretResolver {
    store: Option<Arc<dyn SecretStore>>,
}

impl SecretResolver {
    /// Resolver backed by the environment only.
    pub fn env_only() -> Self {
        Self { store: None }
    }

    /// Resolver that consults `store` first, env second.
    pub fn with_store(store: Arc<dyn SecretStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Resolve `name`. Empty values from either source count as absent.
    pub async fn resolve(&self, name: &str) -> Option<SecretString> {
        if let Some(ref store) = self.store {
            match store.fetch(name).await {
                Ok(value) if !value.is_empty() => return Some(SecretString::from(value)),
                Ok(_) => {
                    debug!(secret = name, "Store returned empty value, trying environment");
                }
                Err(e) => {
                    debug!(secret = name, error = %e, "Store lookup failed, trying environment");
                }
            }
        }

        std::env::var(name)
            .ok()
            .filter(|v| !v.is_empty())
            .map(SecretString::from)
    }

    /// Resolve `name` or fail with the caller's error.
    pub async fn require<E>(&self, name: &str, err: impl FnOnce() -> E) -> Result<SecretString, E> {
        self.resolve(name).await.ok_or_else(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeStore {
        values: HashMap<String, String>,
        fail: bool,
    }

    #[async_trait]
    impl SecretStore for FakeStore {
        async fn fetch(&self, name: &str) -> Result<String, SecretError> {
            if self.fail {
                return Err(SecretError::Request("store down".into()));
            }
            self.values
                .get(name)
                .cloned()
                .ok_or_else(|| SecretError::Status {
                    name: name.to_string(),
                    status: 404,
                })
        }
    }

    #[tokio::test]
    async fn store_hit_wins_over_environment() {
        let mut values = HashMap::new();
        values.insert("API_TOKEN_TEST_A".to_string(), "from-store".to_string());
        let resolver =
            SecretResolver::with_store(Arc::new(FakeStore { values, fail: false }));

        // SAFETY: test-local variable, no concurrent reader in this process.
        unsafe { std::env::set_var("API_TOKEN_TEST_A", "from-env") };
        let value = resolver.resolve("API_TOKEN_TEST_A").await.unwrap();
        assert_eq!(value.expose_secret(), "from-store");
        unsafe { std::env::remove_var("API_TOKEN_TEST_A") };
    }

    #[tokio::test]
    async fn store_miss_falls_back_to_environment() {
        let resolver = SecretResolver::with_store(Arc::new(FakeStore {
            values: HashMap::new(),
            fail: false,
        }));

        // SAFETY: test-local variable, no concurrent reader in this process.
        unsafe { std::env::set_var("API_TOKEN_TEST_B", "from-env") };
        let value = resolver.resolve("API_TOKEN_TEST_B").await.unwrap();
        assert_eq!(value.expose_secret(), "from-env");
        unsafe { std::env::remove_var("API_TOKEN_TEST_B") };
    }

    #[tokio::test]
    async fn store_failure_falls_back_silently() {
        let resolver = SecretResolver::with_store(Arc::new(FakeStore {
            values: HashMap::new(),
            fail: true,
        }));

        // SAFETY: test-local variable, no concurrent reader in this process.
        unsafe { std::env::set_var("API_TOKEN_TEST_C", "from-env") };
        let value = resolver.resolve("API_TOKEN_TEST_C").await.unwrap();
        assert_eq!(value.expose_secret(), "from-env");
        unsafe { std::env::remove_var("API_TOKEN_TEST_C") };
    }

    #[test]
    fn http_store_construction_reports_client_setup_errors() {
        let store = HttpSecretStore::new("http://localhost:9", None);
        assert!(store.is_ok());
    }

    #[tokio::test]
    async fn absent_everywhere_is_none_not_an_error() {
        let resolver = SecretResolver::env_only();
        assert!(resolver.resolve("API_TOKEN_TEST_MISSING").await.is_none());
    }

    #[tokio::test]
    async fn empty_env_value_counts_as_absent() {
        let resolver = SecretResolver::env_only();
        // SAFETY: test-local variable, no concurrent reader in this process.
        unsafe { std::env::set_var("API_TOKEN_TEST_D", "") };
        assert!(resolver.resolve("API_TOKEN_TEST_D").await.is_none());
        unsafe { std::env::remove_var("API_TOKEN_TEST_D") };
    }
}
