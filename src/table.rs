//! Hosted-table read client.
//!
//! One outbound `POST` to the table's query endpoint, bearer-token
//! authenticated, empty JSON body — no filter or sort is pushed down, the
//! policy engine does all selection client-side. A single page of results is
//! the explicit boundary of this system; pagination is out of scope.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::contact::Contact;
use crate::error::FetchError;

/// Table API revision sent with every query.
pub const TABLE_API_VERSION: &str = "2022-06-28";

/// Something that can produce the full contact set for a run.
#[async_trait]
pub trait ContactSource: Send + Sync {
    /// Fetch all contact records. A non-success status or transport failure
    /// is fatal for the run — there is no retry.
    async fn fetch_all(&self) -> Result<Vec<Contact>, FetchError>;
}

/// Configuration for the hosted-table client.
#[derive(Clone)]
pub struct TableConfig {
    pub base_url: String,
    pub database_id: SecretString,
    pub token: SecretString,
    pub timeout_secs: u64,
}

/// Hosted-table query client.
pub struct TableClient {
    config: TableConfig,
    http: reqwest::Client,
}

#[derive(serde::Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

impl TableClient {
    pub fn new(config: TableConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self { config, http })
    }

    fn query_url(&self) -> String {
        format!(
            "{}/v1/databases/{}/query",
            self.config.base_url.trim_end_matches('/'),
            self.config.database_id.expose_secret(),
        )
    }
}

#[async_trait]
impl ContactSource for TableClient {
    async fn fetch_all(&self) -> Result<Vec<Contact>, FetchError> {
        let response = self
            .http
            .post(self.query_url())
            .bearer_auth(self.config.token.expose_secret())
            .header("Notion-Version", TABLE_API_VERSION)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let page: QueryResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let total = page.results.len();
        let contacts: Vec<Contact> = page
            .results
            .iter()
            .filter_map(Contact::from_page)
            .collect();

        if contacts.len() < total {
            warn!(
                dropped = total - contacts.len(),
                "Some table records could not be normalized"
            );
        }
        info!(count = contacts.len(), "Retrieved contacts from hosted table");

        Ok(contacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_url_includes_database_id() {
        let client = TableClient::new(TableConfig {
            base_url: "https://api.notion.com/".into(),
            database_id: SecretString::from("db-42"),
            token: SecretString::from("secret-token"),
            timeout_secs: 30,
        })
        .unwrap();
        assert_eq!(
            client.query_url(),
            "https://api.notion.com/v1/databases/db-42/query"
        );
    }

    #[test]
    fn query_response_tolerates_missing_results() {
        let page: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(page.results.is_empty());
    }
}
