//! Optional company enrichment via the scraping microservice.
//!
//! For each due contact with a company name, one `POST /scrape` with
//! `{"query": company}`. Results live in a map keyed by contact identifier —
//! the `Contact` itself is never mutated. Enrichment failures are logged and
//! skipped; a contact without research still gets drafted.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::EnrichError;
use crate::filter::Prospect;

/// Research attached to at most one contact, set once by the enrichment step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyResearch {
    /// Links the scraper found for the company query.
    #[serde(default)]
    pub links: Vec<String>,
    /// Scraped text from the first link, when any was reachable.
    #[serde(rename = "result")]
    pub summary: Option<String>,
}

/// Company research per contact identifier.
pub type EnrichmentMap = HashMap<String, CompanyResearch>;

/// Configuration for the scraper client.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Client for the company-scraping HTTP service.
pub struct ScraperClient {
    config: ScraperConfig,
    http: reqwest::Client,
}

impl ScraperClient {
    pub fn new(config: ScraperConfig) -> Result<Self, EnrichError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EnrichError::Request(e.to_string()))?;
        Ok(Self { config, http })
    }

    /// Run one scrape query for a company name.
    pub async fn research(&self, query: &str) -> Result<CompanyResearch, EnrichError> {
        let url = format!("{}/scrape", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(|e| EnrichError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| EnrichError::Decode(e.to_string()))
    }

    /// Enrich every prospect that names a company, strictly sequentially.
    ///
    /// Failures drop only the one contact's research.
    pub async fn enrich_all(&self, prospects: &[Prospect]) -> EnrichmentMap {
        let mut research = EnrichmentMap::new();

        for prospect in prospects {
            let Some(company) = prospect.company.as_deref() else {
                debug!(
                    contact = prospect.display_name(),
                    "No company name, skipping enrichment"
                );
                continue;
            };

            match self.research(company).await {
                Ok(info) => {
                    info!(
                        contact = prospect.display_name(),
                        company, "Scraped company info"
                    );
                    research.insert(prospect.contact_id.clone(), info);
                }
                Err(e) => {
                    warn!(
                        contact = prospect.display_name(),
                        company,
                        error = %e,
                        "Company enrichment failed, drafting without research"
                    );
                }
            }
        }

        research
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn research_decodes_scraper_payload() {
        let json = r#"{"links": ["https://acme.example"], "result": "Acme builds anvils."}"#;
        let research: CompanyResearch = serde_json::from_str(json).unwrap();
        assert_eq!(research.links, vec!["https://acme.example"]);
        assert_eq!(research.summary.as_deref(), Some("Acme builds anvils."));
    }

    #[test]
    fn research_tolerates_empty_payload() {
        let research: CompanyResearch = serde_json::from_str("{}").unwrap();
        assert!(research.links.is_empty());
        assert!(research.summary.is_none());
    }
}
