//! End-to-end run: fetch → filter → enrich → draft → deliver.
//!
//! One logical thread of control; every stage awaits the previous one. A
//! fetch failure aborts the run; everything downstream recovers per contact.
//! Nothing is persisted — a run's state lives and dies with the run.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::deliver::Deliverer;
use crate::drafter::{Draft, Drafter};
use crate::enrich::{EnrichmentMap, ScraperClient};
use crate::error::Result;
use crate::filter;
use crate::policy::FollowUpPolicy;
use crate::table::ContactSource;

/// Summary of one completed run.
#[derive(Debug)]
pub struct RunReport {
    pub fetched: usize,
    pub due: usize,
    pub drafts: Vec<Draft>,
}

/// The wired pipeline. All collaborators are injected at construction.
pub struct Pipeline {
    source: Arc<dyn ContactSource>,
    policy: FollowUpPolicy,
    scraper: Option<ScraperClient>,
    drafter: Drafter,
    deliverer: Arc<dyn Deliverer>,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn ContactSource>,
        policy: FollowUpPolicy,
        scraper: Option<ScraperClient>,
        drafter: Drafter,
        deliverer: Arc<dyn Deliverer>,
    ) -> Self {
        Self {
            source,
            policy,
            scraper,
            drafter,
            deliverer,
        }
    }

    /// Execute one full run.
    pub async fn run(&self) -> Result<RunReport> {
        info!("Starting follow-up run");

        let contacts = self.source.fetch_all().await?;
        let fetched = contacts.len();

        let today = Utc::now().date_naive();
        let prospects = filter::select(&contacts, &self.policy, today);
        info!(due = prospects.len(), fetched, "Filtered contacts");

        let research = match &self.scraper {
            Some(scraper) => scraper.enrich_all(&prospects).await,
            None => EnrichmentMap::new(),
        };

        let drafts = self.drafter.draft_all(&prospects, &research).await;

        self.deliverer.deliver_all(&drafts).await?;

        info!(
            fetched,
            due = prospects.len(),
            drafted = drafts.len(),
            "Follow-up run complete"
        );

        Ok(RunReport {
            fetched,
            due: prospects.len(),
            drafts,
        })
    }
}
