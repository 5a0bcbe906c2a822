//! Hands a finished scrape to the profile stores.

use std::fmt;

use async_trait::async_trait;
use bizscrape_core::{ExtractedContact, ExtractedFaq, ExtractedService, ScrapeResult};

use crate::error::StoreError;

/// Write side of the business profile. Each method replaces what is stored
/// for `business_id` wholesale.
#[async_trait]
pub trait ProfileSink: Send + Sync {
    /// Make sure a business row exists; store `about` when one was found.
    async fn upsert_business(
        &self,
        business_id: &str,
        about: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn replace_services(
        &self,
        business_id: &str,
        services: &[ExtractedService],
    ) -> Result<usize, StoreError>;

    async fn replace_contact(
        &self,
        business_id: &str,
        contact: &ExtractedContact,
    ) -> Result<(), StoreError>;

    async fn replace_faqs(
        &self,
        business_id: &str,
        faqs: &[ExtractedFaq],
    ) -> Result<usize, StoreError>;
}

/// Per-entity results of one persistence pass.
#[derive(Debug)]
pub struct PersistOutcome {
    pub business_id: String,
    pub business: Result<(), StoreError>,
    pub services: Result<usize, StoreError>,
    pub contact: Result<(), StoreError>,
    pub faqs: Result<usize, StoreError>,
}

impl PersistOutcome {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_entities().is_empty()
    }

    #[must_use]
    pub fn failed_entities(&self) -> Vec<&'static str> {
        [
            ("business", self.business.is_err()),
            ("services", self.services.is_err()),
            ("contact", self.contact.is_err()),
            ("faqs", self.faqs.is_err()),
        ]
        .into_iter()
        .filter_map(|(name, failed)| failed.then_some(name))
        .collect()
    }
}

impl fmt::Display for PersistOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "persistence failed for business {}: {}",
            self.business_id,
            self.failed_entities().join(", ")
        )
    }
}

/// Runs the four upserts for `business_id` concurrently. Every upsert is
/// attempted regardless of the others.
pub async fn persist(
    sink: &dyn ProfileSink,
    business_id: &str,
    result: &ScrapeResult,
) -> PersistOutcome {
    let (business, services, contact, faqs) = tokio::join!(
        sink.upsert_business(business_id, result.about.as_deref()),
        sink.replace_services(business_id, &result.services),
        sink.replace_contact(business_id, &result.contact),
        sink.replace_faqs(business_id, &result.faqs),
    );

    let outcome = PersistOutcome {
        business_id: business_id.to_string(),
        business,
        services,
        contact,
        faqs,
    };

    log_failure("business", business_id, outcome.business.as_ref().err());
    log_failure("services", business_id, outcome.services.as_ref().err());
    log_failure("contact", business_id, outcome.contact.as_ref().err());
    log_failure("faqs", business_id, outcome.faqs.as_ref().err());

    outcome
}

fn log_failure(entity: &str, business_id: &str, err: Option<&StoreError>) {
    if let Some(e) = err {
        tracing::error!(business_id, entity, error = %e, "failed to persist scraped data");
    }
}
