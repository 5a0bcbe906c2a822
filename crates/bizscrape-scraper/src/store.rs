//! Read side of the controller and the Postgres-backed store.

use std::sync::Arc;

use async_trait::async_trait;
use bizscrape_core::{
    BusinessRecord, ExtractedContact, ExtractedFaq, ExtractedService, SelectorConfig,
    SelectorsFile,
};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::persist::ProfileSink;

#[async_trait]
pub trait BusinessStore: Send + Sync {
    /// The business to scrape, or `None` when it is unknown or has no URL.
    async fn business(&self, business_id: &str) -> Result<Option<BusinessRecord>, StoreError>;

    async fn selectors(&self, business_id: &str) -> Result<Option<SelectorConfig>, StoreError>;
}

/// Businesses and profile tables in Postgres, selectors from the YAML file
/// loaded at startup.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    selectors: Arc<SelectorsFile>,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool, selectors: Arc<SelectorsFile>) -> Self {
        Self { pool, selectors }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[must_use]
    pub fn selectors_file(&self) -> &SelectorsFile {
        &self.selectors
    }
}

#[async_trait]
impl BusinessStore for PgStore {
    async fn business(&self, business_id: &str) -> Result<Option<BusinessRecord>, StoreError> {
        let row = bizscrape_db::get_business(&self.pool, business_id).await?;
        Ok(row.and_then(bizscrape_db::BusinessRow::into_record))
    }

    async fn selectors(&self, business_id: &str) -> Result<Option<SelectorConfig>, StoreError> {
        Ok(self.selectors.find(business_id).cloned())
    }
}

#[async_trait]
impl ProfileSink for PgStore {
    async fn upsert_business(
        &self,
        business_id: &str,
        about: Option<&str>,
    ) -> Result<(), StoreError> {
        bizscrape_db::upsert_business_stub(&self.pool, business_id, about).await?;
        Ok(())
    }

    async fn replace_services(
        &self,
        business_id: &str,
        services: &[ExtractedService],
    ) -> Result<usize, StoreError> {
        Ok(bizscrape_db::replace_services(&self.pool, business_id, services).await?)
    }

    async fn replace_contact(
        &self,
        business_id: &str,
        contact: &ExtractedContact,
    ) -> Result<(), StoreError> {
        bizscrape_db::replace_contact(&self.pool, business_id, contact).await?;
        Ok(())
    }

    async fn replace_faqs(
        &self,
        business_id: &str,
        faqs: &[ExtractedFaq],
    ) -> Result<usize, StoreError> {
        Ok(bizscrape_db::replace_faqs(&self.pool, business_id, faqs).await?)
    }
}
