use thiserror::Error;

use crate::persist::PersistOutcome;

/// Failures inside a single scrape: browser lifecycle, navigation, and page
/// queries.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("no Chromium executable found; set BIZSCRAPE_CHROME_PATH")]
    BrowserNotFound,

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("query for selector \"{selector}\" failed: {reason}")]
    Query { selector: String, reason: String },

    #[error("scrape exceeded its {budget_ms}ms budget")]
    DeadlineExceeded { budget_ms: u64 },
}

/// Errors surfaced by the business/profile stores behind the controller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] bizscrape_db::DbError),

    #[error("{0}")]
    Other(String),
}

/// Outcome of a [`Controller`](crate::Controller) run that did not complete.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("business {business_id}: {what} not found")]
    ConfigMissing {
        business_id: String,
        what: &'static str,
    },

    #[error("a scrape for business {business_id} is already running")]
    AlreadyRunning { business_id: String },

    #[error("failed to load business {business_id}: {source}")]
    Store {
        business_id: String,
        #[source]
        source: StoreError,
    },

    #[error("scrape failed for business {business_id}: {source}")]
    Failed {
        business_id: String,
        #[source]
        source: ScraperError,
    },

    #[error("{0}")]
    Persistence(PersistOutcome),
}

impl ScrapeError {
    #[must_use]
    pub fn business_id(&self) -> &str {
        match self {
            Self::ConfigMissing { business_id, .. }
            | Self::AlreadyRunning { business_id }
            | Self::Store { business_id, .. }
            | Self::Failed { business_id, .. } => business_id,
            Self::Persistence(outcome) => &outcome.business_id,
        }
    }
}
