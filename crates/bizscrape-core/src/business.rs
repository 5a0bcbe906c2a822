use serde::{Deserialize, Serialize};

/// The business a scrape run targets.
///
/// Owned by the business-management side of the system; the scraper only
/// reads it and, after a run, makes sure a stub row exists for the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub business_id: String,
    pub name: String,
    pub url: String,
}

impl BusinessRecord {
    /// The home URL with any trailing `/` removed, so sub-pages can be
    /// derived by plain concatenation.
    #[must_use]
    pub fn home_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// URL of the business's FAQ page, derived from the home URL.
    #[must_use]
    pub fn faq_url(&self) -> String {
        format!("{}/faq", self.home_url())
    }
}
