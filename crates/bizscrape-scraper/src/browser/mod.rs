//! Browser capability seams.
//!
//! The pipeline only ever talks to [`PageQuery`]; the controller acquires a
//! [`BrowserSession`] per run from a [`BrowserLauncher`]. Chromium is the
//! production engine, tests substitute in-memory fakes.

mod chromium;

use async_trait::async_trait;

use crate::error::ScraperError;

pub use chromium::{find_chrome, ChromiumLauncher, ChromiumSession};

/// Navigate a page and read text out of it with opaque selector strings.
#[async_trait]
pub trait PageQuery: Send + Sync {
    /// Load `url` and wait for the navigation to settle.
    async fn navigate(&self, url: &str) -> Result<(), ScraperError>;

    /// Text content of every node matching `selector`, in document order.
    /// Zero matches is an empty list, not an error.
    async fn query_text(&self, selector: &str) -> Result<Vec<String>, ScraperError>;

    /// Text content of the first node matching `selector`.
    async fn query_first(&self, selector: &str) -> Result<Option<String>, ScraperError> {
        Ok(self.query_text(selector).await?.into_iter().next())
    }
}

/// One browser process with one page, owned by a single scrape run.
#[async_trait]
pub trait BrowserSession: PageQuery {
    /// Shut the browser down. Implementations must also tear down the
    /// process when dropped without being released.
    async fn release(self: Box<Self>);
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Launch a fresh browser and open a blank page in it.
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>, ScraperError>;
}
