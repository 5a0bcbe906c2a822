//! Headless Chromium over the DevTools protocol.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bizscrape_core::AppConfig;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::{BrowserLauncher, BrowserSession, PageQuery};
use crate::error::ScraperError;

const BASE_ARGS: &[&str] = &[
    "--headless=new",
    "--disable-gpu",
    "--disable-dev-shm-usage",
];

const PATH_CANDIDATES: &[&str] = &["google-chrome", "chromium", "chromium-browser"];

/// Resolve the Chromium executable: the configured path if it exists,
/// otherwise the first well-known binary name found on `PATH`.
#[must_use]
pub fn find_chrome(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "configured Chromium path does not exist");
    }

    PATH_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
}

#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    chrome_path: Option<PathBuf>,
    extra_args: Vec<String>,
    request_timeout: Duration,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn new(
        chrome_path: Option<PathBuf>,
        extra_args: Vec<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            chrome_path,
            extra_args,
            request_timeout,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(
            config.chrome_path.clone(),
            config.browser_args.clone(),
            Duration::from_millis(config.nav_timeout_ms),
        )
    }

    fn browser_config(&self, executable: PathBuf) -> Result<BrowserConfig, ScraperError> {
        let mut builder = BrowserConfig::builder()
            .chrome_executable(executable)
            .no_sandbox()
            .request_timeout(self.request_timeout);

        for arg in BASE_ARGS {
            builder = builder.arg(*arg);
        }
        for arg in &self.extra_args {
            builder = builder.arg(arg.as_str());
        }

        builder.build().map_err(ScraperError::BrowserLaunch)
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn acquire(&self) -> Result<Box<dyn BrowserSession>, ScraperError> {
        let executable =
            find_chrome(self.chrome_path.as_deref()).ok_or(ScraperError::BrowserNotFound)?;
        let config = self.browser_config(executable.clone())?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScraperError::BrowserLaunch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "CDP handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.kill().await;
                handler_task.abort();
                return Err(ScraperError::BrowserLaunch(format!(
                    "failed to open page: {e}"
                )));
            }
        };

        tracing::debug!(executable = %executable.display(), "browser launched");

        Ok(Box::new(ChromiumSession {
            browser: Some(browser),
            page,
            handler_task,
        }))
    }
}

/// A launched Chromium process and its single page.
///
/// Dropping a session that was not released aborts the CDP handler and kills
/// the process in the background, so a cancelled run never leaks a browser.
pub struct ChromiumSession {
    browser: Option<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl ChromiumSession {
    fn query_script(selector: &str) -> Result<String, ScraperError> {
        let literal = serde_json::to_string(selector).map_err(|e| ScraperError::Query {
            selector: selector.to_string(),
            reason: e.to_string(),
        })?;
        Ok(format!(
            "Array.from(document.querySelectorAll({literal}))\
             .map(el => (el.innerText || el.textContent || '').trim())"
        ))
    }
}

#[async_trait]
impl PageQuery for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<(), ScraperError> {
        let navigation_error = |e: chromiumoxide::error::CdpError| ScraperError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        };

        self.page.goto(url).await.map_err(navigation_error)?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(navigation_error)?;
        Ok(())
    }

    async fn query_text(&self, selector: &str) -> Result<Vec<String>, ScraperError> {
        let query_error = |reason: String| ScraperError::Query {
            selector: selector.to_string(),
            reason,
        };

        let script = Self::query_script(selector)?;
        let value = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| query_error(e.to_string()))?;

        value
            .into_value::<Vec<String>>()
            .map_err(|e| query_error(e.to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn release(mut self: Box<Self>) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::debug!(error = %e, "browser close failed; killing process");
                let _ = browser.kill().await;
            }
            if let Err(e) = browser.wait().await {
                tracing::debug!(error = %e, "waiting for browser exit failed");
            }
        }
        self.handler_task.abort();
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler_task.abort();

        let Some(mut browser) = self.browser.take() else {
            return;
        };
        tracing::warn!("browser session dropped without release; killing process");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let _ = browser.kill().await;
                    let _ = browser.wait().await;
                });
            }
            Err(_) => drop(browser),
        }
    }
}
