//! Orchestrates one scrape run: lock, load, extract, validate, persist.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bizscrape_core::{AppConfig, BusinessRecord, ScrapeResult, SelectorConfig};
use serde::Serialize;
use tokio::time::Instant;

use crate::browser::BrowserLauncher;
use crate::error::{ScrapeError, ScraperError};
use crate::locks::{RunGuard, RunLocks};
use crate::persist::{persist, PersistOutcome, ProfileSink};
use crate::pipeline::{self, PipelineSettings};
use crate::store::BusinessStore;
use crate::validate::{validate, ValidationReport};

const DEFAULT_BUDGET_MS: u64 = 120_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    pub pipeline: PipelineSettings,
    /// Limit on browser launch plus extraction for one run.
    ///
    /// The home page always gets at least [`Self::home_allowance`], so a
    /// budget shorter than the home retry policy is extended rather than
    /// cutting retries short. Whatever is left after the home page bounds the
    /// FAQ page; running out there yields no FAQs instead of failing the run.
    pub budget: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            pipeline: PipelineSettings::default(),
            budget: Duration::from_millis(DEFAULT_BUDGET_MS),
        }
    }
}

impl ControllerSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            pipeline: PipelineSettings::from_app_config(config),
            budget: Duration::from_millis(config.scrape_budget_ms),
        }
    }

    /// Time the home page may take regardless of the budget: every
    /// navigation attempt timing out, plus the settle delay.
    #[must_use]
    pub fn home_allowance(&self) -> Duration {
        self.pipeline
            .retry
            .worst_case()
            .saturating_add(self.pipeline.settle_delay)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Progress of one run. `Failed` is entered from the stage that was being
/// attempted: config loading, browser launch, or home extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    ConfigLoaded,
    BrowserAcquired,
    HomeExtracted,
    FaqAttempted,
    Persisted,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::ConfigLoaded => "config_loaded",
            Self::BrowserAcquired => "browser_acquired",
            Self::HomeExtracted => "home_extracted",
            Self::FaqAttempted => "faq_attempted",
            Self::Persisted => "persisted",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl RunState {
    /// The stage a run in this state is working towards.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Idle => Self::ConfigLoaded,
            Self::ConfigLoaded => Self::BrowserAcquired,
            Self::BrowserAcquired => Self::HomeExtracted,
            Self::HomeExtracted => Self::FaqAttempted,
            Self::FaqAttempted => Self::Persisted,
            Self::Persisted | Self::Done => Self::Done,
            Self::Failed => Self::Failed,
        }
    }
}

/// Logs each state change for one run.
struct RunTracker<'a> {
    business_id: &'a str,
    state: RunState,
}

impl<'a> RunTracker<'a> {
    fn new(business_id: &'a str) -> Self {
        Self {
            business_id,
            state: RunState::Idle,
        }
    }

    fn advance(&mut self, next: RunState) {
        tracing::info!(
            business_id = self.business_id,
            from = %self.state,
            to = %next,
            "scrape state transition"
        );
        self.state = next;
    }

    /// Records a fatal error against the stage in progress and returns it.
    fn fail(&mut self, error: &dyn std::error::Error) -> RunState {
        let from = self.state.next();
        tracing::error!(
            business_id = self.business_id,
            from = %from,
            to = %RunState::Failed,
            error = %error,
            "scrape run failed"
        );
        self.state = RunState::Failed;
        from
    }
}

/// Summary of a completed run.
#[derive(Debug)]
pub struct ScrapeReport {
    pub business_id: String,
    pub services: usize,
    pub faqs: usize,
    pub contact_found: bool,
    pub about_found: bool,
    pub validation: ValidationReport,
    pub outcome: PersistOutcome,
}

/// A run's extracted content without persistence.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub business: BusinessRecord,
    pub result: ScrapeResult,
    pub validation: ValidationReport,
}

pub struct Controller {
    launcher: Arc<dyn BrowserLauncher>,
    store: Arc<dyn BusinessStore>,
    sink: Arc<dyn ProfileSink>,
    settings: ControllerSettings,
    locks: RunLocks,
}

impl Controller {
    #[must_use]
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        store: Arc<dyn BusinessStore>,
        sink: Arc<dyn ProfileSink>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            launcher,
            store,
            sink,
            settings,
            locks: RunLocks::new(),
        }
    }

    #[must_use]
    pub fn locks(&self) -> &RunLocks {
        &self.locks
    }

    /// Scrapes `business_id` and persists the result.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::AlreadyRunning`] if a run for the id is in flight.
    /// - [`ScrapeError::ConfigMissing`] if the business or its selectors are
    ///   unknown. No browser is launched.
    /// - [`ScrapeError::Failed`] if the browser or home page fails, or the
    ///   budget runs out. Nothing is persisted.
    /// - [`ScrapeError::Persistence`] if any of the four writes fails.
    pub async fn run(&self, business_id: &str) -> Result<ScrapeReport, ScrapeError> {
        let _guard = self.claim(business_id)?;
        let mut tracker = RunTracker::new(business_id);

        let (business, selectors) = self.load(business_id, &mut tracker).await?;

        let result = match self.scrape(&business, &selectors, &mut tracker).await {
            Ok(result) => result,
            Err(source) => {
                tracker.fail(&source);
                return Err(ScrapeError::Failed {
                    business_id: business_id.to_string(),
                    source,
                });
            }
        };

        let validation = validate(&result);
        log_validation(business_id, &validation);

        let outcome = persist(self.sink.as_ref(), business_id, &result).await;
        if !outcome.is_complete() {
            let err = ScrapeError::Persistence(outcome);
            tracker.fail(&err);
            return Err(err);
        }
        tracker.advance(RunState::Persisted);
        tracker.advance(RunState::Done);

        Ok(ScrapeReport {
            business_id: business_id.to_string(),
            services: result.services.len(),
            faqs: result.faqs.len(),
            contact_found: result.contact.has_any(),
            about_found: result.about.is_some(),
            validation,
            outcome,
        })
    }

    /// Runs extraction for `business_id` without writing anything.
    ///
    /// # Errors
    ///
    /// Same as [`Controller::run`] minus [`ScrapeError::Persistence`].
    pub async fn preview(&self, business_id: &str) -> Result<Preview, ScrapeError> {
        let _guard = self.claim(business_id)?;
        let mut tracker = RunTracker::new(business_id);

        let (business, selectors) = self.load(business_id, &mut tracker).await?;

        let result = self
            .scrape(&business, &selectors, &mut tracker)
            .await
            .map_err(|source| {
                tracker.fail(&source);
                ScrapeError::Failed {
                    business_id: business_id.to_string(),
                    source,
                }
            })?;
        tracker.advance(RunState::Done);

        let validation = validate(&result);
        Ok(Preview {
            business,
            result,
            validation,
        })
    }

    fn claim(&self, business_id: &str) -> Result<RunGuard, ScrapeError> {
        self.locks.try_acquire(business_id).ok_or_else(|| {
            tracing::warn!(business_id, "scrape already running; rejecting");
            ScrapeError::AlreadyRunning {
                business_id: business_id.to_string(),
            }
        })
    }

    async fn load(
        &self,
        business_id: &str,
        tracker: &mut RunTracker<'_>,
    ) -> Result<(BusinessRecord, SelectorConfig), ScrapeError> {
        match self.load_config(business_id).await {
            Ok(loaded) => {
                tracker.advance(RunState::ConfigLoaded);
                Ok(loaded)
            }
            Err(err) => {
                tracker.fail(&err);
                Err(err)
            }
        }
    }

    async fn load_config(
        &self,
        business_id: &str,
    ) -> Result<(BusinessRecord, SelectorConfig), ScrapeError> {
        let store_error = |source| ScrapeError::Store {
            business_id: business_id.to_string(),
            source,
        };
        let missing = |what| {
            tracing::warn!(business_id, what, "cannot scrape: configuration missing");
            ScrapeError::ConfigMissing {
                business_id: business_id.to_string(),
                what,
            }
        };

        let business = self
            .store
            .business(business_id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| missing("business record"))?;
        let selectors = self
            .store
            .selectors(business_id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| missing("selector config"))?;

        Ok((business, selectors))
    }

    /// Browser launch and extraction under the run budget. The session is
    /// released on every path; when a phase runs out of time it is dropped
    /// mid-flight and its drop guard tears the browser down.
    async fn scrape(
        &self,
        business: &BusinessRecord,
        selectors: &SelectorConfig,
        tracker: &mut RunTracker<'_>,
    ) -> Result<ScrapeResult, ScraperError> {
        let settings = &self.settings.pipeline;
        let budget = self.settings.budget;
        let started = Instant::now();

        let session = tokio::time::timeout(budget, self.launcher.acquire())
            .await
            .unwrap_or_else(|_elapsed| {
                Err(ScraperError::DeadlineExceeded {
                    budget_ms: millis(budget),
                })
            })?;
        tracker.advance(RunState::BrowserAcquired);

        let launched_in = started.elapsed();
        let run_limit = budget.max(launched_in.saturating_add(self.settings.home_allowance()));
        let home = tokio::time::timeout(
            run_limit.saturating_sub(launched_in),
            pipeline::extract_home(session.as_ref(), business, selectors, settings),
        )
        .await;
        let home = match home {
            Ok(Ok(home)) => home,
            Ok(Err(e)) => {
                session.release().await;
                return Err(e);
            }
            Err(_elapsed) => {
                drop(session);
                return Err(ScraperError::DeadlineExceeded {
                    budget_ms: millis(run_limit),
                });
            }
        };
        tracker.advance(RunState::HomeExtracted);

        let remaining = run_limit.saturating_sub(started.elapsed());
        let faqs = if remaining.is_zero() {
            tracing::warn!(
                business_id = %business.business_id,
                "run budget spent on the home page; continuing without FAQs"
            );
            Vec::new()
        } else {
            let faqs = pipeline::extract_faqs(session.as_ref(), business, selectors, settings);
            tokio::time::timeout(remaining, faqs)
                .await
                .unwrap_or_else(|_elapsed| {
                    tracing::warn!(
                        business_id = %business.business_id,
                        remaining_ms = millis(remaining),
                        "FAQ page ran out of budget; continuing without FAQs"
                    );
                    Vec::new()
                })
        };
        tracker.advance(RunState::FaqAttempted);

        session.release().await;
        Ok(home.into_result(faqs))
    }
}

fn log_validation(business_id: &str, report: &ValidationReport) {
    if report.is_clean() {
        tracing::debug!(business_id, ?report, "scraped data passed validation");
    } else {
        tracing::warn!(
            business_id,
            failed = ?report.failed_checks(),
            "scraped data failed advisory validation"
        );
    }
}
