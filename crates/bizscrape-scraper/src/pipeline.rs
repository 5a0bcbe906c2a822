//! The extraction pipeline: home page, then FAQ page, on one browser page.
//!
//! A home-page navigation failure aborts the run. Everything after it
//! degrades instead: a failed FAQ page means no FAQs, a failed contact query
//! means the placeholder value.

use std::time::Duration;

use bizscrape_core::{
    AppConfig, BusinessRecord, ExtractedContact, ExtractedFaq, ExtractedService, ScrapeResult,
    SelectorConfig, NO_ANSWER_FOUND,
};

use crate::browser::PageQuery;
use crate::error::ScraperError;
use crate::filter::filter_services;
use crate::retry::{with_retry, RetryPolicy};

const DEFAULT_SETTLE_DELAY_MS: u64 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub retry: RetryPolicy,
    /// Pause after the home page loads, for client-side rendering to finish.
    pub settle_delay: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
        }
    }
}

impl PipelineSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            retry: RetryPolicy::from_app_config(config),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        }
    }
}

/// What the home page yields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HomeExtract {
    pub services: Vec<ExtractedService>,
    pub contact: ExtractedContact,
    pub about: Option<String>,
}

impl HomeExtract {
    #[must_use]
    pub fn into_result(self, faqs: Vec<ExtractedFaq>) -> ScrapeResult {
        ScrapeResult {
            services: self.services,
            contact: self.contact,
            faqs,
            about: self.about,
        }
    }
}

/// Runs the full pipeline against `page`.
///
/// # Errors
///
/// Returns [`ScraperError`] when the home page cannot be loaded after all
/// retry attempts or the service query itself fails.
pub async fn extract(
    page: &dyn PageQuery,
    business: &BusinessRecord,
    selectors: &SelectorConfig,
    settings: &PipelineSettings,
) -> Result<ScrapeResult, ScraperError> {
    let home = extract_home(page, business, selectors, settings).await?;
    let faqs = extract_faqs(page, business, selectors, settings).await;
    Ok(home.into_result(faqs))
}

/// Loads the home page and reads services, contact details and about text.
///
/// # Errors
///
/// Returns [`ScraperError`] when navigation fails after retries or the
/// service selector query errors.
pub async fn extract_home(
    page: &dyn PageQuery,
    business: &BusinessRecord,
    selectors: &SelectorConfig,
    settings: &PipelineSettings,
) -> Result<HomeExtract, ScraperError> {
    let home_url = business.home_url();
    navigate(page, home_url, &settings.retry).await?;
    tokio::time::sleep(settings.settle_delay).await;

    let raw_services = page.query_text(&selectors.service_selector).await?;
    let raw_count = raw_services.len();
    let services = filter_services(raw_services);
    tracing::debug!(
        business_id = %business.business_id,
        raw_count,
        kept = services.len(),
        "services extracted"
    );

    let phone = first_text(page, selectors.phone(), "phone").await;
    let email = first_text(page, selectors.email(), "email").await;
    let contact = ExtractedContact::from_matches(phone, email);

    let about = first_text(page, selectors.about(), "about")
        .await
        .filter(|text| !text.trim().is_empty());

    Ok(HomeExtract {
        services,
        contact,
        about,
    })
}

/// Loads `{home_url}/faq` and pairs questions with answers.
///
/// Never fails: navigation or query errors are logged and yield an empty
/// list. Without both FAQ selectors the page is not visited at all.
pub async fn extract_faqs(
    page: &dyn PageQuery,
    business: &BusinessRecord,
    selectors: &SelectorConfig,
    settings: &PipelineSettings,
) -> Vec<ExtractedFaq> {
    let Some((question_selector, answer_selector)) = selectors.faqs_selector.pair() else {
        tracing::debug!(business_id = %business.business_id, "no FAQ selectors configured");
        return Vec::new();
    };

    let faq_url = business.faq_url();
    if let Err(e) = navigate(page, &faq_url, &settings.retry).await {
        tracing::warn!(
            business_id = %business.business_id,
            url = %faq_url,
            error = %e,
            "FAQ page unavailable; continuing without FAQs"
        );
        return Vec::new();
    }

    let (questions, answers) = tokio::join!(
        page.query_text(question_selector),
        page.query_text(answer_selector),
    );

    match (questions, answers) {
        (Ok(questions), Ok(answers)) => pair_faqs(questions, &answers),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(
                business_id = %business.business_id,
                error = %e,
                "FAQ query failed; continuing without FAQs"
            );
            Vec::new()
        }
    }
}

/// Pairs questions with answers by position.
///
/// A question with no answer at its index gets [`NO_ANSWER_FOUND`]; surplus
/// answers are dropped; blank questions are skipped.
#[must_use]
pub fn pair_faqs(questions: Vec<String>, answers: &[String]) -> Vec<ExtractedFaq> {
    questions
        .into_iter()
        .enumerate()
        .filter_map(|(index, question)| {
            let question = question.trim();
            if question.is_empty() {
                return None;
            }
            let answer = answers
                .get(index)
                .map(|a| a.trim())
                .filter(|a| !a.is_empty())
                .unwrap_or(NO_ANSWER_FOUND);
            Some(ExtractedFaq {
                question: question.to_string(),
                answer: answer.to_string(),
            })
        })
        .collect()
}

async fn navigate(
    page: &dyn PageQuery,
    url: &str,
    policy: &RetryPolicy,
) -> Result<(), ScraperError> {
    with_retry(policy, url, move || page.navigate(url)).await
}

async fn first_text(
    page: &dyn PageQuery,
    selector: Option<&str>,
    field: &str,
) -> Option<String> {
    let selector = selector?;
    match page.query_first(selector).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(field, selector, error = %e, "optional field query failed");
            None
        }
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
