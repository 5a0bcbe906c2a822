//! Scheduled refresh of every configured business.
//!
//! Disabled unless `BIZSCRAPE_REFRESH_CRON` is set. Businesses are scraped
//! one after another so a refresh never runs more than one browser.

use std::sync::Arc;

use bizscrape_scraper::Controller;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// cron expression is rejected, or the scheduler fails to start.
pub async fn build_scheduler(
    controller: Arc<Controller>,
    business_ids: Vec<String>,
    refresh_cron: Option<&str>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    match refresh_cron {
        Some(cron) => register_refresh_job(&scheduler, cron, controller, business_ids).await?,
        None => tracing::info!("scheduler: BIZSCRAPE_REFRESH_CRON not set; refresh disabled"),
    }

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_refresh_job(
    scheduler: &JobScheduler,
    cron: &str,
    controller: Arc<Controller>,
    business_ids: Vec<String>,
) -> Result<(), JobSchedulerError> {
    let business_ids = Arc::new(business_ids);

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let controller = Arc::clone(&controller);
        let business_ids = Arc::clone(&business_ids);

        Box::pin(async move {
            tracing::info!(count = business_ids.len(), "scheduler: starting refresh run");
            run_refresh(&controller, &business_ids).await;
            tracing::info!("scheduler: refresh run complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: refresh job registered");
    Ok(())
}

/// Scrapes each business in turn; one failure never stops the rest.
async fn run_refresh(controller: &Controller, business_ids: &[String]) -> (usize, usize) {
    let mut completed = 0;
    let mut failed = 0;

    for business_id in business_ids {
        match controller.run(business_id).await {
            Ok(report) => {
                completed += 1;
                tracing::info!(
                    business_id = %business_id,
                    services = report.services,
                    faqs = report.faqs,
                    "scheduler: business refreshed"
                );
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(
                    business_id = %business_id,
                    error = %e,
                    "scheduler: business refresh failed"
                );
            }
        }
    }

    tracing::info!(completed, failed, "scheduler: refresh summary");
    (completed, failed)
}
