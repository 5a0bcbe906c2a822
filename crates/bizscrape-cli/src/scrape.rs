//! `scrape` and `check` command handlers.
//!
//! Both build the same controller the server uses. `check` stops before
//! persistence and prints the extracted content as JSON on stdout; logs go
//! to stderr so the output can be piped.

use std::sync::Arc;

use bizscrape_core::AppConfig;
use bizscrape_scraper::{ChromiumLauncher, Controller, ControllerSettings, PgStore};
use sqlx::PgPool;

fn build_controller(config: &AppConfig, pool: PgPool) -> anyhow::Result<Controller> {
    let selectors = bizscrape_core::load_selectors(&config.selectors_path)?;
    let store = Arc::new(PgStore::new(pool, Arc::new(selectors)));

    Ok(Controller::new(
        Arc::new(ChromiumLauncher::from_app_config(config)),
        store.clone(),
        store,
        ControllerSettings::from_app_config(config),
    ))
}

pub(crate) async fn run_scrape(
    config: &AppConfig,
    pool: PgPool,
    business_id: &str,
) -> anyhow::Result<()> {
    let controller = build_controller(config, pool)?;
    let report = match controller.run(business_id).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(business_id, error = %e, "scrape failed");
            return Err(e.into());
        }
    };
    tracing::info!(
        business_id = %report.business_id,
        services = report.services,
        faqs = report.faqs,
        "scrape completed"
    );

    println!("scrape completed for {}", report.business_id);
    println!("  services:      {}", report.services);
    println!("  faqs:          {}", report.faqs);
    println!("  contact found: {}", yes_no(report.contact_found));
    println!("  about found:   {}", yes_no(report.about_found));
    if !report.validation.is_clean() {
        println!(
            "  warnings:      {}",
            report.validation.failed_checks().join(", ")
        );
    }
    Ok(())
}

pub(crate) async fn run_check(
    config: &AppConfig,
    pool: PgPool,
    business_id: &str,
    compact: bool,
) -> anyhow::Result<()> {
    let controller = build_controller(config, pool)?;
    let preview = controller.preview(business_id).await?;
    if !preview.validation.is_clean() {
        tracing::warn!(
            business_id,
            failed = ?preview.validation.failed_checks(),
            "preview failed advisory validation"
        );
    }

    let json = if compact {
        serde_json::to_string(&preview)?
    } else {
        serde_json::to_string_pretty(&preview)?
    };
    println!("{json}");
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
