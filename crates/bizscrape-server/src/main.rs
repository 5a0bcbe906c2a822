mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use bizscrape_scraper::{ChromiumLauncher, Controller, ControllerSettings, PgStore};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(bizscrape_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let selectors = Arc::new(bizscrape_core::load_selectors(&config.selectors_path)?);
    tracing::info!(
        path = %config.selectors_path.display(),
        businesses = selectors.selectors.len(),
        "selector config loaded"
    );

    let pool_config = bizscrape_db::PoolConfig::from_app_config(&config);
    let pool = bizscrape_db::connect_pool(&config.database_url, pool_config).await?;
    bizscrape_db::run_migrations(&pool).await?;

    let store = Arc::new(PgStore::new(pool.clone(), Arc::clone(&selectors)));
    let controller = Arc::new(Controller::new(
        Arc::new(ChromiumLauncher::from_app_config(&config)),
        store.clone(),
        store,
        ControllerSettings::from_app_config(&config),
    ));

    let business_ids = selectors.business_ids().map(ToOwned::to_owned).collect();
    let _scheduler = scheduler::build_scheduler(
        Arc::clone(&controller),
        business_ids,
        config.refresh_cron.as_deref(),
    )
    .await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        bizscrape_core::Environment::Development
    ))?;
    let app = build_app(AppState { pool, controller }, auth, default_rate_limit_state());

    tracing::info!(addr = %config.bind_addr, env = %config.env, "bizscrape server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
