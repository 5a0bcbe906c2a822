use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Kept separate from the process environment so it can be tested with a
/// plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let non_empty = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("BIZSCRAPE_ENV", "development"));

    let bind_addr = parse("BIZSCRAPE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("BIZSCRAPE_LOG_LEVEL", "info");
    let selectors_path = PathBuf::from(or_default(
        "BIZSCRAPE_SELECTORS_PATH",
        "./config/selectors.yaml",
    ));

    let db_max_connections = parse_u32("BIZSCRAPE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("BIZSCRAPE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("BIZSCRAPE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let chrome_path = non_empty("BIZSCRAPE_CHROME_PATH").map(PathBuf::from);
    let browser_args = parse_browser_args(&or_default("BIZSCRAPE_BROWSER_ARGS", ""));

    let nav_timeout_ms = parse_u64("BIZSCRAPE_NAV_TIMEOUT_MS", "60000")?;
    let nav_max_attempts = parse_u32("BIZSCRAPE_NAV_MAX_ATTEMPTS", "3")?;
    if nav_max_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "BIZSCRAPE_NAV_MAX_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let nav_retry_delay_ms = parse_u64("BIZSCRAPE_NAV_RETRY_DELAY_MS", "2000")?;
    let settle_delay_ms = parse_u64("BIZSCRAPE_SETTLE_DELAY_MS", "3000")?;
    let scrape_budget_ms = parse_u64("BIZSCRAPE_SCRAPE_BUDGET_MS", "120000")?;
    let refresh_cron = non_empty("BIZSCRAPE_REFRESH_CRON");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        selectors_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        chrome_path,
        browser_args,
        nav_timeout_ms,
        nav_max_attempts,
        nav_retry_delay_ms,
        settle_delay_ms,
        scrape_budget_ms,
        refresh_cron,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

/// Split a comma-separated flag list, dropping blanks.
fn parse_browser_args(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
