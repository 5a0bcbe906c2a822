use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub selectors_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Explicit browser executable; auto-detected from `PATH` when `None`.
    pub chrome_path: Option<PathBuf>,
    /// Extra launch flags appended after the built-in headless flags.
    pub browser_args: Vec<String>,
    pub nav_timeout_ms: u64,
    pub nav_max_attempts: u32,
    pub nav_retry_delay_ms: u64,
    pub settle_delay_ms: u64,
    pub scrape_budget_ms: u64,
    /// Cron expression for the scheduled profile refresh; disabled when `None`.
    pub refresh_cron: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("selectors_path", &self.selectors_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("chrome_path", &self.chrome_path)
            .field("browser_args", &self.browser_args)
            .field("nav_timeout_ms", &self.nav_timeout_ms)
            .field("nav_max_attempts", &self.nav_max_attempts)
            .field("nav_retry_delay_ms", &self.nav_retry_delay_ms)
            .field("settle_delay_ms", &self.settle_delay_ms)
            .field("scrape_budget_ms", &self.scrape_budget_ms)
            .field("refresh_cron", &self.refresh_cron)
            .finish()
    }
}
