pub mod browser;
pub mod controller;
pub mod error;
pub mod filter;
pub mod locks;
pub mod persist;
pub mod pipeline;
pub mod retry;
pub mod store;
pub mod validate;

pub use browser::{BrowserLauncher, BrowserSession, ChromiumLauncher, PageQuery};
pub use controller::{Controller, ControllerSettings, Preview, RunState, ScrapeReport};
pub use error::{ScrapeError, ScraperError, StoreError};
pub use filter::filter_services;
pub use locks::{RunGuard, RunLocks};
pub use persist::{persist, PersistOutcome, ProfileSink};
pub use pipeline::PipelineSettings;
pub use retry::{with_retry, RetryPolicy};
pub use store::{BusinessStore, PgStore};
pub use validate::{has_services, is_valid_email, is_valid_phone, validate, ValidationReport};
