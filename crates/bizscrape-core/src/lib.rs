pub mod app_config;
pub mod business;
pub mod config;
pub mod profile;
pub mod selectors;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use business::BusinessRecord;
pub use config::{load_app_config, load_app_config_from_env};
pub use profile::{
    ExtractedContact, ExtractedFaq, ExtractedService, ScrapeResult, NOT_FOUND, NO_ANSWER_FOUND,
};
pub use selectors::{
    load_selectors, parse_selectors, ContactSelector, FaqSelector, SelectorConfig,
    SelectorsFile,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read selectors file {path}: {source}")]
    SelectorsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse selectors file: {0}")]
    SelectorsFileParse(#[source] serde_yaml::Error),

    #[error("selector config validation failed: {0}")]
    Validation(String),
}
