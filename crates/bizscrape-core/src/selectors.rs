//! Per-business selector configuration.
//!
//! Selectors are opaque page-query strings (CSS selectors for the Chromium
//! engine) keyed by business id. They are read from a YAML file at startup
//! and never written back.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSelector {
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqSelector {
    pub question: Option<String>,
    pub answer: Option<String>,
}

impl FaqSelector {
    /// Both selectors, or `None` unless question and answer are configured.
    #[must_use]
    pub fn pair(&self) -> Option<(&str, &str)> {
        let question = non_blank(self.question.as_deref())?;
        let answer = non_blank(self.answer.as_deref())?;
        Some((question, answer))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(alias = "businessId")]
    pub business_id: String,
    /// Required. Left defaulted during deserialization so a missing value is
    /// reported by load-time validation with the business id attached.
    #[serde(default, alias = "serviceSelector")]
    pub service_selector: String,
    #[serde(default, alias = "aboutSelector")]
    pub about_selector: Option<String>,
    #[serde(default, alias = "contactSelector")]
    pub contact_selector: ContactSelector,
    #[serde(default, alias = "faqsSelector")]
    pub faqs_selector: FaqSelector,
}

impl SelectorConfig {
    #[must_use]
    pub fn about(&self) -> Option<&str> {
        non_blank(self.about_selector.as_deref())
    }

    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        non_blank(self.contact_selector.phone.as_deref())
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        non_blank(self.contact_selector.email.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectorsFile {
    #[serde(default)]
    pub selectors: Vec<SelectorConfig>,
}

impl SelectorsFile {
    /// Selector config for `business_id`, if one is configured. Ids are
    /// compared after trimming surrounding whitespace.
    #[must_use]
    pub fn find(&self, business_id: &str) -> Option<&SelectorConfig> {
        let business_id = business_id.trim();
        self.selectors.iter().find(|s| s.business_id == business_id)
    }

    pub fn business_ids(&self) -> impl Iterator<Item = &str> {
        self.selectors.iter().map(|s| s.business_id.as_str())
    }
}

/// Load and validate the selector configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_selectors(path: &Path) -> Result<SelectorsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SelectorsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_selectors(&content)
}

/// Parse and validate selector YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the content cannot be parsed or fails validation.
pub fn parse_selectors(content: &str) -> Result<SelectorsFile, ConfigError> {
    let mut file: SelectorsFile =
        serde_yaml::from_str(content).map_err(ConfigError::SelectorsFileParse)?;

    for config in &mut file.selectors {
        config.business_id = config.business_id.trim().to_string();
    }

    validate_selectors(&file)?;

    Ok(file)
}

fn validate_selectors(file: &SelectorsFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for config in &file.selectors {
        let id = config.business_id.as_str();
        if id.is_empty() {
            return Err(ConfigError::Validation(
                "business_id must be non-empty".to_string(),
            ));
        }

        if config.service_selector.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "business '{id}' has no service_selector; it is required"
            )));
        }

        if !seen.insert(id.to_string()) {
            return Err(ConfigError::Validation(format!(
                "duplicate selector config for business '{id}'"
            )));
        }
    }

    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "selectors_test.rs"]
mod tests;
