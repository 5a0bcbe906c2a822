//! Advisory checks over a finished scrape.
//!
//! Nothing here changes what gets persisted. The controller logs the report
//! after a run and the CLI `check` command prints it.

use std::sync::LazyLock;

use bizscrape_core::{ExtractedService, ScrapeResult};
use regex::Regex;
use serde::Serialize;

const MIN_PHONE_DIGITS: usize = 7;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9().\s-]+$").expect("valid phone regex"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)*\.[A-Za-z]{2,}$").expect("valid email regex")
});

/// `true` for strings made only of digits, spaces, dots, dashes and
/// parentheses (with an optional leading `+`) that hold at least 7 digits.
#[must_use]
pub fn is_valid_phone(s: &str) -> bool {
    let s = s.trim();
    PHONE_RE.is_match(s) && s.chars().filter(char::is_ascii_digit).count() >= MIN_PHONE_DIGITS
}

/// `true` for `local@domain.tld` shaped strings.
#[must_use]
pub fn is_valid_email(s: &str) -> bool {
    EMAIL_RE.is_match(s.trim())
}

#[must_use]
pub fn has_services(services: &[ExtractedService]) -> bool {
    !services.is_empty()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub phone_valid: bool,
    pub email_valid: bool,
    pub has_services: bool,
    pub service_count: usize,
    pub faq_count: usize,
}

impl ValidationReport {
    /// `true` when every check passed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.phone_valid && self.email_valid && self.has_services
    }

    /// Names of the checks that failed, for log output.
    #[must_use]
    pub fn failed_checks(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if !self.phone_valid {
            failed.push("phone");
        }
        if !self.email_valid {
            failed.push("email");
        }
        if !self.has_services {
            failed.push("services");
        }
        failed
    }
}

#[must_use]
pub fn validate(result: &ScrapeResult) -> ValidationReport {
    ValidationReport {
        phone_valid: is_valid_phone(&result.contact.phone),
        email_valid: is_valid_email(&result.contact.email),
        has_services: has_services(&result.services),
        service_count: result.services.len(),
        faq_count: result.faqs.len(),
    }
}
