//! Output of a scrape run: the profile content pulled from a business website.

use serde::{Deserialize, Serialize};

/// Placeholder stored when a contact field could not be extracted.
pub const NOT_FOUND: &str = "Not found";

/// Placeholder answer for an FAQ question with no answer at the same index.
pub const NO_ANSWER_FOUND: &str = "No answer found";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedService {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContact {
    pub phone: String,
    pub email: String,
}

impl Default for ExtractedContact {
    fn default() -> Self {
        Self {
            phone: NOT_FOUND.to_string(),
            email: NOT_FOUND.to_string(),
        }
    }
}

impl ExtractedContact {
    /// Build a contact from optional matches, substituting [`NOT_FOUND`]
    /// for anything missing or blank.
    #[must_use]
    pub fn from_matches(phone: Option<String>, email: Option<String>) -> Self {
        Self {
            phone: or_sentinel(phone, NOT_FOUND),
            email: or_sentinel(email, NOT_FOUND),
        }
    }

    /// `true` when at least one field holds a real value.
    #[must_use]
    pub fn has_any(&self) -> bool {
        self.phone != NOT_FOUND || self.email != NOT_FOUND
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFaq {
    pub question: String,
    pub answer: String,
}

/// Everything one run extracted. Created per run, dropped after persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub services: Vec<ExtractedService>,
    pub contact: ExtractedContact,
    pub faqs: Vec<ExtractedFaq>,
    /// Text of the first `about_selector` match, when configured and found.
    pub about: Option<String>,
}

fn or_sentinel(value: Option<String>, sentinel: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| sentinel.to_string())
}
