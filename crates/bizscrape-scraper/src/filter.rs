//! Cleanup applied to raw service-list text before it becomes part of a
//! scrape result.

use std::collections::HashSet;

use bizscrape_core::ExtractedService;

/// Entries this short are almost always stray labels or icons.
const MIN_SERVICE_CHARS: usize = 4;

/// Words that mark a matched node as staff, navigation or boilerplate rather
/// than an offered service. Matched as whole words, case-insensitively.
const DENYLIST: &[&str] = &[
    "dr",
    "doctor",
    "dentist",
    "team",
    "staff",
    "testimonials",
    "reviews",
    "contact",
    "blog",
    "careers",
    "faq",
    "login",
];

/// Turns the text of every node matched by a service selector into a
/// service list.
///
/// Whitespace is collapsed, then an entry is dropped if it is 3 characters
/// or fewer, contains a denylisted word, or repeats an earlier entry
/// (compared case-insensitively). Order of first occurrence is kept.
#[must_use]
pub fn filter_services<I, S>(raw: I) -> Vec<ExtractedService>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();

    raw.into_iter()
        .map(|s| collapse_whitespace(s.as_ref()))
        .filter(|s| s.chars().count() >= MIN_SERVICE_CHARS)
        .filter(|s| !contains_denied_word(s))
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(|name| ExtractedService { name })
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn contains_denied_word(s: &str) -> bool {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .any(|word| {
            let word = word.to_lowercase();
            DENYLIST.contains(&word.as_str())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(services: &[ExtractedService]) -> Vec<&str> {
        services.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn drops_short_and_denylisted_entries() {
        let services = filter_services(["Cleaning", "Dr. Smith", "Ab", "Whitening"]);
        assert_eq!(names(&services), vec!["Cleaning", "Whitening"]);
    }

    #[test]
    fn drops_empty_and_whitespace_only_entries() {
        let services = filter_services(["", "   ", "\n\t", "Root Canal"]);
        assert_eq!(names(&services), vec!["Root Canal"]);
    }

    #[test]
    fn three_characters_is_too_short_four_is_enough() {
        let services = filter_services(["Spa", "Yoga"]);
        assert_eq!(names(&services), vec!["Yoga"]);
    }

    #[test]
    fn denylist_is_case_insensitive_and_whole_word() {
        let services = filter_services([
            "Meet the TEAM",
            "Patient Reviews",
            "Teeth Whitening",
            "Draining Therapy",
            "Drywall Repair",
        ]);
        // "Draining" and "Drywall" contain "dr" but not as a word.
        assert_eq!(
            names(&services),
            vec!["Teeth Whitening", "Draining Therapy", "Drywall Repair"]
        );
    }

    #[test]
    fn trims_collapses_and_dedupes_preserving_first() {
        let services = filter_services([
            "  Dental   Implants \n",
            "Whitening",
            "dental implants",
            "Whitening",
        ]);
        assert_eq!(names(&services), vec!["Dental Implants", "Whitening"]);
    }

    #[test]
    fn no_matches_yields_empty_list() {
        let services = filter_services(Vec::<String>::new());
        assert!(services.is_empty());
    }
}
