//! Semantic validation: checks that only make sense against the running host.

use super::{ValidationIssue, ValidationResult};
use crate::config::model::AppConfig;

/// Edit distance above which a kind is not considered a typo of a known one.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Validates that every configured kind has a registered notifier.
pub fn validate(config: &AppConfig, known_kinds: &[&str]) -> ValidationResult {
    let mut result = ValidationResult::new();

    for kind in config.notify.keys() {
        if known_kinds.contains(&kind.as_str()) {
            continue;
        }

        let mut issue = ValidationIssue::error(
            format!("notify.{}", kind),
            format!("Unknown notifier kind '{}'", kind),
        );
        if let Some(similar) = find_similar_kind(kind, known_kinds) {
            issue = issue.with_suggestion(format!("Did you mean '{}'?", similar));
        }
        result.push(issue);
    }

    result
}

/// Finds the most similar known kind using Levenshtein distance.
pub fn find_similar_kind<'a>(input: &str, known: &[&'a str]) -> Option<&'a str> {
    let input_lower = input.to_lowercase();

    known
        .iter()
        .map(|k| (k, strsim::levenshtein(&input_lower, k)))
        .filter(|(_, distance)| *distance <= MAX_SUGGESTION_DISTANCE)
        .min_by_key(|(_, distance)| *distance)
        .map(|(k, _)| *k)
}
