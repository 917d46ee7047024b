//! Schema validation for notifier entries.

use std::collections::HashSet;

use reqwest::Url;

use super::{entry_path, ValidationIssue, ValidationResult};
use crate::config::model::AppConfig;

/// Validates required fields, webhook URLs and numeric settings.
pub fn validate(config: &AppConfig) -> ValidationResult {
    let mut result = ValidationResult::new();

    if config.settings.timeout_seconds == 0 {
        result.push(ValidationIssue::error(
            "settings.timeout_seconds",
            "Timeout must be greater than zero",
        ));
    }

    if config.settings.retry.max_attempts == 0 {
        result.push(
            ValidationIssue::error(
                "settings.retry.max_attempts",
                "At least one attempt is required",
            )
            .with_suggestion("Use 1 to disable retries"),
        );
    }

    let total: usize = config.notify.values().map(Vec::len).sum();
    if total == 0 {
        result.push(ValidationIssue::warning(
            "notify",
            "No notifiers configured, nothing will be sent",
        ));
    }

    for (kind, entries) in &config.notify {
        let mut seen = HashSet::new();

        for (i, entry) in entries.iter().enumerate() {
            if entry.name.trim().is_empty() {
                result.push(
                    ValidationIssue::warning(entry_path(kind, i, "name"), "Notifier has no name")
                        .with_suggestion(format!("The kind '{}' will be used as its name", kind)),
                );
            }

            let name = if entry.name.trim().is_empty() {
                kind.as_str()
            } else {
                entry.name.as_str()
            };
            if !seen.insert(name) {
                result.push(ValidationIssue::error(
                    entry_path(kind, i, "name"),
                    format!("Duplicate notifier name '{}' for kind '{}'", name, kind),
                ));
            }

            if let Some(issue) = check_webhook(entry_path(kind, i, "webhook"), &entry.webhook) {
                result.push(issue);
            }

            if entry.timeout_seconds == Some(0) {
                result.push(ValidationIssue::error(
                    entry_path(kind, i, "timeout_seconds"),
                    "Timeout must be greater than zero",
                ));
            }

            if entry.retry.as_ref().is_some_and(|r| r.max_attempts == Some(0)) {
                result.push(ValidationIssue::error(
                    entry_path(kind, i, "retry.max_attempts"),
                    "At least one attempt is required",
                ));
            }
        }
    }

    result
}

fn check_webhook(path: String, webhook: &str) -> Option<ValidationIssue> {
    if webhook.trim().is_empty() {
        return Some(ValidationIssue::error(path, "Webhook URL is required"));
    }

    match Url::parse(webhook) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => None,
        Ok(url) => Some(
            ValidationIssue::error(
                path,
                format!("Unsupported webhook scheme '{}'", url.scheme()),
            )
            .with_suggestion("Use an http:// or https:// URL"),
        ),
        Err(e) => Some(ValidationIssue::error(
            path,
            format!("Webhook is not a valid URL: {}", e),
        )),
    }
}
