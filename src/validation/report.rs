//! Plain-text rendering of validation results for the log and the CLI.

use super::ValidationResult;

/// One line per issue, errors first, under a summary line.
pub fn format_report(result: &ValidationResult) -> String {
    let errors = result.error_count();
    let warnings = result.warnings().count();

    if errors == 0 && warnings == 0 {
        return "Notifier configuration is valid.".to_string();
    }

    let verdict = if errors == 0 { "accepted" } else { "rejected" };
    let mut report = format!(
        "Notifier configuration {}: {} error(s), {} warning(s)\n",
        verdict, errors, warnings
    );

    for issue in result.errors().chain(result.warnings()) {
        report.push_str(&format!("  {:<7} {}\n", issue.severity.label(), issue));
    }

    report
}
