//! Checks a loaded notifier configuration before any notifier is built.

pub mod report;
pub mod schema;
pub mod semantic;

use std::fmt;

use crate::config::model::AppConfig;

/// Whether an issue rejects the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    Error,
    Warning,
}

impl ValidationSeverity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// One problem in the configuration, addressed by its YAML path
/// (e.g. `notify.lark[0].webhook`).
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: ValidationSeverity,
    pub path: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationSeverity::Error, path.into(), message.into())
    }

    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationSeverity::Warning, path.into(), message.into())
    }

    fn new(severity: ValidationSeverity, path: String, message: String) -> Self {
        Self {
            severity,
            path,
            message,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == ValidationSeverity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// YAML path of a field inside one notifier entry.
pub fn entry_path(kind: &str, index: usize, field: &str) -> String {
    format!("notify.{}[{}].{}", kind, index, field)
}

/// Issues collected by every validation layer, in discovery order.
#[derive(Debug, Default)]
pub struct ValidationResult {
    issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.issues.extend(other.issues);
    }

    /// Warnings alone never reject a configuration.
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(ValidationIssue::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }
}

/// Validates the configuration against the notifier kinds the host has registered.
pub fn validate_config(config: &AppConfig, known_kinds: &[&str]) -> ValidationResult {
    let mut result = schema::validate(config);
    result.merge(semantic::validate(config, known_kinds));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_counts() {
        let mut result = ValidationResult::new();
        assert!(result.is_valid());

        result.push(ValidationIssue::warning("notify", "nothing configured"));
        assert!(result.is_valid());

        result.push(ValidationIssue::error(entry_path("lark", 0, "webhook"), "missing"));
        assert!(!result.is_valid());
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.warnings().count(), 1);
    }

    #[test]
    fn test_issue_display() {
        let issue = ValidationIssue::error("notify.larc", "Unknown notifier kind 'larc'")
            .with_suggestion("Did you mean 'lark'?");
        assert_eq!(
            issue.to_string(),
            "notify.larc: Unknown notifier kind 'larc' (Did you mean 'lark'?)"
        );
    }

    #[test]
    fn test_validate_config_combines_layers() {
        let yaml = r#"
notify:
  lrak:
    - name: ops
      webhook: https://example.com/hook
  lark:
    - name: ops
      webhook: ftp://example.com/hook
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        let result = validate_config(&config, &["lark"]);

        let paths: Vec<_> = result.errors().map(|i| i.path.as_str()).collect();
        assert!(paths.contains(&"notify.lrak"));
        assert!(paths.contains(&"notify.lark[0].webhook"));
    }
}
