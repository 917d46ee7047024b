//! Configuration data structures.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration structure containing all settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Settings shared by every notifier unless overridden.
    #[serde(default)]
    pub settings: NotifySettings,

    /// Notifier entries grouped by kind (e.g. `lark`).
    #[serde(default)]
    pub notify: BTreeMap<String, Vec<NotifyEntry>>,
}

/// Global notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifySettings {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry settings for failed sends.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            retry: RetryConfig::default(),
        }
    }
}

/// Retry configuration for failed sends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts (1 = no retry, 2 = one retry).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Seconds to wait between attempts.
    #[serde(default = "default_retry_interval")]
    pub interval_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_seconds: default_retry_interval(),
        }
    }
}

/// A single configured notifier.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifyEntry {
    /// Display name, used in logs and errors.
    #[serde(default)]
    pub name: String,

    /// Incoming webhook URL of the chat robot.
    #[serde(default)]
    pub webhook: String,

    /// Log instead of sending.
    #[serde(default)]
    pub dry: bool,

    /// Overrides `settings.timeout_seconds`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// Overrides fields of `settings.retry`; unset fields are inherited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryOverride>,
}

/// Per-entry retry settings. Each field falls back to `settings.retry`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RetryOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<u64>,
}

impl RetryOverride {
    /// Fills the unset fields from `base`.
    pub fn merge(&self, base: &RetryConfig) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            interval_seconds: self.interval_seconds.unwrap_or(base.interval_seconds),
        }
    }
}

/// A notifier entry with the global settings folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNotify {
    pub kind: String,
    pub name: String,
    pub webhook: String,
    pub dry: bool,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

/// How often and how far apart a failed send is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            interval: Duration::ZERO,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            interval: Duration::from_secs(config.interval_seconds),
        }
    }
}

impl NotifyEntry {
    /// Folds the global settings into this entry.
    pub fn resolve(&self, kind: &str, settings: &NotifySettings) -> ResolvedNotify {
        let name = if self.name.trim().is_empty() {
            kind.to_string()
        } else {
            self.name.clone()
        };

        let timeout_seconds = match self.timeout_seconds {
            Some(secs) if secs > 0 => secs,
            _ => settings.timeout_seconds,
        };

        let retry = match &self.retry {
            Some(over) => over.merge(&settings.retry),
            None => settings.retry.clone(),
        };

        ResolvedNotify {
            kind: kind.to_string(),
            name,
            webhook: self.webhook.clone(),
            dry: self.dry,
            timeout: Duration::from_secs(timeout_seconds),
            retry: RetryPolicy::from(&retry),
        }
    }
}

impl AppConfig {
    /// Resolves every configured entry, in kind order then file order.
    pub fn resolved(&self) -> Vec<ResolvedNotify> {
        self.notify
            .iter()
            .flat_map(|(kind, entries)| {
                entries
                    .iter()
                    .map(move |entry| entry.resolve(kind, &self.settings))
            })
            .collect()
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_interval() -> u64 {
    5
}
