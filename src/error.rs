//! Error types for the notifier and its hosting layer.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("{failed} of {total} notification(s) failed")]
    DeliveryFailed { failed: usize, total: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration loading, parsing and notifier construction errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {message}")]
    ParseFailed { path: PathBuf, message: String },

    #[error("Config validation failed with {error_count} error(s)")]
    ValidationFailed { error_count: usize },

    #[error("Unknown notifier kind '{kind}'{}", suggestion_suffix(.suggestion))]
    UnknownKind {
        kind: String,
        suggestion: Option<String>,
    },

    #[error("Invalid webhook URL '{url}' for [{kind} / {name}]: {message}")]
    InvalidWebhook {
        kind: String,
        name: String,
        url: String,
        message: String,
    },

    #[error("Failed to build HTTP client for [{kind} / {name}]: {source}")]
    ClientBuildFailed {
        kind: String,
        name: String,
        source: reqwest::Error,
    },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

/// Notification sending errors.
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("[{kind} / {name}] - Error from json marshal: {source}")]
    Encoding {
        kind: String,
        name: String,
        source: serde_json::Error,
    },

    #[error("[{kind} / {name}] - HTTP request failed: {source}")]
    Transport {
        kind: String,
        name: String,
        source: reqwest::Error,
    },

    #[error("[{kind} / {name}] - Deadline passed before the webhook answered")]
    DeadlineExceeded { kind: String, name: String },

    #[error("[{kind} / {name}] - {source}")]
    Protocol {
        kind: String,
        name: String,
        source: ProtocolError,
    },
}

impl NotificationError {
    /// Returns the kind of the notifier that produced this error.
    pub fn kind(&self) -> &str {
        match self {
            Self::Encoding { kind, .. }
            | Self::Transport { kind, .. }
            | Self::DeadlineExceeded { kind, .. }
            | Self::Protocol { kind, .. } => kind,
        }
    }

    /// Returns the name of the notifier that produced this error.
    pub fn name(&self) -> &str {
        match self {
            Self::Encoding { name, .. }
            | Self::Transport { name, .. }
            | Self::DeadlineExceeded { name, .. }
            | Self::Protocol { name, .. } => name,
        }
    }

    /// Returns the protocol error, if the remote service answered with a failure.
    pub fn protocol(&self) -> Option<&ProtocolError> {
        match self {
            Self::Protocol { source, .. } => Some(source),
            _ => None,
        }
    }

    /// HTTP status code, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Protocol { source, .. } => source.status(),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            Self::Encoding { .. } | Self::DeadlineExceeded { .. } => None,
        }
    }

    /// Error-schema code reported by the remote service.
    pub fn code(&self) -> Option<i64> {
        match self.protocol()? {
            ProtocolError::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Error-schema message reported by the remote service.
    pub fn msg(&self) -> Option<&str> {
        match self.protocol()? {
            ProtocolError::Rejected { msg, .. } => Some(msg),
            _ => None,
        }
    }

    /// True when the request did not complete within its time bound.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport { source, .. } => source.is_timeout(),
            Self::DeadlineExceeded { .. } => true,
            _ => false,
        }
    }

    /// Whether a host-level retry can change the outcome. A passed caller
    /// deadline stays passed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Encoding { .. } | Self::DeadlineExceeded { .. })
    }
}

/// The remote service answered, but not with the success schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Error response from Lark [{status}] - [{body}]")]
    Malformed { status: u16, body: String },

    #[error("Error response from Lark - code [{code}] - msg [{msg}]")]
    Rejected { code: i64, msg: String },

    #[error("Unrecognized response from Lark [{status}] - [{body}]")]
    Unrecognized { status: u16, body: String },
}

impl ProtocolError {
    /// HTTP status code, for the variants that keep it.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Malformed { status, .. } | Self::Unrecognized { status, .. } => Some(*status),
            Self::Rejected { .. } => None,
        }
    }
}
