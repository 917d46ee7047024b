//! Lark (Feishu) custom-robot webhook notifications.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONNECTION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::{debug, error, info};

use super::Notifier;
use crate::config::model::ResolvedNotify;
use crate::error::{ConfigError, NotificationError, ProtocolError};

/// Kind name the Lark notifier is registered under.
pub const KIND: &str = "lark";

/// Sends text messages to a Lark robot webhook.
#[derive(Debug)]
pub struct LarkNotifier {
    /// Display name.
    name: String,
    /// Robot webhook URL.
    webhook_url: Url,
    /// Bound on one whole request/response cycle.
    timeout: Duration,
    /// HTTP client, never keeps idle connections.
    client: reqwest::Client,
}

impl LarkNotifier {
    /// Creates a notifier for the given webhook.
    pub fn new(
        name: impl Into<String>,
        webhook: &str,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let name = name.into();

        let webhook_url = Url::parse(webhook).map_err(|e| ConfigError::InvalidWebhook {
            kind: KIND.to_string(),
            name: name.clone(),
            url: webhook.to_string(),
            message: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| ConfigError::ClientBuildFailed {
                kind: KIND.to_string(),
                name: name.clone(),
                source: e,
            })?;

        Ok(Self {
            name,
            webhook_url,
            timeout,
            client,
        })
    }

    /// Registry factory: builds a notifier from a resolved config entry.
    pub fn from_resolved(resolved: &ResolvedNotify) -> Result<Arc<dyn Notifier>, ConfigError> {
        let notifier = Self::new(resolved.name.clone(), &resolved.webhook, resolved.timeout)?;
        Ok(Arc::new(notifier))
    }

    /// Like [`Notifier::send`], but also gives up once `deadline` passes.
    /// An expired deadline fails without touching the network.
    pub async fn send_before(
        &self,
        title: &str,
        message: &str,
        deadline: Instant,
    ) -> Result<(), NotificationError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(self.deadline_error());
        }

        let payload = LarkPayload::text(title, message);
        tokio::time::timeout_at(deadline, self.deliver(&payload, remaining.min(self.timeout)))
            .await
            .map_err(|_| self.deadline_error())?
    }

    async fn deliver(
        &self,
        payload: &LarkPayload,
        timeout: Duration,
    ) -> Result<(), NotificationError> {
        let data = serde_json::to_vec(payload).map_err(|e| {
            error!(
                kind = KIND,
                name = %self.name,
                payload = ?payload,
                error = %e,
                "Failed to encode Lark payload"
            );
            NotificationError::Encoding {
                kind: KIND.to_string(),
                name: self.name.clone(),
                source: e,
            }
        })?;

        let response = self
            .client
            .post(self.webhook_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(CONNECTION, "close")
            .timeout(timeout)
            .body(data)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        debug!(kind = KIND, name = %self.name, status = %status, "Lark webhook responded");

        self.interpret(status, &body)
    }

    /// Decides success or failure from a received response.
    fn interpret(&self, status: StatusCode, body: &[u8]) -> Result<(), NotificationError> {
        let outcome = match serde_json::from_slice::<Map<String, Value>>(body) {
            Ok(envelope) => match LarkResponse::classify(&envelope) {
                LarkResponse::Success => Ok(()),
                LarkResponse::Failure { code, msg } if code == 0 && msg.is_empty() => {
                    Err(ProtocolError::Unrecognized {
                        status: status.as_u16(),
                        body: String::from_utf8_lossy(body).into_owned(),
                    })
                }
                LarkResponse::Failure { code, msg } => Err(ProtocolError::Rejected { code, msg }),
            },
            Err(_) => Err(ProtocolError::Malformed {
                status: status.as_u16(),
                body: String::from_utf8_lossy(body).into_owned(),
            }),
        };

        match outcome {
            Ok(()) => {
                info!(kind = KIND, name = %self.name, "Lark notification sent");
                Ok(())
            }
            Err(source) => {
                error!(
                    kind = KIND,
                    name = %self.name,
                    status = %status,
                    error = %source,
                    "Lark webhook failed"
                );
                Err(NotificationError::Protocol {
                    kind: KIND.to_string(),
                    name: self.name.clone(),
                    source,
                })
            }
        }
    }

    fn transport_error(&self, source: reqwest::Error) -> NotificationError {
        error!(
            kind = KIND,
            name = %self.name,
            timeout = source.is_timeout(),
            error = %source,
            "Lark request failed"
        );
        NotificationError::Transport {
            kind: KIND.to_string(),
            name: self.name.clone(),
            source,
        }
    }

    fn deadline_error(&self) -> NotificationError {
        error!(kind = KIND, name = %self.name, "Deadline passed, Lark notification abandoned");
        NotificationError::DeadlineExceeded {
            kind: KIND.to_string(),
            name: self.name.clone(),
        }
    }
}

#[async_trait]
impl Notifier for LarkNotifier {
    fn kind(&self) -> &str {
        KIND
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, title: &str, message: &str) -> Result<(), NotificationError> {
        self.deliver(&LarkPayload::text(title, message), self.timeout)
            .await
    }
}

/// Lark webhook payload.
#[derive(Debug, Serialize)]
pub struct LarkPayload {
    msg_type: &'static str,
    content: LarkContent,
}

/// Text content of a Lark message.
#[derive(Debug, Serialize)]
struct LarkContent {
    text: String,
}

impl LarkPayload {
    /// Builds a text message: the title, a newline, then the message.
    pub fn text(title: &str, message: &str) -> Self {
        Self {
            msg_type: "text",
            content: LarkContent {
                text: format!("{}\n{}", title, message),
            },
        }
    }

    /// The rendered message text.
    pub fn content_text(&self) -> &str {
        &self.content.text
    }
}

/// Outcome carried by a Lark webhook response body.
///
/// The service answers `{"Extra":null,"StatusCode":0,"StatusMessage":"success"}`
/// on success and `{"code":9499,"msg":"Bad Request","data":{}}` otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LarkResponse {
    Success,
    Failure { code: i64, msg: String },
}

impl LarkResponse {
    /// Classifies a parsed response object. Never fails: missing or mistyped
    /// fields fall back to `code == 0` and an empty `msg`.
    pub fn classify(envelope: &Map<String, Value>) -> Self {
        let succeeded = envelope
            .get("StatusCode")
            .and_then(Value::as_f64)
            .is_some_and(|code| code == 0.0);

        if succeeded {
            return Self::Success;
        }

        let code = envelope
            .get("code")
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .unwrap_or(0);
        let msg = envelope
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self::Failure { code, msg }
    }
}
