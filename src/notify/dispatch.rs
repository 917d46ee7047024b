//! Fan-out delivery with the host's retry and dry-run settings.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::Notifier;
use crate::config::model::RetryPolicy;
use crate::error::NotificationError;

/// A notifier plus the generic settings the host applies around it.
pub struct ManagedNotifier {
    notifier: Arc<dyn Notifier>,
    kind: String,
    name: String,
    dry: bool,
    retry: RetryPolicy,
}

impl ManagedNotifier {
    /// Wraps a notifier with its dry-run flag and retry policy.
    pub fn new(notifier: Arc<dyn Notifier>, dry: bool, retry: RetryPolicy) -> Self {
        let kind = notifier.kind().to_string();
        let name = notifier.name().to_string();
        Self {
            notifier,
            kind,
            name,
            dry,
            retry,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sends with retries. Stops at the first success, at a non-retryable
    /// error, or after `max_attempts` attempts.
    pub async fn deliver(&self, title: &str, message: &str) -> DeliveryOutcome {
        if self.dry {
            info!(
                kind = %self.kind,
                name = %self.name,
                title = %title,
                message = %message,
                "[dry notify] notification not sent"
            );
            return self.outcome(0, Ok(()));
        }

        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.notifier.send(title, message).await {
                Ok(()) => return self.outcome(attempt, Ok(())),
                Err(e) if attempt < max_attempts && e.is_retryable() => {
                    warn!(
                        kind = %self.kind,
                        name = %self.name,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Notification failed, retrying"
                    );
                    tokio::time::sleep(self.retry.interval).await;
                }
                Err(e) => {
                    error!(
                        kind = %self.kind,
                        name = %self.name,
                        attempt,
                        error = %e,
                        "Notification failed"
                    );
                    return self.outcome(attempt, Err(e));
                }
            }
        }
    }

    fn outcome(&self, attempts: u32, result: Result<(), NotificationError>) -> DeliveryOutcome {
        DeliveryOutcome {
            kind: self.kind.clone(),
            name: self.name.clone(),
            attempts,
            dry: self.dry,
            result,
        }
    }
}

impl std::fmt::Debug for ManagedNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedNotifier")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("dry", &self.dry)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Result of delivering to one notifier.
#[derive(Debug)]
pub struct DeliveryOutcome {
    pub kind: String,
    pub name: String,
    /// Attempts made; zero in dry mode.
    pub attempts: u32,
    pub dry: bool,
    pub result: Result<(), NotificationError>,
}

/// Per-notifier outcomes of one dispatch, in configuration order.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub outcomes: Vec<DeliveryOutcome>,
}

impl DispatchReport {
    /// True when every notifier succeeded.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Outcomes that ended in an error.
    pub fn failures(&self) -> impl Iterator<Item = &DeliveryOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// Number of successful deliveries.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }
}

/// Sends one message to a set of notifiers concurrently.
#[derive(Debug, Default, Clone)]
pub struct Dispatcher {
    notifiers: Vec<Arc<ManagedNotifier>>,
}

impl Dispatcher {
    pub fn new(notifiers: Vec<ManagedNotifier>) -> Self {
        Self {
            notifiers: notifiers.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// `(kind, name)` of every notifier, in configuration order.
    pub fn targets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.notifiers.iter().map(|n| (n.kind(), n.name()))
    }

    /// Keeps only the notifiers matching the given kind and/or name.
    pub fn filter(&self, kind: Option<&str>, name: Option<&str>) -> Self {
        let notifiers = self
            .notifiers
            .iter()
            .filter(|n| kind.map_or(true, |k| n.kind() == k))
            .filter(|n| name.map_or(true, |nm| n.name() == nm))
            .cloned()
            .collect();

        Self { notifiers }
    }

    /// Delivers `title`/`message` to every notifier. One failing notifier
    /// never prevents delivery to the others.
    pub async fn notify_all(&self, title: &str, message: &str) -> DispatchReport {
        let dispatch_id = Uuid::new_v4();
        let span = info_span!("dispatch", %dispatch_id);

        let title: Arc<str> = Arc::from(title);
        let message: Arc<str> = Arc::from(message);

        let mut join_set = JoinSet::new();
        for (index, notifier) in self.notifiers.iter().enumerate() {
            let notifier = Arc::clone(notifier);
            let title = Arc::clone(&title);
            let message = Arc::clone(&message);

            join_set.spawn(
                async move { (index, notifier.deliver(&title, &message).await) }
                    .instrument(span.clone()),
            );
        }

        let mut outcomes = Vec::with_capacity(self.notifiers.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!(%dispatch_id, error = %e, "Notification task did not complete"),
            }
        }
        outcomes.sort_by_key(|(index, _)| *index);

        let report = DispatchReport {
            outcomes: outcomes.into_iter().map(|(_, outcome)| outcome).collect(),
        };

        span.in_scope(|| {
            info!(
                notifiers = self.notifiers.len(),
                succeeded = report.succeeded(),
                failed = report.failures().count(),
                "Dispatch finished"
            )
        });

        report
    }
}
