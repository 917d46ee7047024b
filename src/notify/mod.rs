//! Notification system: the notifier seam, the Lark webhook notifier,
//! the kind registry and the retrying dispatcher.

pub mod dispatch;
pub mod lark;
pub mod registry;

use async_trait::async_trait;

use crate::error::NotificationError;

pub use dispatch::{DispatchReport, Dispatcher, ManagedNotifier};
pub use lark::LarkNotifier;
pub use registry::NotifierRegistry;

/// A destination that can deliver a titled text message.
///
/// Implementations hold only immutable configuration, so one instance can
/// serve concurrent callers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Kind this notifier was registered under (e.g. `lark`).
    fn kind(&self) -> &str;

    /// Configured display name.
    fn name(&self) -> &str;

    /// Makes a single delivery attempt.
    async fn send(&self, title: &str, message: &str) -> Result<(), NotificationError>;
}
