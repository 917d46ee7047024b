//! Configuration loading and settings resolution.

pub mod loader;
pub mod model;

pub use model::{AppConfig, NotifyEntry, NotifySettings, ResolvedNotify, RetryConfig, RetryPolicy};
