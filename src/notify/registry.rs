//! Notifier kinds and the factories that build them.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::dispatch::{Dispatcher, ManagedNotifier};
use super::Notifier;
use crate::config::model::{AppConfig, ResolvedNotify};
use crate::error::ConfigError;
use crate::validation::semantic::find_similar_kind;

/// Builds a notifier from a resolved configuration entry.
pub type NotifierFactory =
    Arc<dyn Fn(&ResolvedNotify) -> Result<Arc<dyn Notifier>, ConfigError> + Send + Sync>;

/// Maps notifier kinds to their factories.
///
/// Kinds are bound by explicit [`register`](Self::register) calls made by the
/// composition root; nothing registers itself.
#[derive(Default, Clone)]
pub struct NotifierRegistry {
    factories: HashMap<String, NotifierFactory>,
}

impl NotifierRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `factory` to `kind`, replacing any earlier binding.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ResolvedNotify) -> Result<Arc<dyn Notifier>, ConfigError> + Send + Sync + 'static,
    {
        let kind = kind.into();
        debug!(kind = %kind, "Registered notifier kind");
        self.factories.insert(kind, Arc::new(factory));
        self
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Returns true if `kind` has a factory.
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Builds the notifier for one resolved entry.
    pub fn build(&self, resolved: &ResolvedNotify) -> Result<Arc<dyn Notifier>, ConfigError> {
        let factory = self.factories.get(&resolved.kind).ok_or_else(|| {
            ConfigError::UnknownKind {
                kind: resolved.kind.clone(),
                suggestion: find_similar_kind(&resolved.kind, &self.kinds()).map(str::to_string),
            }
        })?;

        factory(resolved)
    }

    /// Builds a dispatcher holding every notifier in `config`.
    pub fn build_all(&self, config: &AppConfig) -> Result<Dispatcher, ConfigError> {
        let notifiers = config
            .resolved()
            .into_iter()
            .map(|resolved| {
                let notifier = self.build(&resolved)?;
                Ok(ManagedNotifier::new(notifier, resolved.dry, resolved.retry))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Dispatcher::new(notifiers))
    }
}

impl std::fmt::Debug for NotifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
