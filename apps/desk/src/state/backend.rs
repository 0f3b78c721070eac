//! # Backend State
//!
//! Shares one backend handle between all open forms.
//!
//! The handle is an `Arc<dyn Backend>` so the shell can run against the
//! REST service in production and `MemoryBackend` in tests without the
//! commands knowing which.

use std::sync::Arc;

use tradedesk_client::{Backend, ClientConfig, ClientResult, HttpBackend};

/// Backend handle plus the lookup switches that come with it.
#[derive(Clone)]
pub struct BackendState {
    backend: Arc<dyn Backend>,
    history_enabled: bool,
}

impl BackendState {
    /// Wraps an existing backend. History lookups are on.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        BackendState {
            backend,
            history_enabled: true,
        }
    }

    /// Connects to the REST backend described by `config`.
    pub fn connect(config: &ClientConfig) -> ClientResult<Self> {
        let backend = HttpBackend::new(config)?;
        Ok(BackendState {
            backend: Arc::new(backend),
            history_enabled: config.lookup.history_enabled,
        })
    }

    pub fn with_history(mut self, enabled: bool) -> Self {
        self.history_enabled = enabled;
        self
    }

    /// Returns the backend.
    pub fn inner(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Whether assigning an item should fetch its last transaction.
    pub fn history_enabled(&self) -> bool {
        self.history_enabled
    }
}

impl std::fmt::Debug for BackendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendState")
            .field("history_enabled", &self.history_enabled)
            .finish_non_exhaustive()
    }
}
