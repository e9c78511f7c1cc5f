//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use clothes_catalog_core::{OpContext, Store};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn Store>,
    request_timeout: Duration,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `store` - Catalog store shared with the liveness monitor
    /// * `request_timeout` - Deadline given to every store call
    #[must_use]
    pub fn new(store: Arc<dyn Store>, request_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                request_timeout,
            }),
        }
    }

    /// Get a reference to the catalog store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// The per-request store deadline.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.inner.request_timeout
    }

    /// A fresh operation context bounded by the request deadline.
    #[must_use]
    pub fn op_context(&self) -> OpContext {
        OpContext::with_timeout(self.inner.request_timeout)
    }
}
