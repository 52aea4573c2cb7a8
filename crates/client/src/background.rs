//! The background cache: a single nullable "active background" resource.
//!
//! Same retry-fetch shape as [`crate::store::StoreCache`], but flat state,
//! manual [`BackgroundCache::refresh`] only, no periodic loop and no push
//! subscription. It fails and retries independently of the store cache;
//! the two share no retry budget.

use std::sync::Arc;

use bloomery_core::Background;
use tokio::sync::watch;
use tracing::{debug, error, instrument, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::notify::Notifier;
use crate::retry::{RetryOptions, with_retry};

/// Surfaced in [`BackgroundState::error`] once a fetch cycle has exhausted
/// its attempts.
pub const BACKGROUND_FAILED_MESSAGE: &str =
    "Unable to load the store background. Please refresh the page.";

/// Snapshot of the cached background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundState {
    /// `None` both before the first load and when no background is active.
    pub background: Option<Background>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for BackgroundState {
    fn default() -> Self {
        Self {
            background: None,
            loading: true,
            error: None,
        }
    }
}

/// The background cache. Cheap to clone; all clones share one state.
#[derive(Clone)]
pub struct BackgroundCache {
    inner: Arc<BackgroundCacheInner>,
}

struct BackgroundCacheInner {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<BackgroundState>,
    load_options: RetryOptions<ApiError>,
    load_gate: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for BackgroundCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundCache")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl BackgroundCache {
    /// Create the cache; no request is made until [`Self::load`].
    #[must_use]
    pub fn new(api: ApiClient, config: &ClientConfig) -> Self {
        let notifier = api.notifier();
        let load_options = RetryOptions::default()
            .with_max_attempts(config.load_max_attempts)
            .with_base_delay(config.load_retry_delay)
            .without_jitter()
            .with_on_error(|cause: &ApiError| {
                warn!(%cause, "background fetch attempt failed");
            });

        Self {
            inner: Arc::new(BackgroundCacheInner {
                api,
                notifier,
                state: watch::channel(BackgroundState::default()).0,
                load_options,
                load_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Subscribe to state snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BackgroundState> {
        self.inner.state.subscribe()
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> BackgroundState {
        self.inner.state.borrow().clone()
    }

    /// Fetch the active background, retrying with doubling delays. A 404
    /// resolves to no background, which is a loaded state, not an error.
    ///
    /// Errors never propagate; on exhaustion the state carries
    /// [`BACKGROUND_FAILED_MESSAGE`] and one failure toast is published.
    #[instrument(skip(self))]
    pub async fn load(&self) {
        let _gate = self.inner.load_gate.lock().await;
        self.inner.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let api = &self.inner.api;
        let result = with_retry(|| api.active_background(), &self.inner.load_options).await;

        match result {
            Ok(background) => {
                debug!(active = background.is_some(), "background loaded");
                self.inner.state.send_modify(|state| {
                    state.background = background;
                    state.loading = false;
                    state.error = None;
                });
            }
            Err(cause) => {
                error!(%cause, "background load failed, retries exhausted");
                self.inner.state.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(BACKGROUND_FAILED_MESSAGE.to_string());
                });
                self.inner.notifier.error(BACKGROUND_FAILED_MESSAGE);
            }
        }
    }

    /// Manual refresh action; just another fetch cycle.
    pub async fn refresh(&self) {
        self.load().await;
    }
}

#[cfg(test)]
mod tests {
    use crate::auth::MemoryTokenStore;
    use crate::notify::NullNotifier;

    use super::*;

    #[test]
    fn initial_state_is_empty_and_loading() {
        let config = ClientConfig::default();
        let api = ApiClient::new(
            &config,
            Arc::new(MemoryTokenStore::new()),
            Arc::new(NullNotifier),
        )
        .expect("client");
        let cache = BackgroundCache::new(api, &config);

        let state = cache.state();
        assert!(state.loading);
        assert!(state.background.is_none());
        assert!(state.error.is_none());
    }
}
