//! The store-data cache: hero, settings, and announcements.
//!
//! [`StoreCache`] owns its state exclusively; consumers receive read-only
//! snapshots over a watch channel and mutate only through the exposed
//! actions. One instance per application; it is an explicit, injectable
//! object rather than a process-wide singleton so the store and background
//! caches compose and test in isolation.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bloomery_core::{
    Announcement, Hero, HeroId, HeroUpdate, Platform, SettingsPatch, StoreSettings,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, instrument, warn};

use crate::config::ClientConfig;
use crate::document::DocumentSink;
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::notify::Notifier;
use crate::retry::{RetryOptions, with_retry};

/// Surfaced in [`StoreState::error`] and as a toast once a fetch cycle has
/// exhausted its attempts.
pub const LOAD_FAILED_MESSAGE: &str = "Unable to load store data. Please refresh the page.";

/// Snapshot of the cached store data.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    pub hero: Option<Hero>,
    pub settings: Option<StoreSettings>,
    /// Always a Vec, even on terminal failure.
    pub announcements: Vec<Announcement>,
    /// True exactly while a fetch or update is in flight.
    pub loading: bool,
    /// Set only when a fetch cycle has exhausted its attempts.
    pub error: Option<String>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            hero: None,
            settings: None,
            announcements: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

/// The store-data cache. Cheap to clone; all clones share one state.
#[derive(Clone)]
pub struct StoreCache {
    inner: Arc<StoreCacheInner>,
}

struct StoreCacheInner {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    document: Arc<dyn DocumentSink>,
    state: watch::Sender<StoreState>,
    load_options: RetryOptions<ApiError>,
    refresh_interval: Option<Duration>,
    /// Serializes fetch cycles; only one is active at a time.
    load_gate: tokio::sync::Mutex<()>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for StoreCacheInner {
    fn drop(&mut self) {
        if let Some(task) = take_task(&self.refresh_task) {
            task.abort();
        }
    }
}

impl std::fmt::Debug for StoreCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCache")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl StoreCache {
    /// Create the cache. No request is made until [`Self::load`] or
    /// [`Self::start`] is called; the initial state is empty and loading.
    #[must_use]
    pub fn new(api: ApiClient, document: Arc<dyn DocumentSink>, config: &ClientConfig) -> Self {
        let notifier = api.notifier();
        let load_options = RetryOptions::default()
            .with_max_attempts(config.load_max_attempts)
            .with_base_delay(config.load_retry_delay)
            .without_jitter()
            .with_on_error(|error: &ApiError| {
                warn!(%error, "store data fetch attempt failed");
            });

        Self {
            inner: Arc::new(StoreCacheInner {
                api,
                notifier,
                document,
                state: watch::channel(StoreState::default()).0,
                load_options,
                refresh_interval: config.refresh_interval,
                load_gate: tokio::sync::Mutex::new(()),
                refresh_task: Mutex::new(None),
            }),
        }
    }

    /// Subscribe to state snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.inner.state.subscribe()
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> StoreState {
        self.inner.state.borrow().clone()
    }

    /// Run one fetch cycle: hero, settings, and announcements concurrently,
    /// retried as a unit with doubling delays until the configured attempt
    /// cap.
    ///
    /// Errors never propagate to the caller; the cache is the terminal
    /// handler. On exhaustion the state carries [`LOAD_FAILED_MESSAGE`],
    /// announcements are forced back to empty, and a single failure toast is
    /// published.
    #[instrument(skip(self))]
    pub async fn load(&self) {
        let _gate = self.inner.load_gate.lock().await;
        self.inner.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let api = &self.inner.api;
        let result = with_retry(
            || async {
                tokio::try_join!(
                    api.active_hero(),
                    api.store_settings(),
                    api.active_announcements(Platform::Web),
                )
            },
            &self.inner.load_options,
        )
        .await;

        match result {
            Ok((hero, settings, announcements)) => {
                debug!(
                    has_hero = hero.is_some(),
                    announcements = announcements.len(),
                    "store data loaded"
                );
                self.apply_document_meta(&settings);
                self.inner.state.send_modify(|state| {
                    state.hero = hero;
                    state.settings = Some(settings);
                    state.announcements = announcements;
                    state.loading = false;
                    state.error = None;
                });
            }
            Err(cause) => {
                error!(%cause, "store data load failed, retries exhausted");
                self.inner.state.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(LOAD_FAILED_MESSAGE.to_string());
                    state.announcements = Vec::new();
                });
                self.inner.notifier.error(LOAD_FAILED_MESSAGE);
            }
        }
    }

    /// Spawn the initial load plus the periodic refresh loop. The refresh
    /// self-heals from missed push events; it stops when the cache is
    /// dropped or [`Self::shutdown`] is called.
    pub fn start(&self) {
        let weak = Arc::downgrade(&self.inner);
        let refresh_interval = self.inner.refresh_interval;

        let task = tokio::spawn(async move {
            if let Some(inner) = weak.upgrade() {
                Self { inner }.load().await;
            }
            let Some(period) = refresh_interval else {
                return;
            };
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                Self { inner }.load().await;
            }
        });

        if let Some(previous) = replace_task(&self.inner.refresh_task, task) {
            previous.abort();
        }
    }

    /// Stop the refresh loop.
    pub fn shutdown(&self) {
        if let Some(task) = take_task(&self.inner.refresh_task) {
            task.abort();
        }
    }

    /// Persist hero changes and merge the server's response into the cache.
    ///
    /// # Errors
    ///
    /// Re-throws the [`ApiError`] so the invoking form can show its own
    /// error UI; on failure the cached state is untouched apart from the
    /// loading flag rolling back.
    #[instrument(skip(self, update), fields(hero_id = %id))]
    pub async fn update_hero(&self, id: HeroId, update: &HeroUpdate) -> Result<Hero, ApiError> {
        self.inner.state.send_modify(|state| state.loading = true);
        match self.inner.api.update_hero(id, update).await {
            Ok(hero) => {
                self.inner.state.send_modify(|state| {
                    state.hero = Some(hero.clone());
                    state.loading = false;
                });
                self.inner.notifier.success("Hero banner updated.");
                Ok(hero)
            }
            Err(cause) => {
                warn!(%cause, "hero update failed");
                self.inner.state.send_modify(|state| state.loading = false);
                Err(cause)
            }
        }
    }

    /// Persist settings changes and merge the server's full response into
    /// the cache, reapplying document title/meta.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::update_hero`].
    #[instrument(skip(self, patch))]
    pub async fn update_settings(&self, patch: &SettingsPatch) -> Result<StoreSettings, ApiError> {
        self.inner.state.send_modify(|state| state.loading = true);
        match self.inner.api.update_settings(patch).await {
            Ok(settings) => {
                self.apply_document_meta(&settings);
                self.inner.state.send_modify(|state| {
                    state.settings = Some(settings.clone());
                    state.loading = false;
                });
                self.inner.notifier.success("Store settings saved.");
                Ok(settings)
            }
            Err(cause) => {
                warn!(%cause, "settings update failed");
                self.inner.state.send_modify(|state| state.loading = false);
                Err(cause)
            }
        }
    }

    /// Merge an out-of-band settings patch into the cache without a network
    /// round-trip. The push transport is an external collaborator that calls
    /// this; the cache knows nothing about where patches come from.
    ///
    /// Empty patches are ignored. Title/meta are reapplied when the patch
    /// carries SEO-relevant fields, and the toast summarizes which logical
    /// groups changed.
    pub fn apply_patch(&self, patch: &SettingsPatch) {
        if patch.is_empty() {
            return;
        }

        self.inner.state.send_modify(|state| {
            patch.apply_to(state.settings.get_or_insert_with(StoreSettings::default));
        });

        if patch.touches_document_meta() {
            let settings = self.inner.state.borrow().settings.clone();
            if let Some(settings) = &settings {
                self.apply_document_meta(settings);
            }
        }

        let groups = patch.changed_groups();
        let message = if groups.is_empty() {
            "Store settings updated.".to_string()
        } else {
            let names: Vec<String> = groups.iter().map(ToString::to_string).collect();
            format!("Store settings updated ({}).", names.join(", "))
        };
        debug!(%message, "settings patch applied");
        self.inner.notifier.success(&message);
    }

    fn apply_document_meta(&self, settings: &StoreSettings) {
        self.inner
            .document
            .set_meta(settings.document_title(), settings.meta_description.as_deref());
    }
}

fn take_task(slot: &Mutex<Option<JoinHandle<()>>>) -> Option<JoinHandle<()>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

fn replace_task(
    slot: &Mutex<Option<JoinHandle<()>>>,
    task: JoinHandle<()>,
) -> Option<JoinHandle<()>> {
    slot.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(task)
}
