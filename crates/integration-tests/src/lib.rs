//! Test harness for the Bloomery client integration tests.
//!
//! Every test runs against a per-test [`wiremock::MockServer`]; nothing
//! here touches the network beyond loopback. Retry delays are shrunk to a
//! few milliseconds so exhaustion scenarios stay fast.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::{Arc, Mutex, Once, PoisonError};
use std::time::Duration;

use bloomery_client::{
    ApiClient, ChannelNotifier, ClientConfig, DocumentSink, MemoryTokenStore, Notification,
    Severity,
};
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::MockServer;

/// Install a tracing subscriber once, honoring `RUST_LOG`. Opt-in per test.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A mock API plus a client wired to it, with the notification stream and
/// token store exposed for assertions.
pub struct TestApi {
    pub server: MockServer,
    pub client: ApiClient,
    pub config: ClientConfig,
    pub tokens: Arc<MemoryTokenStore>,
    pub notifications: UnboundedReceiver<Notification>,
}

impl TestApi {
    /// Start a mock server and build a client against it with fast retries:
    /// 3 attempts / 10 ms base for the verbs, 3 attempts / 10 ms for cache
    /// cycles, periodic refresh disabled.
    pub async fn start() -> Self {
        init_tracing();
        let server = MockServer::start().await;
        let config = test_config(&server.uri());
        let tokens = Arc::new(MemoryTokenStore::new());
        let (notifier, notifications) = ChannelNotifier::new();
        let token_store: Arc<dyn bloomery_client::TokenStore> = tokens.clone();
        let client = ApiClient::new(&config, token_store, Arc::new(notifier))
            .expect("client should build");
        Self {
            server,
            client,
            config,
            tokens,
            notifications,
        }
    }

    /// Notifications published so far.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        let mut drained = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            drained.push(notification);
        }
        drained
    }

    /// Requests the server has seen for `path`.
    pub async fn requests_to(&self, path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == path)
            .count()
    }
}

/// Client configuration pointed at `base_url` with millisecond retry delays.
pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig::default()
        .with_base_url(base_url)
        .expect("mock server URI should be a valid base URL")
        .with_timeout(Duration::from_secs(5))
        .with_max_retries(3)
        .with_retry_delay(Duration::from_millis(10))
        .with_load_max_attempts(3)
        .with_load_retry_delay(Duration::from_millis(10))
        .with_refresh_interval(None)
}

/// Count the error toasts in a notification batch.
pub fn error_toasts(notifications: &[Notification]) -> usize {
    notifications
        .iter()
        .filter(|notification| {
            matches!(
                notification,
                Notification::Toast {
                    severity: Severity::Error,
                    ..
                }
            )
        })
        .count()
}

/// Records every title/description pushed through it.
#[derive(Debug, Default)]
pub struct RecordingDocumentSink {
    entries: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingDocumentSink {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All `(title, description)` pairs applied so far, oldest first.
    pub fn entries(&self) -> Vec<(String, Option<String>)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DocumentSink for RecordingDocumentSink {
    fn set_meta(&self, title: &str, description: Option<&str>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((title.to_string(), description.map(ToString::to_string)));
    }
}
