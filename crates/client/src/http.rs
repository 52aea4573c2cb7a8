//! HTTP API client.
//!
//! [`ApiClient`] wraps a [`reqwest::Client`] with the cross-cutting behavior
//! every Bloomery request shares: bearer-token injection, status-class
//! handling with user notifications, per-request toast suppression, and
//! retry-wrapped verb conveniences built on [`crate::retry::with_retry`].

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::TokenStore;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::notify::{Notification, Notifier};
use crate::retry::{RetryOptions, RetryPolicy, with_retry};

const NETWORK_MESSAGE: &str = "Network error. Please check your connection and try again.";
const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";
const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action.";
const NOT_FOUND_MESSAGE: &str = "The requested resource was not found.";
const SERVER_ERROR_MESSAGE: &str = "Something went wrong on our end. Please try again later.";
const FALLBACK_MESSAGE: &str = "Request failed. Please try again.";

/// GET paths where a 404 is an expected "nothing configured" state, not an
/// error worth a toast.
const OPTIONAL_RESOURCE_PATHS: &[&str] = &["/hero/active", "/backgrounds/active"];

/// A single API request: verb, path, query, optional JSON body, and the
/// toast-suppression flag.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    suppress_toast: bool,
}

impl ApiRequest {
    /// Start a request for `path` (leading slash, relative to the base URL).
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            suppress_toast: false,
        }
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Parse`] if `body` cannot be serialized.
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Suppress the client's own toast for this request; the caller handles
    /// error presentation. 401 handling is global and ignores this flag.
    #[must_use]
    pub const fn quiet(mut self) -> Self {
        self.suppress_toast = true;
        self
    }
}

/// The Bloomery API client. Cheap to clone; all clones share one connection
/// pool, token store, and notifier.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
    retry: RetryOptions<ApiError>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Init`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(
        config: &ClientConfig,
        tokens: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ApiError::Init)?;

        let retry = RetryOptions::default()
            .with_max_attempts(config.max_retries)
            .with_base_delay(config.retry_delay)
            .with_policy(RetryPolicy::transient());

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.clone(),
                tokens,
                notifier,
                retry,
            }),
        })
    }

    /// The notification sink this client publishes to.
    #[must_use]
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.inner.notifier)
    }

    /// Execute a request once and decode the JSON response.
    ///
    /// An empty 2xx body decodes as JSON `null`, so `()` and `Option<T>`
    /// targets work for bodyless responses.
    ///
    /// # Errors
    ///
    /// See [`ApiError`]; status-class toasts are published here unless the
    /// request is [`ApiRequest::quiet`].
    pub async fn send<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        let url = format!("{}{}", self.inner.base_url, request.path);
        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), &url)
            .header("x-request-id", Uuid::new_v4().to_string());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = self.inner.tokens.token() {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(
                    method = %request.method,
                    path = %request.path,
                    %error,
                    "request never reached the server"
                );
                if !request.suppress_toast {
                    self.inner.notifier.error(NETWORK_MESSAGE);
                }
                return Err(ApiError::Network(error));
            }
        };

        let status = response.status();
        if status.is_success() {
            let body = response.text().await.map_err(ApiError::Network)?;
            let payload = if body.is_empty() { "null" } else { body.as_str() };
            return Ok(serde_json::from_str(payload)?);
        }

        if status == StatusCode::UNAUTHORIZED {
            // Global handling: credentials are stale no matter who asked.
            self.inner.tokens.clear();
            self.inner.notifier.warning(SESSION_EXPIRED_MESSAGE);
            self.inner.notifier.notify(Notification::SessionExpired);
            return Err(ApiError::AuthExpired);
        }

        let body = response.text().await.unwrap_or_default();
        let server_message = extract_message(&body);
        debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            message = server_message.as_deref().unwrap_or(""),
            "request rejected"
        );

        if !suppresses_toast(request, status) {
            match status {
                StatusCode::FORBIDDEN => self.inner.notifier.error(FORBIDDEN_MESSAGE),
                StatusCode::NOT_FOUND => self.inner.notifier.error(NOT_FOUND_MESSAGE),
                StatusCode::INTERNAL_SERVER_ERROR => self.inner.notifier.error(SERVER_ERROR_MESSAGE),
                _ => self
                    .inner
                    .notifier
                    .error(server_message.as_deref().unwrap_or(FALLBACK_MESSAGE)),
            }
        }

        Err(ApiError::Status {
            status,
            message: server_message.unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("request failed").to_string()
            }),
        })
    }

    /// [`Self::send`] wrapped in the client's default retry options: network
    /// errors, 5xx and 429 retried with jittered backoff; other 4xx fail on
    /// the first attempt.
    ///
    /// # Errors
    ///
    /// The last observed [`ApiError`] once attempts are exhausted, or the
    /// first non-retryable one.
    pub async fn send_with_retry<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<T, ApiError> {
        with_retry(|| self.send(request), &self.inner.retry).await
    }

    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(&ApiRequest::new(Method::GET, path)).await
    }

    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(&ApiRequest::new(Method::POST, path).json(body)?).await
    }

    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(&ApiRequest::new(Method::PUT, path).json(body)?).await
    }

    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(&ApiRequest::new(Method::PATCH, path).json(body)?).await
    }

    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(&ApiRequest::new(Method::DELETE, path)).await
    }

    /// # Errors
    ///
    /// See [`Self::send_with_retry`].
    pub async fn get_with_retry<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_with_retry(&ApiRequest::new(Method::GET, path)).await
    }

    /// # Errors
    ///
    /// See [`Self::send_with_retry`].
    pub async fn post_with_retry<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_with_retry(&ApiRequest::new(Method::POST, path).json(body)?)
            .await
    }

    /// # Errors
    ///
    /// See [`Self::send_with_retry`].
    pub async fn put_with_retry<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_with_retry(&ApiRequest::new(Method::PUT, path).json(body)?)
            .await
    }

    /// # Errors
    ///
    /// See [`Self::send_with_retry`].
    pub async fn patch_with_retry<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_with_retry(&ApiRequest::new(Method::PATCH, path).json(body)?)
            .await
    }

    /// # Errors
    ///
    /// See [`Self::send_with_retry`].
    pub async fn delete_with_retry<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_with_retry(&ApiRequest::new(Method::DELETE, path)).await
    }
}

/// Whether the toast for an error response should be withheld: either the
/// caller asked for quiet, or this is a GET 404 on an optional resource.
fn suppresses_toast(request: &ApiRequest, status: StatusCode) -> bool {
    if request.suppress_toast {
        return true;
    }
    status == StatusCode::NOT_FOUND
        && request.method == Method::GET
        && OPTIONAL_RESOURCE_PATHS.contains(&request.path.as_str())
}

/// Pull a human-readable message out of an error body (`message` or `error`
/// field of a JSON object).
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;
    object
        .get("message")
        .or_else(|| object.get("error"))
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string)
}
