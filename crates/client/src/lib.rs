//! Bloomery Client - data-fetching and state-management core.
//!
//! The Bloomery storefront and admin dashboard are thin presentation layers
//! over a remote REST API; this crate is the part underneath them that talks
//! to that API and keeps client-side state coherent:
//!
//! - [`retry`] - jittered exponential backoff and a generic async retry
//!   executor with a pluggable [`retry::RetryPolicy`]
//! - [`http`] - the [`http::ApiClient`] wrapper: bearer-token injection,
//!   status-class handling, per-request toast suppression, retry-wrapped verbs
//! - [`api`] - typed wrappers for the handful of endpoints the core interprets
//! - [`store`] - the [`store::StoreCache`]: hero/settings/announcements with
//!   concurrent fetch, cycle-level retry, write-through updates, push-patch
//!   merging, and periodic refresh
//! - [`background`] - the [`background::BackgroundCache`] for the single
//!   active background resource
//!
//! Collaborators the embedding shell provides are modeled as traits:
//! [`auth::TokenStore`] (credential storage), [`notify::Notifier`] (the toast
//! surface), and [`document::DocumentSink`] (page title/meta application).
//! The crate installs no tracing subscriber and writes no files.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod background;
pub mod config;
pub mod document;
pub mod error;
pub mod http;
pub mod notify;
pub mod retry;
pub mod store;

pub use auth::{MemoryTokenStore, TokenStore};
pub use background::{BackgroundCache, BackgroundState};
pub use config::{ClientConfig, ConfigError};
pub use document::{DocumentSink, NullDocumentSink};
pub use error::ApiError;
pub use http::{ApiClient, ApiRequest};
pub use notify::{ChannelNotifier, Notification, Notifier, NullNotifier, Severity};
pub use retry::{RetryOptions, RetryPolicy, compute_delay, with_retry};
pub use store::{StoreCache, StoreState};
