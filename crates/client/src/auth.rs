//! Session token storage seam.
//!
//! The token is read on every outgoing request, written by the host login
//! flow, and cleared by the 401 handler. Persistence (browser local storage,
//! keychain, ...) is the embedding shell's job; this crate only defines the
//! seam and an in-memory default.

use std::sync::{PoisonError, RwLock};

use secrecy::SecretString;

/// Storage for the bearer token. Object-safe; share as `Arc<dyn TokenStore>`.
pub trait TokenStore: Send + Sync {
    /// Current token, if any. Absence is not an error; requests simply go
    /// out unauthenticated.
    fn token(&self) -> Option<SecretString>;

    /// Replace the stored token (login flow).
    fn store(&self, token: SecretString);

    /// Drop the stored token (logout, or the 401 handler).
    fn clear(&self);
}

/// In-memory token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<SecretString>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, token: SecretString) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
