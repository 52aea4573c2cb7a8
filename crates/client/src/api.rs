//! Typed wrappers for the endpoints the client core interprets.
//!
//! Everything else the storefront and admin fetch (products, orders,
//! coupons, ...) is opaque payload and goes through the generic verbs on
//! [`ApiClient`].
//!
//! Reads are [`ApiRequest::quiet`]: the caches calling them are their own
//! terminal error handlers, and a retried fetch cycle must not toast once
//! per failed attempt. Writes keep the wrapper's toasts.

use bloomery_core::{
    Announcement, Background, Hero, HeroId, HeroUpdate, Platform, SettingsPatch, StoreSettings,
};
use reqwest::{Method, StatusCode};

use crate::error::ApiError;
use crate::http::{ApiClient, ApiRequest};

impl ApiClient {
    /// Fetch the active hero banner. A 404 means no hero is configured and
    /// resolves to `None`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] other than a 404.
    pub async fn active_hero(&self) -> Result<Option<Hero>, ApiError> {
        none_on_not_found(
            self.send(&ApiRequest::new(Method::GET, "/hero/active").quiet())
                .await,
        )
    }

    /// Fetch the store-wide settings.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn store_settings(&self) -> Result<StoreSettings, ApiError> {
        self.send(&ApiRequest::new(Method::GET, "/settings").quiet())
            .await
    }

    /// Fetch the active announcement bar items for `platform`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn active_announcements(
        &self,
        platform: Platform,
    ) -> Result<Vec<Announcement>, ApiError> {
        self.send(
            &ApiRequest::new(Method::GET, "/announcements/active")
                .query("platform", platform.as_str())
                .quiet(),
        )
        .await
    }

    /// Fetch the active background. A 404 means none is set and resolves to
    /// `None`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] other than a 404.
    pub async fn active_background(&self) -> Result<Option<Background>, ApiError> {
        none_on_not_found(
            self.send(&ApiRequest::new(Method::GET, "/backgrounds/active").quiet())
                .await,
        )
    }

    /// Persist hero changes; the server responds with the full merged hero.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn update_hero(&self, id: HeroId, update: &HeroUpdate) -> Result<Hero, ApiError> {
        self.put(&format!("/hero/{id}"), update).await
    }

    /// Persist settings changes; the server responds with the full merged
    /// settings object.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the request.
    pub async fn update_settings(&self, patch: &SettingsPatch) -> Result<StoreSettings, ApiError> {
        self.put("/settings", patch).await
    }
}

fn none_on_not_found<T>(result: Result<T, ApiError>) -> Result<Option<T>, ApiError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ApiError::Status { status, .. }) if status == StatusCode::NOT_FOUND => Ok(None),
        Err(error) => Err(error),
    }
}
