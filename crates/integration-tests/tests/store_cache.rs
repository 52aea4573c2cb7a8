//! Integration tests for the store-data cache: concurrent load, cycle-level
//! retry, exhaustion, write-through updates, and the periodic refresh.

use std::time::Duration;

use bloomery_client::store::LOAD_FAILED_MESSAGE;
use bloomery_client::{ApiError, Notification, Severity, StoreCache};
use bloomery_core::{HeroId, HeroUpdate, SettingsPatch};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use bloomery_integration_tests::{RecordingDocumentSink, TestApi, error_toasts};

fn hero_body() -> serde_json::Value {
    json!({
        "id": 1,
        "title": "Spring bouquets",
        "subtitle": "Fresh from the growers",
        "imageUrl": "https://cdn.bloomery.shop/hero/spring.jpg",
        "ctaLabel": "Shop now",
        "ctaUrl": "/collections/spring",
        "isActive": true,
        "updatedAt": "2025-05-01T08:00:00Z"
    })
}

fn settings_body() -> serde_json::Value {
    json!({
        "storeName": "Bloomery",
        "tagline": "Flowers, daily",
        "primaryColor": "#2f4f2f",
        "pageTitle": "Bloomery | Fresh flowers",
        "metaDescription": "Fresh flowers delivered same day"
    })
}

fn announcements_body() -> serde_json::Value {
    json!([{"id": 5, "message": "Free delivery over $50"}])
}

async fn mount_happy_path(api: &TestApi) {
    Mock::given(method("GET"))
        .and(path("/hero/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hero_body()))
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(settings_body()))
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/announcements/active"))
        .and(query_param("platform", "web"))
        .respond_with(ResponseTemplate::new(200).set_body_json(announcements_body()))
        .mount(&api.server)
        .await;
}

#[tokio::test]
async fn initial_load_populates_state_and_document_meta() {
    let mut api = TestApi::start().await;
    mount_happy_path(&api).await;

    let document = RecordingDocumentSink::new();
    let cache = StoreCache::new(api.client.clone(), document.clone(), &api.config);
    let mut updates = cache.subscribe();

    cache.load().await;

    let state = cache.state();
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert_eq!(state.hero.as_ref().map(|h| h.id), Some(HeroId::new(1)));
    assert_eq!(
        state.settings.as_ref().map(|s| s.store_name.as_str()),
        Some("Bloomery")
    );
    assert_eq!(state.announcements.len(), 1);

    // Subscribers observe the loaded snapshot.
    assert!(updates.has_changed().expect("sender alive"));
    assert!(!updates.borrow_and_update().loading);

    assert_eq!(
        document.entries().last(),
        Some(&(
            "Bloomery | Fresh flowers".to_string(),
            Some("Fresh flowers delivered same day".to_string())
        ))
    );
    assert_eq!(error_toasts(&api.drain_notifications()), 0);
}

#[tokio::test]
async fn announcements_stay_an_array_when_the_server_returns_none() {
    let api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/hero/active"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(settings_body()))
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/announcements/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&api.server)
        .await;

    let cache = StoreCache::new(
        api.client.clone(),
        RecordingDocumentSink::new(),
        &api.config,
    );
    cache.load().await;

    let state = cache.state();
    assert!(state.error.is_none(), "no hero and no announcements is a loaded state");
    assert!(state.hero.is_none());
    assert!(state.announcements.is_empty());
}

#[tokio::test]
async fn transient_settings_failures_recover_without_error_toasts() {
    let mut api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/hero/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hero_body()))
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/announcements/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(announcements_body()))
        .mount(&api.server)
        .await;
    // Two failing attempts, then success on the third cycle.
    Mock::given(method("GET"))
        .and(path("/settings"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(settings_body()))
        .mount(&api.server)
        .await;

    let cache = StoreCache::new(
        api.client.clone(),
        RecordingDocumentSink::new(),
        &api.config,
    );
    cache.load().await;

    let state = cache.state();
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert!(state.settings.is_some());
    assert_eq!(api.requests_to("/settings").await, 3);
    assert_eq!(
        error_toasts(&api.drain_notifications()),
        0,
        "a recovered cycle must stay silent"
    );
}

#[tokio::test]
async fn exhausted_retries_set_the_error_state_and_toast_once() {
    let mut api = TestApi::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&api.server)
        .await;

    let cache = StoreCache::new(
        api.client.clone(),
        RecordingDocumentSink::new(),
        &api.config,
    );
    cache.load().await;

    let state = cache.state();
    assert!(!state.loading);
    assert_eq!(state.error.as_deref(), Some(LOAD_FAILED_MESSAGE));
    assert!(state.announcements.is_empty());

    let notifications = api.drain_notifications();
    assert_eq!(error_toasts(&notifications), 1, "one toast per exhausted cycle");
}

#[tokio::test]
async fn successful_update_merges_the_server_response() {
    let mut api = TestApi::start().await;
    mount_happy_path(&api).await;

    let mut saved = settings_body();
    saved["primaryColor"] = json!("#ffffff");
    Mock::given(method("PUT"))
        .and(path("/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(saved))
        .mount(&api.server)
        .await;

    let document = RecordingDocumentSink::new();
    let cache = StoreCache::new(api.client.clone(), document.clone(), &api.config);
    cache.load().await;
    api.drain_notifications();

    let patch = SettingsPatch {
        primary_color: Some("#ffffff".to_string()),
        ..SettingsPatch::default()
    };
    let settings = cache.update_settings(&patch).await.expect("update succeeds");
    assert_eq!(settings.primary_color.as_deref(), Some("#ffffff"));

    let state = cache.state();
    assert!(!state.loading);
    assert_eq!(
        state.settings.as_ref().and_then(|s| s.primary_color.as_deref()),
        Some("#ffffff")
    );
    assert!(api.drain_notifications().iter().any(|notification| matches!(
        notification,
        Notification::Toast { severity: Severity::Success, message } if message == "Store settings saved."
    )));
    // Meta reapplied after load and again after the update.
    assert_eq!(document.entries().len(), 2);
}

#[tokio::test]
async fn failed_update_leaves_the_cache_untouched_and_rethrows() {
    let mut api = TestApi::start().await;
    mount_happy_path(&api).await;
    Mock::given(method("PUT"))
        .and(path("/settings"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "invalid color"})),
        )
        .mount(&api.server)
        .await;

    let cache = StoreCache::new(
        api.client.clone(),
        RecordingDocumentSink::new(),
        &api.config,
    );
    cache.load().await;
    let before = cache.state().settings.expect("loaded settings");
    api.drain_notifications();

    let patch = SettingsPatch {
        primary_color: Some("not-a-color".to_string()),
        ..SettingsPatch::default()
    };
    let result = cache.update_settings(&patch).await;
    match result {
        Err(ApiError::Status { status, message }) => {
            assert_eq!(status.as_u16(), 422);
            assert_eq!(message, "invalid color");
        }
        other => panic!("expected the write rejection, got {other:?}"),
    }

    let state = cache.state();
    assert!(!state.loading, "loading flag rolls back");
    assert_eq!(state.settings, Some(before), "cached settings unchanged");
}

#[tokio::test]
async fn hero_update_writes_through_and_toasts() {
    let mut api = TestApi::start().await;
    mount_happy_path(&api).await;

    let mut updated = hero_body();
    updated["title"] = json!("Summer bouquets");
    Mock::given(method("PUT"))
        .and(path("/hero/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .mount(&api.server)
        .await;

    let cache = StoreCache::new(
        api.client.clone(),
        RecordingDocumentSink::new(),
        &api.config,
    );
    cache.load().await;
    api.drain_notifications();

    let update = HeroUpdate {
        title: Some("Summer bouquets".to_string()),
        ..HeroUpdate::default()
    };
    let hero = cache
        .update_hero(HeroId::new(1), &update)
        .await
        .expect("update succeeds");
    assert_eq!(hero.title, "Summer bouquets");
    assert_eq!(
        cache.state().hero.map(|h| h.title),
        Some("Summer bouquets".to_string())
    );
    assert!(api.drain_notifications().iter().any(|notification| matches!(
        notification,
        Notification::Toast { message, .. } if message == "Hero banner updated."
    )));
}

#[tokio::test]
async fn periodic_refresh_reloads_until_shutdown() {
    let api = TestApi::start().await;
    mount_happy_path(&api).await;

    let config = api
        .config
        .clone()
        .with_refresh_interval(Some(Duration::from_millis(100)));
    let cache = StoreCache::new(api.client.clone(), RecordingDocumentSink::new(), &config);

    cache.start();
    tokio::time::sleep(Duration::from_millis(380)).await;
    let while_running = api.requests_to("/settings").await;
    assert!(
        while_running >= 2,
        "initial load plus at least one refresh, saw {while_running}"
    );

    cache.shutdown();
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(
        api.requests_to("/settings").await,
        while_running,
        "no further loads after shutdown"
    );
}
