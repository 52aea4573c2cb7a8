//! Integration tests for the background cache: load, manual refresh, the
//! 404-means-none rule, and exhaustion.

use bloomery_client::BackgroundCache;
use bloomery_client::background::BACKGROUND_FAILED_MESSAGE;
use bloomery_core::BackgroundId;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use bloomery_integration_tests::{TestApi, error_toasts};

fn background_body(id: i32, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "imageUrl": format!("https://cdn.bloomery.shop/backgrounds/{id}.jpg"),
        "isActive": true
    })
}

#[tokio::test]
async fn load_populates_the_active_background() {
    let mut api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/backgrounds/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(background_body(2, "Linen")))
        .mount(&api.server)
        .await;

    let cache = BackgroundCache::new(api.client.clone(), &api.config);
    cache.load().await;

    let state = cache.state();
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert_eq!(
        state.background.as_ref().map(|b| b.id),
        Some(BackgroundId::new(2))
    );
    assert_eq!(error_toasts(&api.drain_notifications()), 0);
}

#[tokio::test]
async fn missing_background_is_a_loaded_state_not_an_error() {
    let mut api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/backgrounds/active"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&api.server)
        .await;

    let cache = BackgroundCache::new(api.client.clone(), &api.config);
    cache.load().await;

    let state = cache.state();
    assert!(!state.loading);
    assert!(state.background.is_none());
    assert!(state.error.is_none(), "absence is expected, not a failure");
    assert!(api.drain_notifications().is_empty());
}

#[tokio::test]
async fn refresh_picks_up_a_newly_activated_background() {
    let api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/backgrounds/active"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/backgrounds/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(background_body(7, "Terracotta")))
        .mount(&api.server)
        .await;

    let cache = BackgroundCache::new(api.client.clone(), &api.config);
    cache.load().await;
    assert!(cache.state().background.is_none());

    cache.refresh().await;
    assert_eq!(
        cache.state().background.map(|b| b.name),
        Some("Terracotta".to_string())
    );
}

#[tokio::test]
async fn exhausted_retries_set_the_error_state_and_toast_once() {
    let mut api = TestApi::start().await;
    Mock::given(method("GET"))
        .and(path("/backgrounds/active"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&api.server)
        .await;

    let cache = BackgroundCache::new(api.client.clone(), &api.config);
    cache.load().await;

    let state = cache.state();
    assert!(!state.loading);
    assert!(state.background.is_none());
    assert_eq!(state.error.as_deref(), Some(BACKGROUND_FAILED_MESSAGE));
    assert_eq!(api.requests_to("/backgrounds/active").await, 3);
    assert_eq!(error_toasts(&api.drain_notifications()), 1);
}
