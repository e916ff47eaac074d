//! Tracker delivery against a live HTTP collector.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::json;

use aixel_core::{Device, EventType};
use aixel_integration_tests::{Behavior, MockCollector, unreachable_base_url};
use aixel_tracker::{KeyValueStore, MemoryStore, TrackOptions, TrackOutcome, Tracker, TrackerConfig};

fn memory() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

#[tokio::test]
async fn test_event_reaches_collector() {
    let collector = MockCollector::start().await;
    let tracker = Tracker::with_http(&collector.config(), memory());
    tracker.navigate("/products?utm_source=newsletter&utm_medium=email&utm_campaign=launch");

    let outcome = tracker
        .track(
            EventType::PageView,
            TrackOptions::new().metadata(json!({"landing": true, "page": "products"})),
        )
        .await;

    let TrackOutcome::Delivered(response) = outcome else {
        panic!("expected delivery, got {outcome:?}");
    };
    assert_eq!(response["ok"], json!(true));

    let events = collector.events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.event_type, EventType::PageView);
    assert_eq!(event.session_id, tracker.session_id());
    assert_eq!(event.user_id, None);
    assert_eq!(event.page_url, "/products");
    assert_eq!(event.utm_source, "newsletter");
    assert_eq!(event.utm_medium, "email");
    assert_eq!(event.utm_campaign, "launch");
    assert_eq!(event.platform, "web");
    assert_eq!(event.device, Device::Desktop);
    assert_eq!(event.metadata["page"], json!("products"));
    assert_eq!(event.metadata["user_email"], json!(null));
}

#[tokio::test]
async fn test_duplicates_reach_collector_once() {
    let collector = MockCollector::start().await;
    let tracker = Tracker::with_http(&collector.config(), memory());
    tracker.navigate("/cart");

    let first = tracker
        .track(EventType::PageView, TrackOptions::new().metadata(json!({"page": "cart"})))
        .await;
    let second = tracker
        .track(EventType::PageView, TrackOptions::new().metadata(json!({"page": "cart"})))
        .await;

    assert!(matches!(first, TrackOutcome::Delivered(_)));
    assert_eq!(second, TrackOutcome::Skipped);
    assert_eq!(collector.events().len(), 1);
}

#[tokio::test]
async fn test_unreachable_collector_is_not_fatal() {
    let config = TrackerConfig::default()
        .with_api_base(&unreachable_base_url().await)
        .unwrap();
    let tracker = Tracker::with_http(&config, memory());

    let event = tracker.prepare(EventType::Purchase, TrackOptions::new()).unwrap();
    assert_eq!(tracker.send(&event).await, None);

    let outcome = tracker.track(EventType::CheckoutStart, TrackOptions::new()).await;
    assert_eq!(outcome, TrackOutcome::Failed);
}

#[tokio::test]
async fn test_non_json_error_response_yields_none() {
    let collector = MockCollector::start_with(Behavior::ServerErrorText).await;
    let tracker = Tracker::with_http(&collector.config(), memory());

    let outcome = tracker.track(EventType::PageView, TrackOptions::new()).await;
    assert_eq!(outcome.into_response(), None);
    assert_eq!(collector.events().len(), 1);
}

#[tokio::test]
async fn test_json_error_body_is_returned() {
    let collector = MockCollector::start_with(Behavior::RejectWithJson).await;
    let tracker = Tracker::with_http(&collector.config(), memory());

    let outcome = tracker.track(EventType::PageView, TrackOptions::new()).await;
    assert_eq!(
        outcome.into_response(),
        Some(json!({"ok": false, "error": "event rejected"}))
    );
}

#[tokio::test]
async fn test_background_sends_complete() {
    let collector = MockCollector::start().await;
    let tracker = Tracker::with_http(&collector.config(), memory());

    let awaited = tracker.track_in_background(EventType::AddToCart, TrackOptions::new());
    drop(tracker.track_in_background(EventType::ProductView, TrackOptions::new()));

    assert!(matches!(awaited.outcome().await, TrackOutcome::Delivered(_)));
    let events = collector.wait_for(2).await;
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn test_explicit_user_id_is_sent() {
    let collector = MockCollector::start().await;
    let tracker = Tracker::with_http(&collector.config(), memory());
    let user_id = aixel_core::UserId::generate();

    tracker
        .track("newsletter_signup", TrackOptions::new().user(Some(&user_id)))
        .await;

    let events = collector.events();
    assert_eq!(events[0].event_type, EventType::from("newsletter_signup"));
    assert_eq!(events[0].user_id, Some(user_id));
}
