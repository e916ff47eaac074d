//! Shopper journeys with file-backed state, one storefront per "run".

#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use aixel_core::{Email, EventType, ProductId};
use aixel_integration_tests::{MockCollector, temp_state_path};
use aixel_tracker::storefront::CheckoutView;
use aixel_tracker::{FileStore, KeyValueStore, LoginMode, Storefront, Tracker};

/// Open the storefront the way each CLI invocation does.
fn open(collector: &MockCollector, state: &Path) -> Storefront {
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(state).unwrap());
    Storefront::new(Tracker::with_http(&collector.config(), store))
}

#[tokio::test]
async fn test_purchase_journey_across_runs() {
    let collector = MockCollector::start().await;
    let state = temp_state_path();
    let email = Email::parse("maya@example.com").unwrap();

    let login = open(&collector, &state)
        .submit_login(&email, Some("Maya"), LoginMode::Signup)
        .await;
    let user_id = login.resolution.user.user_id;

    open(&collector, &state).view_products(None).await;
    open(&collector, &state)
        .add_to_cart(ProductId::new(1))
        .await
        .unwrap();
    open(&collector, &state)
        .add_to_cart(ProductId::new(2))
        .await
        .unwrap();

    let shop = open(&collector, &state);
    assert_eq!(shop.cart().len(), 2);
    shop.start_checkout().await.unwrap();
    assert!(matches!(shop.view_checkout().await, CheckoutView::Shown(_)));

    let receipt = open(&collector, &state).pay().await.unwrap();
    assert_eq!(format!("{:.2}", receipt.totals.total), "547.80");

    let events = collector.wait_for(8).await;
    let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(
        types,
        [
            "user_signup",
            "page_view",
            "add_to_cart",
            "add_to_cart",
            "checkout_start",
            "page_view",
            "payment_info_entered",
            "purchase",
        ]
    );

    let session_id = events[0].session_id;
    assert!(events.iter().all(|e| e.session_id == session_id));
    assert!(events.iter().all(|e| e.user_id.as_ref() == Some(&user_id)));
    assert!(events.iter().all(|e| e.metadata["user_email"] == json!("maya@example.com")));

    let purchase = events.last().unwrap();
    assert_eq!(serde_json::to_value(purchase).unwrap()["revenue"], json!(547.8));
    assert_eq!(purchase.metadata["subtotal"], json!(498.0));
    assert_eq!(purchase.metadata["tax"], json!(49.8));

    assert!(open(&collector, &state).cart().is_empty());
}

#[tokio::test]
async fn test_returning_user_after_logout() {
    let collector = MockCollector::start().await;
    let state = temp_state_path();
    let email = Email::parse("li@example.com").unwrap();

    let first = open(&collector, &state)
        .submit_login(&email, None, LoginMode::Signup)
        .await;

    let mut shop = open(&collector, &state);
    shop.add_to_cart(ProductId::new(3)).await.unwrap();
    shop.logout();

    let reopened = open(&collector, &state);
    assert_eq!(reopened.current_user(), None);
    assert!(reopened.cart().is_empty());

    let again = reopened.submit_login(&email, None, LoginMode::Login).await;
    assert!(again.resolution.returning);
    assert_eq!(again.resolution.user.user_id, first.resolution.user.user_id);
    assert_eq!(again.resolution.user.name, "li");

    let events = collector.wait_for(3).await;
    assert_eq!(events.last().unwrap().event_type, EventType::UserLogin);
}

#[tokio::test]
async fn test_ad_click_journey_is_attributed() {
    let collector = MockCollector::start().await;
    let state = temp_state_path();

    let shop = open(&collector, &state);
    shop.view_dashboard().await;
    shop.click_ad("premium_upgrade").await;
    shop.view_product(ProductId::new(3)).await.unwrap();

    let events = collector.wait_for(4).await;
    assert_eq!(events.len(), 4);
    assert_eq!(events[1].event_type, EventType::from("ad_click"));
    assert_eq!(events[1].utm_source, "direct");

    let landing = &events[2];
    assert_eq!(landing.page_url, "/products");
    assert_eq!(landing.utm_campaign, "premium_upgrade");
    assert_eq!(landing.metadata["landing"], json!(true));

    let product_view = &events[3];
    assert_eq!(product_view.utm_source, "dashboard");
    assert_eq!(product_view.metadata["product_name"], json!("Customer Insights"));
}

#[tokio::test]
async fn test_session_survives_reopen() {
    let collector = MockCollector::start().await;
    let state = temp_state_path();

    let first = open(&collector, &state).tracker().session_id();
    let second = open(&collector, &state).tracker().session_id();
    assert_eq!(first, second);
}
