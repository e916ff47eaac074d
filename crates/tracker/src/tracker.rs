//! The tracking client: identity, normalization, dedup and delivery.
//!
//! # Example
//!
//! ```rust,ignore
//! let tracker = Tracker::with_http(&config, store);
//! tracker.navigate("/products?utm_source=google");
//!
//! // Fire and forget; the page carries on immediately
//! tracker.track_in_background(EventType::PageView, TrackOptions::new().metadata(json!({
//!     "page": "products",
//! })));
//!
//! // Or wait for the collector's answer
//! let outcome = tracker.track("newsletter_signup", TrackOptions::new()).await;
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use aixel_core::{EventType, SessionId};

use crate::config::TrackerConfig;
use crate::context::PageContext;
use crate::dedup::{DedupKey, Deduplicator};
use crate::error::{add_breadcrumb, report_error};
use crate::event::{Event, Snapshot, TrackOptions};
use crate::identity;
use crate::storage::KeyValueStore;
use crate::transport::{HttpTransport, Transport};

/// What happened to one tracking call.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    /// Dropped as a duplicate; nothing was sent.
    Skipped,
    /// Sent; the collector's parsed response.
    Delivered(Value),
    /// Sent but failed; the error has already been reported.
    Failed,
}

impl TrackOutcome {
    /// The collector's response, or `None` when skipped or failed.
    #[must_use]
    pub fn into_response(self) -> Option<Value> {
        match self {
            Self::Delivered(response) => Some(response),
            Self::Skipped | Self::Failed => None,
        }
    }

    /// Whether a transport attempt was made.
    #[must_use]
    pub const fn attempted(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

/// Completion handle for [`Tracker::track_in_background`].
///
/// Dropping the handle detaches the send; it still runs to completion.
#[derive(Debug)]
pub struct TrackHandle {
    task: Option<JoinHandle<TrackOutcome>>,
}

impl TrackHandle {
    const fn skipped() -> Self {
        Self { task: None }
    }

    /// Whether the event was dropped as a duplicate.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        self.task.is_none()
    }

    /// Wait for the send to finish.
    pub async fn outcome(self) -> TrackOutcome {
        let Some(task) = self.task else {
            return TrackOutcome::Skipped;
        };
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                report_error(&e, "Tracking task did not complete");
                TrackOutcome::Failed
            }
        }
    }
}

/// Event-tracking client.
///
/// Cheap to clone; clones share the dedup cache, page context, storage and
/// transport.
pub struct Tracker<T = HttpTransport> {
    inner: Arc<TrackerInner<T>>,
}

struct TrackerInner<T> {
    store: Arc<dyn KeyValueStore>,
    transport: T,
    dedup: Deduplicator,
    page: RwLock<PageContext>,
}

impl<T> Clone for Tracker<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Tracker<HttpTransport> {
    /// Create a tracker that POSTs to the configured backend.
    #[must_use]
    pub fn with_http(config: &TrackerConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(config, store, HttpTransport::new(config))
    }
}

impl<T: Transport> Tracker<T> {
    /// Create a tracker over an arbitrary transport.
    #[must_use]
    pub fn new(config: &TrackerConfig, store: Arc<dyn KeyValueStore>, transport: T) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                store,
                transport,
                dedup: Deduplicator::new(config.dedup_window),
                page: RwLock::new(PageContext::new(
                    config.site_url.clone(),
                    config.user_agent.clone(),
                )),
            }),
        }
    }

    /// Client state storage.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.inner.store
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// The persisted session id (created on first use).
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        identity::session_id(&*self.inner.store)
    }

    /// Move the page context to `target` (e.g. `/products?utm_source=ads`).
    pub fn navigate(&self, target: &str) {
        self.inner
            .page
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .navigate(target);
    }

    /// Snapshot of the current page context.
    #[must_use]
    pub fn page(&self) -> PageContext {
        self.inner
            .page
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Dedup-check and normalize an event.
    ///
    /// Returns `None` when the event duplicates one admitted less than a
    /// window ago.
    pub fn prepare(&self, event_type: impl Into<EventType>, options: TrackOptions) -> Option<Event> {
        let event_type = event_type.into();
        let store = &*self.inner.store;
        let user = identity::current_user(store);
        let page = self.inner.page.read().unwrap_or_else(PoisonError::into_inner);

        let key = DedupKey::new(
            &event_type,
            page.path(),
            options.resolve_user_id(user.as_ref()).as_ref(),
            &options.metadata,
        );
        if !self.inner.dedup.admit(&key) {
            debug!(event_type = %event_type, page_url = page.path(), "Skipping duplicate event");
            return None;
        }

        let event = Event::normalize(
            event_type,
            options,
            &Snapshot {
                session_id: identity::session_id(store),
                user: user.as_ref(),
                page: &page,
                now: Utc::now(),
            },
        );
        add_breadcrumb(
            "tracking",
            event.event_type.as_str(),
            Some(&[("page_url", event.page_url.as_str())]),
        );
        Some(event)
    }

    /// Deliver a prepared event.
    ///
    /// Returns the collector's response, or `None` after reporting the
    /// failure. Never panics or propagates an error.
    pub async fn send(&self, event: &Event) -> Option<Value> {
        match self.inner.transport.send(event).await {
            Ok(response) => {
                info!(
                    event_type = %event.event_type,
                    session_id = %event.session_id,
                    response = %response,
                    "Tracked"
                );
                Some(response)
            }
            Err(e) => {
                report_error(&e, "Tracking error");
                None
            }
        }
    }

    /// Track an event and wait for delivery.
    pub async fn track(&self, event_type: impl Into<EventType>, options: TrackOptions) -> TrackOutcome {
        match self.prepare(event_type, options) {
            Some(event) => self.deliver(event).await,
            None => TrackOutcome::Skipped,
        }
    }

    /// Track an event without waiting for delivery.
    ///
    /// Dedup and normalization happen before this returns, so the event
    /// reflects the page and user at call time. The send runs on the Tokio
    /// runtime; the returned handle may be awaited or dropped.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn track_in_background(
        &self,
        event_type: impl Into<EventType>,
        options: TrackOptions,
    ) -> TrackHandle {
        let Some(event) = self.prepare(event_type, options) else {
            return TrackHandle::skipped();
        };

        let tracker = self.clone();
        TrackHandle {
            task: Some(tokio::spawn(async move { tracker.deliver(event).await })),
        }
    }

    async fn deliver(&self, event: Event) -> TrackOutcome {
        self.send(&event)
            .await
            .map_or(TrackOutcome::Failed, TrackOutcome::Delivered)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use serde_json::json;

    use aixel_core::{Email, UserId};

    use super::*;
    use crate::identity::User;
    use crate::storage::MemoryStore;
    use crate::transport::TransportError;

    /// Transport that records every event and can be told to fail.
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub(crate) sent: Mutex<Vec<Event>>,
        pub(crate) failing: AtomicBool,
    }

    impl RecordingTransport {
        pub(crate) fn events(&self) -> Vec<Event> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Transport for RecordingTransport {
        async fn send(&self, event: &Event) -> Result<Value, TransportError> {
            self.sent.lock().unwrap().push(event.clone());
            if self.failing.load(Ordering::SeqCst) {
                return Err(TransportError::Other("connection refused".to_string()));
            }
            Ok(json!({"ok": true, "id": self.sent.lock().unwrap().len()}))
        }
    }

    pub(crate) fn recording_tracker() -> Tracker<RecordingTransport> {
        Tracker::new(
            &TrackerConfig::default(),
            Arc::new(MemoryStore::new()),
            RecordingTransport::default(),
        )
    }

    #[tokio::test]
    async fn test_track_delivers_normalized_event() {
        let tracker = recording_tracker();
        tracker.navigate("/products");

        let outcome = tracker
            .track(EventType::PageView, TrackOptions::new().metadata(json!({"page": "products"})))
            .await;
        assert_eq!(outcome, TrackOutcome::Delivered(json!({"ok": true, "id": 1})));

        let events = tracker.transport().events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].page_url, "/products");
        assert_eq!(events[0].session_id, tracker.session_id());
        assert_eq!(events[0].metadata.get("page"), Some(&json!("products")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_within_window_sends_once() {
        let tracker = recording_tracker();
        tracker.navigate("/cart");
        let options = || TrackOptions::new().metadata(json!({"page": "cart"}));

        assert!(tracker.track(EventType::PageView, options()).await.attempted());
        tokio::time::advance(Duration::from_millis(1000)).await;
        assert_eq!(tracker.track(EventType::PageView, options()).await, TrackOutcome::Skipped);
        assert_eq!(tracker.transport().events().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_after_window_sends_twice() {
        let tracker = recording_tracker();
        tracker.navigate("/cart");
        let options = || TrackOptions::new().metadata(json!({"page": "cart"}));

        assert!(tracker.track(EventType::PageView, options()).await.attempted());
        tokio::time::advance(Duration::from_millis(2100)).await;
        assert!(tracker.track(EventType::PageView, options()).await.attempted());
        assert_eq!(tracker.transport().events().len(), 2);
    }

    #[tokio::test]
    async fn test_same_event_on_other_page_is_not_a_duplicate() {
        let tracker = recording_tracker();
        tracker.navigate("/products");
        assert!(tracker.track(EventType::PageView, TrackOptions::new()).await.attempted());
        tracker.navigate("/cart");
        assert!(tracker.track(EventType::PageView, TrackOptions::new()).await.attempted());
    }

    #[tokio::test]
    async fn test_login_changes_dedup_signature() {
        let tracker = recording_tracker();
        assert!(tracker.track(EventType::PageView, TrackOptions::new()).await.attempted());

        identity::set_current_user(
            &**tracker.store(),
            &User {
                email: Email::parse("kim@example.com").unwrap(),
                name: "Kim".to_string(),
                user_id: UserId::new("user_kim000001"),
            },
        );
        assert!(tracker.track(EventType::PageView, TrackOptions::new()).await.attempted());

        let events = tracker.transport().events();
        assert_eq!(events[0].user_id, None);
        assert_eq!(events[1].user_id, Some(UserId::new("user_kim000001")));
        assert_eq!(events[1].metadata.get("user_email"), Some(&json!("kim@example.com")));
    }

    #[tokio::test]
    async fn test_transport_failure_yields_none() {
        let tracker = recording_tracker();
        tracker.transport().failing.store(true, Ordering::SeqCst);

        let event = tracker.prepare("purchase", TrackOptions::new()).unwrap();
        assert_eq!(tracker.send(&event).await, None);

        let outcome = tracker.track("checkout_start", TrackOptions::new()).await;
        assert_eq!(outcome, TrackOutcome::Failed);
        assert_eq!(outcome.into_response(), None);
    }

    #[tokio::test]
    async fn test_background_track_reports_outcome() {
        let tracker = recording_tracker();
        let handle = tracker.track_in_background(EventType::AddToCart, TrackOptions::new());
        assert!(!handle.is_skipped());

        let duplicate = tracker.track_in_background(EventType::AddToCart, TrackOptions::new());
        assert!(duplicate.is_skipped());
        assert_eq!(duplicate.outcome().await, TrackOutcome::Skipped);

        assert!(matches!(handle.outcome().await, TrackOutcome::Delivered(_)));
        assert_eq!(tracker.transport().events().len(), 1);
    }

    #[tokio::test]
    async fn test_background_track_survives_dropped_handle() {
        let tracker = recording_tracker();
        drop(tracker.track_in_background("newsletter_signup", TrackOptions::new()));

        for _ in 0..100 {
            if !tracker.transport().events().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(tracker.transport().events().len(), 1);
    }
}
