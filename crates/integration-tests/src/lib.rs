//! Integration tests for the Aixel tracker.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p aixel-integration-tests
//! ```
//!
//! No external services are needed: each test starts a [`MockCollector`],
//! an in-process `axum` server on `127.0.0.1:0` that stands in for the
//! ingestion backend's `POST /api/track`.
//!
//! # Test Categories
//!
//! - `tracking` - delivery, dedup and failure handling over real HTTP
//! - `storefront_journey` - full shopper journeys with file-backed state

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use uuid::Uuid;

use aixel_tracker::{Event, TrackerConfig};

/// How the collector answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Behavior {
    /// `200 {"ok": true, "id": "<uuid>"}`
    #[default]
    Accept,
    /// `422 {"ok": false, "error": "..."}`
    RejectWithJson,
    /// `500 Internal Server Error` with a plain-text body.
    ServerErrorText,
}

#[derive(Clone)]
struct CollectorState {
    behavior: Behavior,
    events: Arc<Mutex<Vec<Event>>>,
}

/// In-process stand-in for the ingestion backend.
pub struct MockCollector {
    addr: SocketAddr,
    events: Arc<Mutex<Vec<Event>>>,
    server: JoinHandle<()>,
}

impl MockCollector {
    /// Start a collector that accepts every event.
    pub async fn start() -> Self {
        Self::start_with(Behavior::Accept).await
    }

    /// Start a collector with the given behavior.
    pub async fn start_with(behavior: Behavior) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let state = CollectorState {
            behavior,
            events: Arc::clone(&events),
        };

        let app = Router::new()
            .route("/api/track", post(track))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock collector");
        let addr = listener.local_addr().expect("Mock collector has no address");

        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock collector failed");
        });

        Self {
            addr,
            events,
            server,
        }
    }

    /// Base URL to use as `AIXEL_API_BASE`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Tracker configuration pointed at this collector.
    #[must_use]
    pub fn config(&self) -> TrackerConfig {
        TrackerConfig::default()
            .with_api_base(&self.base_url())
            .expect("Mock collector URL is valid")
    }

    /// Events received so far, in arrival order.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wait until at least `count` events have arrived (up to five seconds).
    pub async fn wait_for(&self, count: usize) -> Vec<Event> {
        for _ in 0..100 {
            let events = self.events();
            if events.len() >= count {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.events()
    }
}

impl Drop for MockCollector {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn track(State(state): State<CollectorState>, Json(event): Json<Event>) -> Response {
    state
        .events
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(event);

    match state.behavior {
        Behavior::Accept => Json(json!({"ok": true, "id": Uuid::new_v4()})).into_response(),
        Behavior::RejectWithJson => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"ok": false, "error": "event rejected"})),
        )
            .into_response(),
        Behavior::ServerErrorText => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// Base URL of a local port with nothing listening on it.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind scratch listener");
    let addr = listener.local_addr().expect("Scratch listener has no address");
    drop(listener);
    format!("http://{addr}")
}

/// Fresh state-file path under the system temp directory.
#[must_use]
pub fn temp_state_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("aixel-it-{}", Uuid::new_v4()))
        .join("state.json")
}
