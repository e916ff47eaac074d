//! Time-windowed suppression of duplicate events.
//!
//! A page that renders twice fires its page view twice; the second one is
//! dropped if an event with the same signature was admitted less than one
//! window ago. This is a best-effort local guard: it does not cover network
//! retries or other processes sharing the same storage.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::time::Instant;

use aixel_core::{EventType, UserId};

/// Signature two events must share to count as duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey(String);

impl DedupKey {
    /// Build the key from the event tag, route path, attributed user
    /// (`anon` when none) and the caller's own metadata.
    #[must_use]
    pub fn new(
        event_type: &EventType,
        page_path: &str,
        user_id: Option<&UserId>,
        metadata: &Map<String, Value>,
    ) -> Self {
        let user = user_id.map_or("anon", UserId::as_str);
        // serde_json maps are key-ordered, so equal metadata serializes equally
        let metadata = Value::Object(metadata.clone());
        Self(format!("{event_type}_{page_path}_{user}_{metadata}"))
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Remembers when each event signature was last admitted.
#[derive(Debug)]
pub struct Deduplicator {
    window: Duration,
    state: Mutex<DedupState>,
}

#[derive(Debug, Default)]
struct DedupState {
    last_sent: HashMap<DedupKey, Instant>,
    /// Admissions in time order; may hold superseded entries for a key.
    expiry: VecDeque<(Instant, DedupKey)>,
}

impl Deduplicator {
    /// Create a deduplicator with the given window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: Mutex::new(DedupState::default()),
        }
    }

    /// Decide whether an event with `key` should be sent now.
    ///
    /// Returns `false` if the same key was admitted strictly less than one
    /// window ago. Otherwise records the key and returns `true`.
    pub fn admit(&self, key: &DedupKey) -> bool {
        self.admit_at(key, Instant::now())
    }

    fn admit_at(&self, key: &DedupKey, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.prune(now, self.window);

        if let Some(last) = state.last_sent.get(key)
            && now.saturating_duration_since(*last) < self.window
        {
            return false;
        }

        state.last_sent.insert(key.clone(), now);
        state.expiry.push_back((now, key.clone()));
        true
    }

    /// Number of signatures currently remembered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_sent
            .len()
    }

    /// Whether no signatures are remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DedupState {
    /// Drop admissions at least one window old.
    ///
    /// Each admission is queued once and popped once, so pruning is
    /// amortized constant time per call.
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some((admitted_at, _)) = self.expiry.front() {
            if now.saturating_duration_since(*admitted_at) < window {
                break;
            }
            let Some((admitted_at, key)) = self.expiry.pop_front() else {
                break;
            };
            // A later admission of the same key owns the map entry
            if self.last_sent.get(&key) == Some(&admitted_at) {
                self.last_sent.remove(&key);
            }
        }
    }
}
