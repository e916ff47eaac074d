//! Aixel Tracker - event-tracking client for the Aixel Store demo storefront.
//!
//! Records shopper behaviour (page views, product views, cart actions,
//! checkout, purchase, login/signup) and POSTs it to the Aixel ingestion
//! backend at `{API_BASE}/api/track`.
//!
//! # Architecture
//!
//! - [`storage`]: browser-style key-value persistence (memory or JSON file)
//! - [`identity`]: session id, logged-in user, email to user id resolution
//! - [`context`]: current route, UTM attribution and device class
//! - [`event`]: the canonical event record and its normalization
//! - [`dedup`]: time-windowed duplicate suppression
//! - [`transport`]: delivery to the collector
//! - [`tracker`]: the facade tying the above together
//! - [`storefront`]: instrumented shopper journeys over [`cart`] and [`catalog`]
//!
//! Tracking never fails the caller. Delivery errors are logged, captured to
//! Sentry, and surface only as [`TrackOutcome::Failed`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod context;
pub mod dedup;
pub mod error;
pub mod event;
pub mod identity;
pub mod storage;
pub mod storefront;
pub mod tracker;
pub mod transport;

pub use config::{ConfigError, TrackerConfig};
pub use event::{Event, TrackOptions};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use storefront::{LoginMode, Storefront, StorefrontError};
pub use tracker::{TrackHandle, TrackOutcome, Tracker};
pub use transport::{HttpTransport, Transport, TransportError};
