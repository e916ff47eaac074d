//! Aixel Core - Shared domain types.
//!
//! This crate provides the types shared by the Aixel Store components:
//! - `tracker` - Event-tracking client library (identity, dedup, transport)
//! - `cli` - Command-line storefront that drives the tracking client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no HTTP
//! clients. Identifier generation is the one place it touches randomness.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, prices, devices and event types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
