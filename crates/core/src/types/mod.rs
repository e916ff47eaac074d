//! Core types for the Aixel Store.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod device;
pub mod email;
pub mod event_type;
pub mod id;
pub mod price;

pub use device::Device;
pub use email::{Email, EmailError};
pub use event_type::EventType;
pub use id::*;
pub use price::{CurrencyCode, Price};
