//! Event type tags.
//!
//! The storefront emits a fixed vocabulary, but the wire format is an open
//! string so callers can send anything the backend accepts.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Tag identifying what happened.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    PageView,
    ProductView,
    AddToCart,
    CheckoutStart,
    PaymentInfoEntered,
    Purchase,
    UserLogin,
    UserSignup,
    /// Any tag outside the storefront vocabulary.
    Other(String),
}

impl EventType {
    /// Wire name, e.g. `"page_view"`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::PageView => "page_view",
            Self::ProductView => "product_view",
            Self::AddToCart => "add_to_cart",
            Self::CheckoutStart => "checkout_start",
            Self::PaymentInfoEntered => "payment_info_entered",
            Self::Purchase => "purchase",
            Self::UserLogin => "user_login",
            Self::UserSignup => "user_signup",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for EventType {
    fn from(tag: &str) -> Self {
        match tag {
            "page_view" => Self::PageView,
            "product_view" => Self::ProductView,
            "add_to_cart" => Self::AddToCart,
            "checkout_start" => Self::CheckoutStart,
            "payment_info_entered" => Self::PaymentInfoEntered,
            "purchase" => Self::Purchase,
            "user_login" => Self::UserLogin,
            "user_signup" => Self::UserSignup,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for EventType {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        match event_type {
            EventType::Other(tag) => tag,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
