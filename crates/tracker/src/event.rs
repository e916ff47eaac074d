//! Canonical event records and their normalization from call-site input.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use aixel_core::{Device, EventType, SessionId, UserId};

use crate::context::PageContext;
use crate::identity::User;

/// Platform tag carried by every event from this client.
pub const PLATFORM: &str = "web";

/// One behavioural event, exactly as POSTed to the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    pub session_id: SessionId,
    pub user_id: Option<UserId>,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    pub page_url: String,
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
    pub platform: String,
    pub device: Device,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    pub metadata: Map<String, Value>,
}

/// Optional per-call inputs to [`Event::normalize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackOptions {
    /// Overrides the logged-in user's id.
    pub user_id: Option<UserId>,
    /// Revenue attributed to the event; zero when absent.
    pub revenue: Option<Decimal>,
    /// Caller fields, merged over the user base fields.
    pub metadata: Map<String, Value>,
}

impl TrackOptions {
    /// Empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute the event to `user_id` when present.
    #[must_use]
    pub fn user(mut self, user_id: Option<&UserId>) -> Self {
        self.user_id = user_id.cloned();
        self
    }

    /// Attach revenue.
    #[must_use]
    pub const fn revenue(mut self, revenue: Decimal) -> Self {
        self.revenue = Some(revenue);
        self
    }

    /// Attach caller metadata.
    ///
    /// Only JSON objects carry fields; any other value is ignored.
    #[must_use]
    pub fn metadata(mut self, metadata: Value) -> Self {
        match metadata {
            Value::Object(fields) => self.metadata = fields,
            other => tracing::debug!(metadata = %other, "Ignoring non-object event metadata"),
        }
        self
    }

    /// The user id the event will be attributed to.
    #[must_use]
    pub fn resolve_user_id(&self, current: Option<&User>) -> Option<UserId> {
        self.user_id
            .clone()
            .or_else(|| current.map(|user| user.user_id.clone()))
    }
}

/// Client state an event is stamped with.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub session_id: SessionId,
    pub user: Option<&'a User>,
    pub page: &'a PageContext,
    pub now: DateTime<Utc>,
}

impl Event {
    /// Build the canonical record for `event_type`.
    ///
    /// Never fails; every absent optional input falls back to its default.
    #[must_use]
    pub fn normalize(event_type: EventType, options: TrackOptions, snapshot: &Snapshot<'_>) -> Self {
        let user_id = options.resolve_user_id(snapshot.user);
        let utm = snapshot.page.utm();

        let mut metadata = Map::new();
        metadata.insert(
            "user_email".to_string(),
            snapshot
                .user
                .map_or(Value::Null, |u| Value::String(u.email.to_string())),
        );
        metadata.insert(
            "user_name".to_string(),
            snapshot
                .user
                .map_or(Value::Null, |u| Value::String(u.name.clone())),
        );
        metadata.extend(options.metadata);

        Self {
            event_type,
            session_id: snapshot.session_id,
            user_id,
            timestamp: snapshot.now,
            page_url: snapshot.page.path().to_string(),
            utm_source: utm.source,
            utm_medium: utm.medium,
            utm_campaign: utm.campaign,
            platform: PLATFORM.to_string(),
            device: snapshot.page.device(),
            revenue: options.revenue.unwrap_or(Decimal::ZERO),
            metadata,
        }
    }
}

/// RFC 3339 UTC timestamps with millisecond precision (`2024-05-01T10:00:00.000Z`).
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;
    use url::Url;

    use aixel_core::Email;

    use super::*;

    fn page(route: &str, user_agent: &str) -> PageContext {
        let mut page = PageContext::new(Url::parse("http://localhost:5173").unwrap(), user_agent);
        page.navigate(route);
        page
    }

    fn shopper() -> User {
        User {
            email: Email::parse("jane@example.com").unwrap(),
            name: "Jane".to_string(),
            user_id: UserId::new("user_jane00001"),
        }
    }

    fn at_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_anonymous_defaults() {
        let page = page("/products", "Mozilla/5.0 (Windows NT 10.0)");
        let session_id = SessionId::generate();
        let event = Event::normalize(
            EventType::PageView,
            TrackOptions::new(),
            &Snapshot {
                session_id,
                user: None,
                page: &page,
                now: at_noon(),
            },
        );

        assert_eq!(event.session_id, session_id);
        assert_eq!(event.user_id, None);
        assert_eq!(event.page_url, "/products");
        assert_eq!(event.utm_source, "direct");
        assert_eq!(event.utm_medium, "none");
        assert_eq!(event.utm_campaign, "none");
        assert_eq!(event.platform, "web");
        assert_eq!(event.device, Device::Desktop);
        assert_eq!(event.revenue, Decimal::ZERO);
        assert_eq!(
            Value::Object(event.metadata),
            json!({"user_email": null, "user_name": null})
        );
    }

    #[test]
    fn test_caller_metadata_wins_on_collision() {
        let page = page("/login", "Mozilla/5.0 (Windows NT 10.0)");
        let user = shopper();
        let event = Event::normalize(
            EventType::UserLogin,
            TrackOptions::new().metadata(json!({"user_name": "override", "method": "email"})),
            &Snapshot {
                session_id: SessionId::generate(),
                user: Some(&user),
                page: &page,
                now: at_noon(),
            },
        );

        assert_eq!(event.user_id, Some(user.user_id.clone()));
        assert_eq!(
            Value::Object(event.metadata),
            json!({"user_email": "jane@example.com", "user_name": "override", "method": "email"})
        );
    }

    #[test]
    fn test_explicit_user_id_overrides_current_user() {
        let user = shopper();
        let options = TrackOptions::new().user(Some(&UserId::new("user_other0001")));
        assert_eq!(
            options.resolve_user_id(Some(&user)),
            Some(UserId::new("user_other0001"))
        );
        assert_eq!(TrackOptions::new().resolve_user_id(Some(&user)), Some(user.user_id));
        assert_eq!(TrackOptions::new().resolve_user_id(None), None);
    }

    #[test]
    fn test_non_object_metadata_is_ignored() {
        let options = TrackOptions::new().metadata(json!(["not", "an", "object"]));
        assert!(options.metadata.is_empty());
    }

    #[test]
    fn test_wire_format() {
        let page = page(
            "/checkout?utm_source=newsletter&utm_medium=email",
            "Mozilla/5.0 (Linux; Android 14)",
        );
        let session_id = SessionId::parse("0f8fad5b-d9cb-469f-a165-70867728950e").unwrap();
        let event = Event::normalize(
            EventType::Purchase,
            TrackOptions::new()
                .revenue(Decimal::new(54780, 2))
                .metadata(json!({"subtotal": 498.0})),
            &Snapshot {
                session_id,
                user: None,
                page: &page,
                now: at_noon(),
            },
        );

        let wire = serde_json::to_value(&event).unwrap();
        assert_eq!(
            wire,
            json!({
                "event_type": "purchase",
                "session_id": "0f8fad5b-d9cb-469f-a165-70867728950e",
                "user_id": null,
                "timestamp": "2024-05-01T12:00:00.000Z",
                "page_url": "/checkout",
                "utm_source": "newsletter",
                "utm_medium": "email",
                "utm_campaign": "none",
                "platform": "web",
                "device": "mobile",
                "revenue": 547.8,
                "metadata": {"user_email": null, "user_name": null, "subtotal": 498.0}
            })
        );

        let parsed: Event = serde_json::from_value(wire).unwrap();
        assert_eq!(parsed, event);
    }
}
