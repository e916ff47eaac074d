//! Where the shopper currently is: page location and client user agent.
//!
//! The router layer moves the context with [`PageContext::navigate`]; the
//! event normalizer reads the route path, UTM attribution and device class
//! from it.

use url::Url;

use aixel_core::Device;

/// `utm_source` value when the location carries none.
pub const DEFAULT_UTM_SOURCE: &str = "direct";

/// `utm_medium` / `utm_campaign` value when the location carries none.
pub const DEFAULT_UTM_OTHER: &str = "none";

/// Campaign attribution read from the location's query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utm {
    pub source: String,
    pub medium: String,
    pub campaign: String,
}

/// Current location and user agent of the client.
#[derive(Debug, Clone)]
pub struct PageContext {
    site: Url,
    location: Url,
    user_agent: String,
}

impl PageContext {
    /// Start at the root route of `site`.
    #[must_use]
    pub fn new(site: Url, user_agent: impl Into<String>) -> Self {
        let location = site.join("/").unwrap_or_else(|_| site.clone());
        Self {
            site,
            location,
            user_agent: user_agent.into(),
        }
    }

    /// Move to `target`, a route like `/products?utm_source=google`.
    ///
    /// Relative targets resolve against the site origin, not the current
    /// page. An unparseable target leaves the location unchanged.
    pub fn navigate(&mut self, target: &str) {
        match self.site.join(target) {
            Ok(location) => self.location = location,
            Err(e) => {
                tracing::warn!(route = target, error = %e, "Ignoring navigation to invalid route");
            }
        }
    }

    /// Logical route path, without query string or fragment.
    #[must_use]
    pub fn path(&self) -> &str {
        self.location.path()
    }

    /// First non-empty value of query parameter `name`.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.location
            .query_pairs()
            .find(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.into_owned())
    }

    /// UTM attribution with `direct` / `none` defaults.
    #[must_use]
    pub fn utm(&self) -> Utm {
        Utm {
            source: self
                .query_param("utm_source")
                .unwrap_or_else(|| DEFAULT_UTM_SOURCE.to_string()),
            medium: self
                .query_param("utm_medium")
                .unwrap_or_else(|| DEFAULT_UTM_OTHER.to_string()),
            campaign: self
                .query_param("utm_campaign")
                .unwrap_or_else(|| DEFAULT_UTM_OTHER.to_string()),
        }
    }

    /// Whether the visitor arrived through a tagged campaign link.
    #[must_use]
    pub fn is_campaign_landing(&self) -> bool {
        self.location.query_pairs().any(|(key, _)| key == "utm_source")
    }

    /// Device class derived from the user agent.
    #[must_use]
    pub fn device(&self) -> Device {
        Device::from_user_agent(&self.user_agent)
    }
}
