//! Client device classification.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Coarse device class reported with every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Mobile,
    #[default]
    Desktop,
}

impl Device {
    /// Case-insensitive user-agent fragments that mark a mobile client.
    const MOBILE_MARKERS: [&'static str; 3] = ["mobile", "android", "iphone"];

    /// Classify a user-agent string.
    ///
    /// ```
    /// use aixel_core::Device;
    ///
    /// let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
    /// assert_eq!(Device::from_user_agent(ua), Device::Mobile);
    /// assert_eq!(Device::from_user_agent("Mozilla/5.0 (Windows NT 10.0)"), Device::Desktop);
    /// ```
    #[must_use]
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if Self::MOBILE_MARKERS.iter().any(|marker| ua.contains(marker)) {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }

    /// Wire name (`"mobile"` / `"desktop"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_markers_any_case() {
        assert_eq!(
            Device::from_user_agent("Mozilla/5.0 (Linux; ANDROID 14; Pixel 8)"),
            Device::Mobile
        );
        assert_eq!(
            Device::from_user_agent("Mozilla/5.0 (iPad) Mobile/15E148"),
            Device::Mobile
        );
        assert_eq!(Device::from_user_agent("some iphone app"), Device::Mobile);
    }

    #[test]
    fn test_desktop_default() {
        assert_eq!(
            Device::from_user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64)"),
            Device::Desktop
        );
        assert_eq!(Device::from_user_agent(""), Device::Desktop);
    }
}
