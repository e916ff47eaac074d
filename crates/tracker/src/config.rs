//! Tracking client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `AIXEL_API_BASE` - Ingestion backend base URL (default: `http://localhost:8000`)
//! - `AIXEL_SITE_URL` - Origin the storefront pages live under (default: `http://localhost:5173`)
//! - `AIXEL_STATE_PATH` - Persisted client state file (default: `.aixel/state.json`)
//! - `AIXEL_USER_AGENT` - User agent reported for device classification
//! - `AIXEL_DEDUP_WINDOW_MS` - Duplicate suppression window (default: 2000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default backend base URL.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Default storefront origin.
pub const DEFAULT_SITE_URL: &str = "http://localhost:5173";

/// Default persisted state location.
pub const DEFAULT_STATE_PATH: &str = ".aixel/state.json";

/// Default dedup window in milliseconds.
pub const DEFAULT_DEDUP_WINDOW_MS: u64 = 2000;

/// User agent reported when none is configured.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) aixel-cli";

/// Path of the ingestion endpoint, relative to the API base.
pub const TRACK_PATH: &str = "/api/track";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Tracking client configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Backend base URL; events go to `{api_base}/api/track`
    pub api_base: Url,
    /// Origin the logical page routes are resolved against
    pub site_url: Url,
    /// Where the key-value client state is persisted
    pub state_path: PathBuf,
    /// User agent used for device classification
    pub user_agent: String,
    /// Identical events closer together than this are dropped
    pub dedup_window: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_base: default_url(DEFAULT_API_BASE),
            site_url: default_url(DEFAULT_SITE_URL),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            dedup_window: Duration::from_millis(DEFAULT_DEDUP_WINDOW_MS),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl TrackerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base = parse_url(
            "AIXEL_API_BASE",
            &get_env_or_default("AIXEL_API_BASE", DEFAULT_API_BASE),
        )?;
        let site_url = parse_url(
            "AIXEL_SITE_URL",
            &get_env_or_default("AIXEL_SITE_URL", DEFAULT_SITE_URL),
        )?;
        let state_path =
            PathBuf::from(get_env_or_default("AIXEL_STATE_PATH", DEFAULT_STATE_PATH));
        let user_agent = get_env_or_default("AIXEL_USER_AGENT", DEFAULT_USER_AGENT);
        let dedup_window_ms = get_env_or_default(
            "AIXEL_DEDUP_WINDOW_MS",
            &DEFAULT_DEDUP_WINDOW_MS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("AIXEL_DEDUP_WINDOW_MS".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_base,
            site_url,
            state_path,
            user_agent,
            dedup_window: Duration::from_millis(dedup_window_ms),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Replace the backend base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_base` is not an absolute URL.
    pub fn with_api_base(mut self, api_base: &str) -> Result<Self, ConfigError> {
        self.api_base = parse_url("api_base", api_base)?;
        Ok(self)
    }

    /// Full URL of the ingestion endpoint.
    #[must_use]
    pub fn track_url(&self) -> String {
        format!("{}{TRACK_PATH}", self.api_base.as_str().trim_end_matches('/'))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("'{value}' is not a base URL"),
        ));
    }
    Ok(url)
}

/// Parse one of the `DEFAULT_*` URL constants, which are valid absolute URLs.
#[allow(clippy::expect_used)]
fn default_url(value: &str) -> Url {
    Url::parse(value).expect("built-in default URL is valid")
}
