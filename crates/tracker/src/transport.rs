//! Delivery of events to the ingestion backend.
//!
//! The wire contract is a single `POST {API_BASE}/api/track` with the event
//! as a JSON body. The response is backend-defined; all this client needs is
//! that it parses as JSON.

use std::future::Future;

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::TrackerConfig;
use crate::event::Event;

/// Errors that can occur while delivering an event.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, reset, DNS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The collector answered with something that is not JSON.
    #[error("invalid JSON response (HTTP {status}): {source}")]
    InvalidResponse {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// Delivery failed in a non-HTTP transport.
    #[error("transport error: {0}")]
    Other(String),
}

/// Sends one event and returns the collector's parsed response.
pub trait Transport: Send + Sync + 'static {
    /// Deliver `event`.
    fn send(&self, event: &Event) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// [`Transport`] that POSTs JSON over HTTP with `reqwest`.
///
/// No client-side timeout is configured and nothing is retried.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Create a transport targeting `{api_base}/api/track`.
    #[must_use]
    pub fn new(config: &TrackerConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config.track_url())
    }

    /// Create a transport from an existing client and full endpoint URL.
    #[must_use]
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl Transport for HttpTransport {
    #[instrument(skip_all, fields(event_type = %event.event_type, endpoint = %self.endpoint))]
    async fn send(&self, event: &Event) -> Result<Value, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(event)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // The body is still handed back when it parses; the collector's
        // error payloads are JSON too.
        if !status.is_success() {
            warn!(
                status = %status,
                body = %body.chars().take(200).collect::<String>(),
                "Collector returned non-success status"
            );
        }

        let parsed = serde_json::from_str(&body).map_err(|source| {
            TransportError::InvalidResponse {
                status: status.as_u16(),
                source,
            }
        })?;
        debug!(status = %status, "Collector accepted event");
        Ok(parsed)
    }
}
