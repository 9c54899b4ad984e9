use reqwest::{Client, StatusCode};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::DispatchError;
use crate::config::SinkConfig;
use crate::gesture::{Gesture, GestureEvent};

/// HTTP endpoint set that receives classified gestures
///
/// One empty-bodied POST per event to `base_url + endpoint(gesture)`. The
/// request is bounded by the client timeout and never retried.
#[derive(Clone, Debug)]
pub struct EventSink {
    client: Client,
    base_url: String,
    endpoints: BTreeMap<String, String>,
}

impl EventSink {
    pub fn new(
        base_url: impl Into<String>,
        endpoints: BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            endpoints,
        })
    }

    pub fn from_config(config: &SinkConfig, timeout: Duration) -> Result<Self, DispatchError> {
        Self::new(config.base_url.clone(), config.endpoints.clone(), timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves the full URL for `gesture` from the configured endpoint map.
    pub fn endpoint_url(&self, gesture: Gesture) -> Result<String, DispatchError> {
        let path = self
            .endpoints
            .get(gesture.name())
            .ok_or(DispatchError::MissingEndpoint(gesture))?;
        Ok(join_url(&self.base_url, path))
    }

    /// Posts one event and returns the response status on success (2xx).
    pub async fn deliver(&self, event: &GestureEvent) -> Result<StatusCode, DispatchError> {
        let url = self.endpoint_url(event.gesture)?;
        debug!("POST {} for {}", url, event.gesture);

        let response = self.client.post(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                DispatchError::Timeout(url.clone())
            } else {
                DispatchError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status {
                gesture: event.gesture,
                status: status.as_u16(),
            });
        }

        Ok(status)
    }
}

// Joins base and path with exactly one slash between them
fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
