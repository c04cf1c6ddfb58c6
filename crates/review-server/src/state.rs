//! Shared application state for the HTTP facade.
//!
//! [`AppState`] pairs the [`Store`] with the [`Hub`]. The store is wired
//! to publish its own results on the hub, so list events reach subscribers
//! in the order the changes were applied.

use std::sync::Arc;
use std::time::Duration;

use review_core::{Hub, Store, StoreError};
use serde::Serialize;
use tracing::warn;

use crate::config::ServerConfig;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The review lists and throttle delay.
    pub store: Arc<Store>,
    /// Broadcast hub feeding the event stream.
    pub hub: Hub,
    /// Period of the keep-alive loop started on handshake.
    pub keep_alive: Duration,
}

impl AppState {
    /// Create state with an empty store and default hub settings.
    pub fn new() -> Self {
        let config = ServerConfig::default();
        let hub = Hub::with_buffer(config.subscriber_buffer);
        Self {
            store: Arc::new(Store::new().with_events(hub.clone())),
            hub,
            keep_alive: config.keep_alive(),
        }
    }

    /// Create state from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidInput`] if the initial delay is out of
    /// range.
    pub fn from_config(config: &ServerConfig) -> Result<Self, StoreError> {
        let hub = Hub::with_buffer(config.subscriber_buffer);
        let store = Store::with_delay(config.initial_delay_secs)?.with_events(hub.clone());
        Ok(Self {
            store: Arc::new(store),
            hub,
            keep_alive: config.keep_alive(),
        })
    }

    /// Publish a JSON payload to all stream subscribers.
    ///
    /// Returns the number of subscribers that accepted it. A payload that
    /// cannot be serialized is logged and dropped.
    pub fn broadcast<T: Serialize + ?Sized>(&self, value: &T) -> usize {
        self.hub.publish_json(value).unwrap_or_else(|e| {
            warn!("Failed to serialize broadcast payload: {e}");
            0
        })
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
