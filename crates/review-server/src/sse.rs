//! Server-sent event stream of store changes.
//!
//! Clients connect to `GET /mcp/sse` and receive every frame published to
//! the [`Hub`](review_core::Hub): `data: <json>` events for list changes
//! and `:` comment heartbeats. The stream opens with a bare `:` ping.
//!
//! The response body owns the hub [`Subscription`](review_core::Subscription).
//! When the client disconnects the body is dropped and the subscriber is
//! unregistered with it.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use futures::stream::{self, StreamExt};
use review_core::Frame;
use tracing::debug;

use crate::state::AppState;

/// Subscribe to the hub and stream frames as `text/event-stream`.
///
/// # Route
///
/// `GET /mcp/sse` (also `/mcp/sse/`)
pub async fn event_stream(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let subscription = state.hub.subscribe();
    debug!(subscriber = %subscription.id(), "event stream client connected");

    let published = stream::unfold(subscription, |mut subscription| async move {
        let frame = subscription.recv().await?;
        Some((frame, subscription))
    });
    let frames = stream::iter([Frame::ping()])
        .chain(published)
        .map(|frame| Ok::<_, Infallible>(frame.encode()));

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(frames),
    )
}
