//! Lossy publish/subscribe hub for the server-sent event stream.
//!
//! Every subscriber owns a bounded [`mpsc`] queue. [`Hub::publish`] offers
//! each frame to every queue with [`mpsc::Sender::try_send`]; a full queue
//! drops the frame for that subscriber only, so a stalled client never
//! blocks the producer or its peers.
//!
//! A single [`Mutex`] guards the subscriber set and the keep-alive latch.
//! It is held only for map updates and non-blocking sends.
//!
//! [`Subscription`] is an RAII handle: dropping it unregisters the queue.
//! When a client disconnects, the response stream owning the handle is
//! dropped and the subscriber disappears with it.

use core::fmt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};
use uuid::Uuid;

/// Default per-subscriber queue capacity.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 8;

/// Shortest keep-alive period the hub will schedule.
const MIN_KEEP_ALIVE_INTERVAL: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// One unit pushed to subscribers.
///
/// Payloads are reference counted so fan-out clones are cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// An event payload, usually JSON.
    Data(Arc<str>),
    /// A comment line. Clients treat it as a heartbeat.
    Comment(Arc<str>),
}

impl Frame {
    /// A data frame carrying `payload`.
    pub fn data(payload: impl Into<Arc<str>>) -> Self {
        Self::Data(payload.into())
    }

    /// The bare comment sent when a stream opens.
    pub fn ping() -> Self {
        Self::Comment(Arc::from(""))
    }

    /// The periodic heartbeat comment.
    pub fn keep_alive() -> Self {
        Self::Comment(Arc::from("keep-alive"))
    }

    /// Whether this frame is a heartbeat rather than an event.
    pub const fn is_comment(&self) -> bool {
        matches!(self, Self::Comment(_))
    }

    /// Encode as event-stream text: `data: <payload>\n\n`, `:\n\n`, or
    /// `: <comment>\n\n`.
    ///
    /// Multi-line payloads get one `data:` line per line so they cannot
    /// terminate the event early.
    pub fn encode(&self) -> String {
        match self {
            Self::Data(payload) => {
                let mut out = String::with_capacity(payload.len().saturating_add(8));
                for line in payload.split('\n') {
                    out.push_str("data: ");
                    out.push_str(line.strip_suffix('\r').unwrap_or(line));
                    out.push('\n');
                }
                out.push('\n');
                out
            }
            Self::Comment(text) if text.is_empty() => String::from(":\n\n"),
            Self::Comment(text) => format!(": {text}\n\n"),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

// ---------------------------------------------------------------------------
// Subscriber identity
// ---------------------------------------------------------------------------

/// Identifier of one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Hub
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct HubState {
    subscribers: HashMap<SubscriberId, mpsc::Sender<Frame>>,
    keep_alive_started: bool,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<HubState>,
    buffer: usize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, HubState> {
        // No critical section can leave the state inconsistent; poisoning is ignored.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: SubscriberId) {
        let (removed, remaining) = {
            let mut state = self.lock();
            let removed = state.subscribers.remove(&id).is_some();
            (removed, state.subscribers.len())
        };
        if removed {
            debug!(subscriber = %id, subscribers = remaining, "subscriber removed");
        }
    }
}

/// Broadcast hub. Cheap to clone; clones share the subscriber set.
#[derive(Debug, Clone)]
pub struct Hub {
    shared: Arc<Shared>,
}

impl Hub {
    /// Create a hub with [`DEFAULT_SUBSCRIBER_BUFFER`] slots per subscriber.
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_SUBSCRIBER_BUFFER)
    }

    /// Create a hub with `buffer` queued frames per subscriber (at least 1).
    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(HubState::default()),
                buffer: buffer.max(1),
            }),
        }
    }

    /// Register a new subscriber and return its receiving end.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.shared.buffer);
        let id = SubscriberId::new();
        let count = {
            let mut state = self.shared.lock();
            state.subscribers.insert(id, tx);
            state.subscribers.len()
        };
        debug!(subscriber = %id, subscribers = count, "subscriber registered");

        Subscription {
            id,
            rx,
            hub: Arc::downgrade(&self.shared),
        }
    }

    /// Unregister a subscriber and release its queue.
    ///
    /// Taking the handle by value makes a second unsubscribe impossible.
    /// Dropping the handle has the same effect.
    pub fn unsubscribe(&self, subscription: Subscription) {
        self.shared.remove(subscription.id);
        drop(subscription);
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().subscribers.len()
    }

    /// Offer `frame` to every subscriber without waiting.
    ///
    /// Returns how many subscribers accepted it. Subscribers with a full
    /// queue miss this frame.
    pub fn publish(&self, frame: &Frame) -> usize {
        let mut delivered = 0_usize;
        let mut state = self.shared.lock();
        state.subscribers.retain(|id, tx| match tx.try_send(frame.clone()) {
            Ok(()) => {
                delivered = delivered.saturating_add(1);
                true
            }
            Err(TrySendError::Full(_)) => {
                debug!(subscriber = %id, "subscriber queue full, frame dropped");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
        delivered
    }

    /// Serialize `value` to JSON and publish it as a data frame.
    ///
    /// # Errors
    ///
    /// Returns the serialization error; nothing is published in that case.
    pub fn publish_json<T>(&self, value: &T) -> Result<usize, serde_json::Error>
    where
        T: Serialize + ?Sized,
    {
        let payload = serde_json::to_string(value)?;
        Ok(self.publish(&Frame::data(payload)))
    }

    /// Start the heartbeat loop unless it is already running.
    ///
    /// Every `interval` a [`Frame::keep_alive`] comment is sent to all
    /// subscribers; ticks with no subscribers are skipped. The loop stops
    /// when the last clone of the hub is dropped. Returns `true` only for
    /// the call that started the loop.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_keep_alive(&self, interval: Duration) -> bool {
        {
            let mut state = self.shared.lock();
            if state.keep_alive_started {
                return false;
            }
            state.keep_alive_started = true;
        }

        let interval = interval.max(MIN_KEEP_ALIVE_INTERVAL);
        tokio::spawn(keep_alive_loop(Arc::downgrade(&self.shared), interval));
        info!(interval_ms = interval.as_millis(), "keep-alive started");
        true
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

async fn keep_alive_loop(weak: Weak<Shared>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(shared) = weak.upgrade() else {
            debug!("hub dropped, keep-alive stopped");
            return;
        };
        let hub = Hub { shared };
        if hub.subscriber_count() == 0 {
            continue;
        }
        let delivered = hub.publish(&Frame::keep_alive());
        trace!(delivered, "keep-alive sent");
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Receiving end of one subscriber. Unregisters itself on drop.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Frame>,
    hub: Weak<Shared>,
}

impl Subscription {
    /// This subscriber's identifier.
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next frame. Returns `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Take the next queued frame, if any, without waiting.
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.hub.upgrade() {
            shared.remove(self.id);
        }
    }
}
