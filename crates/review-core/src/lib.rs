//! Concurrency core of the Review Board list service.
//!
//! Two independent components live here:
//!
//! - [`store`] -- [`Store`], the shared in-memory mapping of named review
//!   lists plus the process-wide throttle delay. Each is guarded by its own
//!   [`tokio::sync::RwLock`], and the throttle pause is always taken before
//!   any lock is acquired.
//! - [`hub`] -- [`Hub`], a lossy publish/subscribe broadcaster with a
//!   bounded queue per subscriber and a one-shot keep-alive loop.
//!
//! Neither component knows about HTTP. A [`Store`] given a [`Hub`]
//! publishes each result before releasing its list lock; the server crate
//! maps [`StoreError`] to responses.

pub mod error;
pub mod hub;
pub mod store;

pub use error::{ErrorKind, StoreError};
pub use hub::{Frame, Hub, SubscriberId, Subscription};
pub use store::{MAX_DELAY_SECS, Store};
