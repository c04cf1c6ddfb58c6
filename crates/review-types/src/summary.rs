//! Board summary served by `GET /meta`.

use serde::{Deserialize, Serialize};

/// Per-list counts within a [`Summary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSummary {
    /// List name.
    pub name: String,
    /// Total number of items.
    pub count: usize,
    /// Number of items still open.
    pub open: usize,
}

/// Snapshot of every list plus the current throttle delay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// One entry per list, ordered by name.
    pub lists: Vec<ListSummary>,
    /// Current item delay in whole seconds.
    pub delay: u64,
}
