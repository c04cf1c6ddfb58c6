//! Shared in-memory store of named review lists.
//!
//! # Locking
//!
//! Two independent [`RwLock`]s guard the two pieces of shared state:
//!
//! - `lists` -- the name to list mapping. Reads ([`Store::get_list`],
//!   [`Store::first_open`], [`Store::summary`]) take it shared; mutations
//!   take it exclusive.
//! - `item_delay` -- the throttle applied before [`Store::first_open`] and
//!   [`Store::close_item`].
//!
//! The throttle value is copied out under the delay lock, the lock is
//! released, the task sleeps, and only then is the list lock acquired. A
//! throttled caller therefore never stalls operations on other lists.
//! No operation ever holds both locks at once.
//!
//! # Events
//!
//! A store built with [`Store::with_events`] publishes every result to a
//! [`Hub`] while the list guard is still held, so subscribers observe
//! changes to a list in the order they were applied.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use review_types::{Item, ListCreated, ListDeleted, ListSummary, NewItem, Summary};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::hub::Hub;

/// Upper bound for [`Store::set_delay`], in seconds.
pub const MAX_DELAY_SECS: u64 = 600;

/// A named list's contents. The name is the map key.
#[derive(Debug, Default)]
struct ReviewList {
    items: Vec<Item>,
}

impl ReviewList {
    fn first_open(&self) -> Option<&Item> {
        self.items.iter().find(|item| item.status.is_open())
    }

    fn first_open_mut(&mut self) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.status.is_open())
    }

    fn open_count(&self) -> usize {
        self.items.iter().filter(|item| item.status.is_open()).count()
    }
}

/// The root aggregate: every review list plus the throttle delay.
///
/// Share it as `Arc<Store>`; all operations take `&self`.
#[derive(Debug, Default)]
pub struct Store {
    lists: RwLock<BTreeMap<String, ReviewList>>,
    item_delay: RwLock<Duration>,
    events: Option<Hub>,
}

impl Store {
    /// Create an empty store with no throttle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with an initial throttle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidInput`] if `seconds` exceeds
    /// [`MAX_DELAY_SECS`].
    pub fn with_delay(seconds: u64) -> Result<Self, StoreError> {
        let delay = validate_delay(i64::try_from(seconds).unwrap_or(i64::MAX))?;
        Ok(Self {
            lists: RwLock::default(),
            item_delay: RwLock::new(delay),
            events: None,
        })
    }

    /// Publish every operation result to `hub`.
    #[must_use]
    pub fn with_events(mut self, hub: Hub) -> Self {
        self.events = Some(hub);
        self
    }

    /// Publish `value` as a data frame. Callers hold the list guard.
    fn emit<T: Serialize + ?Sized>(&self, value: &T) {
        let Some(hub) = &self.events else {
            return;
        };
        if let Err(e) = hub.publish_json(value) {
            warn!("Failed to serialize store event: {e}");
        }
    }

    // -----------------------------------------------------------------------
    // List lifecycle
    // -----------------------------------------------------------------------

    /// Create an empty list and return its name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the name is taken.
    pub async fn create_list(&self, name: &str) -> Result<String, StoreError> {
        let mut lists = self.lists.write().await;
        if lists.contains_key(name) {
            return Err(StoreError::Conflict(name.to_owned()));
        }
        lists.insert(name.to_owned(), ReviewList::default());
        self.emit(&ListCreated::empty(name));
        info!(list = name, "list created");
        Ok(name.to_owned())
    }

    /// Create a list from already-decoded items and return what was stored.
    ///
    /// Items without an explicit index get their 1-based position. Items
    /// without a status start open.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the name is taken, or
    /// [`StoreError::InvalidInput`] if two items end up with the same
    /// index. On error no list is created.
    pub async fn seed_list(
        &self,
        name: &str,
        items: Vec<NewItem>,
    ) -> Result<Vec<Item>, StoreError> {
        self.insert_seeded(name, Ok(items)).await
    }

    /// Create a list from a raw JSON array payload.
    ///
    /// The payload is decoded before the list lock is taken. A name
    /// conflict is still reported ahead of a malformed payload.
    ///
    /// # Errors
    ///
    /// As [`Store::seed_list`], plus [`StoreError::InvalidInput`] when the
    /// payload is not a JSON array of items.
    pub async fn seed_list_json(
        &self,
        name: &str,
        payload: &[u8],
    ) -> Result<Vec<Item>, StoreError> {
        let decoded = serde_json::from_slice::<Vec<NewItem>>(payload)
            .map_err(|e| StoreError::InvalidInput(format!("malformed item payload: {e}")));
        self.insert_seeded(name, decoded).await
    }

    async fn insert_seeded(
        &self,
        name: &str,
        decoded: Result<Vec<NewItem>, StoreError>,
    ) -> Result<Vec<Item>, StoreError> {
        let mut lists = self.lists.write().await;
        if lists.contains_key(name) {
            return Err(StoreError::Conflict(name.to_owned()));
        }
        let items = assign_indices(decoded?)?;
        lists.insert(
            name.to_owned(),
            ReviewList {
                items: items.clone(),
            },
        );
        self.emit(&ListCreated::seeded(name, items.clone()));
        info!(list = name, items = items.len(), "list seeded");
        Ok(items)
    }

    /// Remove a list and all of its items.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the list does not exist.
    pub async fn delete_list(&self, name: &str) -> Result<ListDeleted, StoreError> {
        let mut lists = self.lists.write().await;
        if lists.remove(name).is_none() {
            return Err(StoreError::list_not_found(name));
        }
        let deleted = ListDeleted::new(name);
        self.emit(&deleted);
        info!(list = name, "list deleted");
        Ok(deleted)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Snapshot of a list's items in stored order. Not throttled.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the list does not exist.
    pub async fn get_list(&self, name: &str) -> Result<Vec<Item>, StoreError> {
        let lists = self.lists.read().await;
        let list = lists
            .get(name)
            .ok_or_else(|| StoreError::list_not_found(name))?;
        self.emit(&list.items);
        Ok(list.items.clone())
    }

    /// Return the first open item without changing it.
    ///
    /// Waits out the current throttle before reading. Repeated calls with
    /// no close in between return the same item.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the list does not exist or has
    /// no open item.
    pub async fn first_open(&self, name: &str) -> Result<Item, StoreError> {
        self.throttle().await;

        let lists = self.lists.read().await;
        let list = lists
            .get(name)
            .ok_or_else(|| StoreError::list_not_found(name))?;
        let item = list
            .first_open()
            .ok_or_else(|| StoreError::no_open_item(name))?;
        self.emit(item);
        Ok(item.clone())
    }

    /// Close an item and return it.
    ///
    /// With `index`, closes the item at that 1-based position; closing an
    /// already-closed item succeeds. Without `index`, closes the first open
    /// item. Waits out the current throttle first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the list does not exist or, when
    /// no index is given, has no open item. Returns
    /// [`StoreError::InvalidInput`] if `index` is outside `1..=len`.
    pub async fn close_item(&self, name: &str, index: Option<u32>) -> Result<Item, StoreError> {
        self.throttle().await;

        let mut lists = self.lists.write().await;
        let list = lists
            .get_mut(name)
            .ok_or_else(|| StoreError::list_not_found(name))?;

        let item = match index {
            Some(index) => {
                let slot = usize::try_from(index)
                    .ok()
                    .and_then(|position| position.checked_sub(1))
                    .unwrap_or(usize::MAX);
                list.items
                    .get_mut(slot)
                    .ok_or_else(|| StoreError::InvalidInput(format!("bad index: {index}")))?
            }
            None => list
                .first_open_mut()
                .ok_or_else(|| StoreError::no_open_item(name))?,
        };

        item.close();
        self.emit(&*item);
        debug!(list = name, index = item.index, "item closed");
        Ok(item.clone())
    }

    /// Counts for every list, ordered by name, plus the current delay.
    pub async fn summary(&self) -> Summary {
        let lists = {
            let lists = self.lists.read().await;
            lists
                .iter()
                .map(|(name, list)| ListSummary {
                    name: name.clone(),
                    count: list.items.len(),
                    open: list.open_count(),
                })
                .collect()
        };

        Summary {
            lists,
            delay: self.delay().await.as_secs(),
        }
    }

    // -----------------------------------------------------------------------
    // Throttle
    // -----------------------------------------------------------------------

    /// Current throttle delay.
    pub async fn delay(&self) -> Duration {
        *self.item_delay.read().await
    }

    /// Replace the throttle delay for subsequent operations.
    ///
    /// Operations already waiting keep the delay they read.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidInput`] if `seconds` is outside
    /// `0..=600`.
    pub async fn set_delay(&self, seconds: i64) -> Result<Duration, StoreError> {
        let delay = validate_delay(seconds)?;
        *self.item_delay.write().await = delay;
        info!(delay_secs = delay.as_secs(), "item delay updated");
        Ok(delay)
    }

    /// Sleep for the current delay. The delay lock is released before
    /// sleeping and no list lock is held.
    async fn throttle(&self) {
        let delay = self.delay().await;
        if !delay.is_zero() {
            debug!(delay_secs = delay.as_secs(), "throttling read");
            tokio::time::sleep(delay).await;
        }
    }
}

fn validate_delay(seconds: i64) -> Result<Duration, StoreError> {
    u64::try_from(seconds)
        .ok()
        .filter(|&secs| secs <= MAX_DELAY_SECS)
        .map(Duration::from_secs)
        .ok_or_else(|| {
            StoreError::InvalidInput(format!(
                "invalid timeout {seconds} (0-{MAX_DELAY_SECS})"
            ))
        })
}

/// Resolve indices and default statuses for a seed payload.
fn assign_indices(items: Vec<NewItem>) -> Result<Vec<Item>, StoreError> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .zip(1_u32..)
        .map(|(new, position)| {
            let index = new.explicit_index().unwrap_or(position);
            if !seen.insert(index) {
                return Err(StoreError::InvalidInput(format!(
                    "duplicate index in payload: {index}"
                )));
            }
            Ok(new.into_item(index))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use review_types::ItemStatus;
    use tokio::time::Instant;

    use super::*;
    use crate::error::ErrorKind;
    use crate::hub::Frame;

    fn event(frame: Frame) -> serde_json::Value {
        match frame {
            Frame::Data(payload) => serde_json::from_str(&payload).unwrap(),
            Frame::Comment(_) => serde_json::Value::Null,
        }
    }

    fn new_item(document: &str) -> NewItem {
        NewItem {
            document: document.to_owned(),
            ..NewItem::default()
        }
    }

    async fn seeded(name: &str, count: usize) -> Store {
        let store = Store::new();
        let items = (0..count).map(|i| new_item(&format!("doc{i}.md"))).collect();
        store.seed_list(name, items).await.unwrap();
        store
    }

    #[tokio::test]
    async fn create_over_existing_name_conflicts() {
        let store = Store::new();
        assert_eq!(store.create_list("todo").await.unwrap(), "todo");
        let err = store.create_list("todo").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        let err = store.seed_list("todo", vec![new_item("a")]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn seed_assigns_positions_and_defaults() {
        let store = Store::new();
        let items = store
            .seed_list(
                "todo",
                vec![
                    new_item("a.md"),
                    NewItem {
                        index: Some(7),
                        status: Some(ItemStatus::Closed),
                        ..new_item("b.md")
                    },
                    new_item("c.md"),
                ],
            )
            .await
            .unwrap();

        let indices: Vec<_> = items.iter().map(|i| i.index).collect();
        assert_eq!(indices, [1, 7, 3]);
        let statuses: Vec<_> = items.iter().map(|i| i.status).collect();
        assert_eq!(statuses, [ItemStatus::Open, ItemStatus::Closed, ItemStatus::Open]);
        assert_eq!(store.get_list("todo").await.unwrap(), items);
    }

    #[tokio::test]
    async fn duplicate_index_rejects_whole_payload() {
        let store = Store::new();
        let err = store
            .seed_list(
                "todo",
                vec![
                    NewItem {
                        index: Some(2),
                        ..new_item("a.md")
                    },
                    new_item("b.md"),
                ],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(store.get_list("todo").await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_input() {
        let store = Store::new();
        let err = store.seed_list_json("todo", b"{not json").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = store
            .seed_list_json("todo", br#"[{"index":-1}]"#)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn conflict_reported_before_malformed_payload() {
        let store = Store::new();
        store.create_list("todo").await.unwrap();
        let err = store.seed_list_json("todo", b"garbage").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn first_open_is_a_peek() {
        let store = seeded("todo", 2).await;
        let first = store.first_open("todo").await.unwrap();
        let again = store.first_open("todo").await.unwrap();
        assert_eq!(first.index, 1);
        assert_eq!(first, again);
    }

    #[tokio::test]
    async fn closing_last_open_item_exhausts_list() {
        let store = seeded("todo", 1).await;
        let closed = store.close_item("todo", None).await.unwrap();
        assert_eq!(closed.status, ItemStatus::Closed);
        assert_eq!(store.first_open("todo").await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            store.close_item("todo", None).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn close_by_index_is_range_checked_and_idempotent() {
        let store = seeded("todo", 3).await;
        for bad in [0, 4] {
            let err = store.close_item("todo", Some(bad)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }

        let closed = store.close_item("todo", Some(2)).await.unwrap();
        assert_eq!(closed.index, 2);
        let again = store.close_item("todo", Some(2)).await.unwrap();
        assert_eq!(again.status, ItemStatus::Closed);

        assert_eq!(store.first_open("todo").await.unwrap().index, 1);
        assert_eq!(
            store.close_item("missing", Some(1)).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn delete_frees_the_name() {
        let store = seeded("todo", 2).await;
        store.delete_list("todo").await.unwrap();
        assert_eq!(store.get_list("todo").await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(store.delete_list("todo").await.unwrap_err().kind(), ErrorKind::NotFound);
        store.create_list("todo").await.unwrap();
        assert!(store.get_list("todo").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delay_bounds_are_enforced() {
        let store = Store::new();
        assert_eq!(store.set_delay(700).await.unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(store.set_delay(-1).await.unwrap_err().kind(), ErrorKind::InvalidInput);
        store.set_delay(600).await.unwrap();
        store.set_delay(0).await.unwrap();
        assert_eq!(store.summary().await.delay, 0);
        assert!(Store::with_delay(601).is_err());
    }

    #[tokio::test]
    async fn summary_counts_open_items() {
        let store = seeded("b", 3).await;
        store.create_list("a").await.unwrap();
        store.close_item("b", Some(1)).await.unwrap();
        store.set_delay(5).await.unwrap();

        let summary = store.summary().await;
        assert_eq!(summary.delay, 5);
        assert_eq!(
            summary.lists,
            vec![
                ListSummary {
                    name: String::from("a"),
                    count: 0,
                    open: 0,
                },
                ListSummary {
                    name: String::from("b"),
                    count: 3,
                    open: 2,
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_does_not_hold_list_lock() {
        let store = Arc::new(seeded("slow", 1).await);
        store.set_delay(5).await.unwrap();
        let start = Instant::now();

        let peeker = Arc::clone(&store);
        let peek = tokio::spawn(async move { peeker.first_open("slow").await });
        tokio::task::yield_now().await;

        // Exclusive access to the mapping is available while the peek sleeps.
        store.create_list("other").await.unwrap();
        store.delete_list("other").await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);

        let item = peek.await.unwrap().unwrap();
        assert_eq!(item.index, 1);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_throttle_keeps_old_delay() {
        let store = Arc::new(seeded("slow", 1).await);
        store.set_delay(10).await.unwrap();
        let start = Instant::now();

        let closer = Arc::clone(&store);
        let close = tokio::spawn(async move { closer.close_item("slow", None).await });
        tokio::task::yield_now().await;
        store.set_delay(0).await.unwrap();

        close.await.unwrap().unwrap();
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_closes_take_distinct_items() {
        let store = Arc::new(seeded("todo", 32).await);
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.close_item("todo", None).await })
            })
            .collect();

        let mut closed = HashSet::new();
        for handle in handles {
            let item = handle.await.unwrap().unwrap();
            assert!(closed.insert(item.index));
        }
        assert_eq!(closed.len(), 32);
        assert_eq!(store.first_open("todo").await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn results_are_published_to_the_hub() {
        let hub = Hub::new();
        let mut sub = hub.subscribe();
        let store = Store::new().with_events(hub.clone());

        store.create_list("a").await.unwrap();
        store.seed_list("b", vec![new_item("x.md")]).await.unwrap();
        store.first_open("b").await.unwrap();
        store.close_item("b", None).await.unwrap();
        store.get_list("b").await.unwrap();
        store.delete_list("a").await.unwrap();
        assert!(store.create_list("b").await.is_err());

        assert_eq!(event(sub.try_recv().unwrap())["event"], "add_list");
        assert_eq!(event(sub.try_recv().unwrap())["items"][0]["index"], 1);
        assert_eq!(event(sub.try_recv().unwrap())["status"], "open");
        assert_eq!(event(sub.try_recv().unwrap())["status"], "closed");
        assert_eq!(event(sub.try_recv().unwrap())[0]["status"], "closed");
        assert_eq!(event(sub.try_recv().unwrap())["deleted"], true);
        assert_eq!(sub.try_recv(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_close_events_follow_apply_order() {
        for _ in 0..20 {
            let hub = Hub::with_buffer(128);
            let store = Arc::new(seeded("q", 64).await.with_events(hub.clone()));
            let mut sub = hub.subscribe();

            let handles: Vec<_> = (0..64)
                .map(|_| {
                    let store = Arc::clone(&store);
                    tokio::spawn(async move { store.close_item("q", None).await })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            let mut indices = Vec::new();
            while let Some(frame) = sub.try_recv() {
                indices.push(event(frame)["index"].as_u64().unwrap());
            }
            let expected: Vec<u64> = (1..=64).collect();
            assert_eq!(indices, expected);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn delete_then_recreate_is_seen_in_order() {
        let hub = Hub::with_buffer(256);
        let store = Arc::new(Store::new().with_events(hub.clone()));
        store.create_list("a").await.unwrap();
        let mut sub = hub.subscribe();

        let churn: Vec<_> = (0..50)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    if store.delete_list("a").await.is_err() {
                        let _ = store.create_list("a").await;
                    }
                })
            })
            .collect();
        for handle in churn {
            handle.await.unwrap();
        }

        // Replaying the events must reproduce the final state.
        let mut exists = true;
        while let Some(frame) = sub.try_recv() {
            let event = event(frame);
            if event["deleted"] == true {
                assert!(exists);
                exists = false;
            } else {
                assert!(!exists);
                exists = true;
            }
        }
        assert_eq!(store.get_list("a").await.is_ok(), exists);
    }
}
