//! Payloads published to stream subscribers and returned by list
//! lifecycle operations.

use serde::{Deserialize, Serialize};

use crate::item::Item;

/// Published when a list is created, empty or seeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCreated {
    /// Always [`ListCreated::EVENT`].
    pub event: String,
    /// Name of the new list.
    pub name: String,
    /// Stored items when the list was seeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Item>>,
}

impl ListCreated {
    /// Event tag carried in the `event` field.
    pub const EVENT: &'static str = "add_list";

    /// Event for a list created without items.
    pub fn empty(name: &str) -> Self {
        Self {
            event: Self::EVENT.to_owned(),
            name: name.to_owned(),
            items: None,
        }
    }

    /// Event for a list created from a seed payload.
    pub fn seeded(name: &str, items: Vec<Item>) -> Self {
        Self {
            event: Self::EVENT.to_owned(),
            name: name.to_owned(),
            items: Some(items),
        }
    }
}

/// Response body for an empty list creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCreatedAck {
    /// Name of the new list.
    pub name: String,
    /// Always `"created"`.
    pub status: String,
}

impl ListCreatedAck {
    /// Acknowledge creation of `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            status: String::from("created"),
        }
    }
}

/// Confirmation of a list deletion. Returned to the caller and published
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDeleted {
    /// Name of the removed list.
    pub name: String,
    /// Always `true`.
    pub deleted: bool,
}

impl ListDeleted {
    /// Confirm deletion of `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            deleted: true,
        }
    }
}
