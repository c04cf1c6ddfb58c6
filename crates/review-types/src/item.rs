//! Review items and their two-state lifecycle.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a review item.
///
/// Items start [`ItemStatus::Open`] and may only move to
/// [`ItemStatus::Closed`]. There is no transition back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Waiting for review.
    #[default]
    Open,
    /// Reviewed. Terminal.
    Closed,
}

impl ItemStatus {
    /// Whether the item is still waiting for review.
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// One stored unit of review work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// 1-based position key, unique within the owning list.
    pub index: u32,
    /// Document the conflict was found in.
    #[serde(rename = "Document")]
    pub document: String,
    /// The conflicting statement.
    pub conflict: String,
    /// Proposed replacement statement.
    pub new_statement: String,
    /// Current lifecycle state.
    pub status: ItemStatus,
}

impl Item {
    /// Mark the item closed. Closing a closed item is a no-op.
    pub const fn close(&mut self) {
        self.status = ItemStatus::Closed;
    }
}

/// An item as supplied by a client when seeding a list.
///
/// `index` and `status` may be omitted. An `index` of `0` counts as
/// omitted, matching clients that send zero-valued fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    /// Explicit index, or `None` to use the item's position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    /// Document the conflict was found in.
    #[serde(rename = "Document", default)]
    pub document: String,
    /// The conflicting statement.
    #[serde(default)]
    pub conflict: String,
    /// Proposed replacement statement.
    #[serde(default)]
    pub new_statement: String,
    /// Initial status, defaulting to open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
}

impl NewItem {
    /// The explicit index, treating `0` as absent.
    pub fn explicit_index(&self) -> Option<u32> {
        self.index.filter(|&i| i != 0)
    }

    /// Build the stored item under the given index.
    pub fn into_item(self, index: u32) -> Item {
        Item {
            index,
            document: self.document,
            conflict: self.conflict,
            new_statement: self.new_statement,
            status: self.status.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn item_uses_wire_field_names() {
        let item = Item {
            index: 3,
            document: String::from("a.md"),
            conflict: String::from("x"),
            new_statement: String::from("y"),
            status: ItemStatus::Open,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["index"], 3);
        assert_eq!(json["Document"], "a.md");
        assert_eq!(json["conflict"], "x");
        assert_eq!(json["new_statement"], "y");
        assert_eq!(json["status"], "open");
        assert!(json.get("document").is_none());
    }

    #[test]
    fn new_item_fields_are_optional() {
        let item: NewItem = serde_json::from_str(r#"{"Document":"a.md"}"#).unwrap();
        assert_eq!(item.document, "a.md");
        assert_eq!(item.index, None);
        assert_eq!(item.status, None);
        assert!(item.conflict.is_empty());
    }

    #[test]
    fn zero_index_counts_as_absent() {
        let item: NewItem = serde_json::from_str(r#"{"index":0}"#).unwrap();
        assert_eq!(item.explicit_index(), None);
        let item: NewItem = serde_json::from_str(r#"{"index":4}"#).unwrap();
        assert_eq!(item.explicit_index(), Some(4));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result: Result<NewItem, _> = serde_json::from_str(r#"{"status":"pending"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn close_is_idempotent() {
        let mut item = NewItem::default().into_item(1);
        assert!(item.status.is_open());
        item.close();
        item.close();
        assert_eq!(item.status, ItemStatus::Closed);
        assert_eq!(item.status.to_string(), "closed");
    }
}
