//! Shared wire types for the Review Board list service.
//!
//! Every JSON shape that crosses the HTTP boundary or the event stream is
//! defined here so the store, the broadcast hub and the server agree on
//! field names. Field casing (notably `Document`) is part of the contract
//! with existing clients and must not change.
//!
//! # Modules
//!
//! - [`item`] -- Review items, their status, and the seed payload shape
//! - [`summary`] -- Board summary returned by `GET /meta`
//! - [`events`] -- Event payloads published to stream subscribers
//! - [`manifest`] -- Tool manifest announced on the handshake

pub mod events;
pub mod item;
pub mod manifest;
pub mod summary;

// Re-export all public types at crate root for convenience.
pub use events::{ListCreated, ListCreatedAck, ListDeleted};
pub use item::{Item, ItemStatus, NewItem};
pub use manifest::{Manifest, ToolDescriptor};
pub use summary::{ListSummary, Summary};
