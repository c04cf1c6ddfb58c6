//! HTTP facade for the Review Board list service.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** mapping list operations onto the shared
//!   [`Store`](review_core::Store) (`/add`, `/delete`, `/list`, `/open`,
//!   `/close`, `/timeout`, `/meta`)
//! - **Event stream** (`/mcp/sse`) relaying every published change from
//!   the [`Hub`](review_core::Hub) as server-sent events, plus the
//!   `/mcp` handshake that announces the tool manifest
//! - **HTML pages**: the board (`/`) and an endpoint tester (`/test`)
//!
//! # Architecture
//!
//! Handlers run one store operation, then publish the result to the hub.
//! Store errors are mapped to status codes by [`error::ApiError`]; the
//! core crate never builds responses itself.

pub mod config;
pub mod error;
pub mod handlers;
pub mod pages;
pub mod router;
pub mod server;
pub mod sse;
pub mod state;

// Re-export primary types for convenience.
pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
