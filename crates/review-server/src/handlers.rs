//! REST endpoint handlers for the Review Board server.
//!
//! Each handler runs one store operation and returns the JSON result. The
//! store publishes the change to the event stream itself.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/meta` | Summary of all lists plus the delay |
//! | `GET` | `/timeout/{seconds}` | Set the throttle delay (0-600 s) |
//! | `GET` | `/add/{list}` | Create an empty list |
//! | `POST` | `/add/{list}` | Create a list seeded from a JSON array |
//! | `GET` | `/delete/{list}` | Delete a list |
//! | `GET` | `/list/{list}` | All items of a list |
//! | `GET` | `/open/{list}` | First open item (throttled) |
//! | `GET` | `/close/{list}?index=n` | Close an item (throttled) |
//! | `POST` | `/mcp` | Announce the tool manifest, start keep-alives |

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use review_types::{ListCreatedAck, Manifest};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::pages;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for `GET /close/{list}`.
#[derive(Debug, serde::Deserialize)]
pub struct CloseQuery {
    /// 1-based position of the item to close. Empty or absent closes the
    /// first open item.
    pub index: Option<String>,
}

impl CloseQuery {
    fn position(&self) -> Result<Option<u32>, ApiError> {
        let Some(raw) = self.index.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        raw.parse()
            .map(Some)
            .map_err(|e| ApiError::BadRequest(format!("bad index {raw:?}: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// Serve the board page with a table of all lists.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let summary = state.store.summary().await;
    Html(pages::render_index(&summary))
}

/// Serve the interactive tester page.
pub async fn test_page() -> impl IntoResponse {
    Html(pages::TEST_PAGE)
}

/// Answer unknown paths with the endpoint cheat-sheet.
pub async fn usage() -> impl IntoResponse {
    (StatusCode::BAD_REQUEST, pages::USAGE)
}

// ---------------------------------------------------------------------------
// GET /meta, GET /timeout/{seconds}
// ---------------------------------------------------------------------------

/// Return every list's counts and the current delay.
pub async fn meta(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.summary().await)
}

/// Replace the throttle delay.
pub async fn set_timeout(
    State(state): State<Arc<AppState>>,
    Path(seconds): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let seconds: i64 = seconds
        .trim()
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("invalid timeout {seconds:?} (0-600): {e}")))?;
    let delay = state.store.set_delay(seconds).await?;

    Ok(Json(serde_json::json!({
        "message": format!("delay set to {} s", delay.as_secs()),
    })))
}

// ---------------------------------------------------------------------------
// /add/{list}, /delete/{list}
// ---------------------------------------------------------------------------

/// Create an empty list.
pub async fn create_list(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let name = state.store.create_list(&name).await?;
    Ok((StatusCode::CREATED, Json(ListCreatedAck::new(&name))))
}

/// Create a list from a JSON array of items in the request body.
pub async fn seed_list(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.store.seed_list_json(&name, &body).await?;
    Ok((StatusCode::CREATED, Json(items)))
}

/// Delete a list and its items.
pub async fn delete_list(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.store.delete_list(&name).await?;
    Ok(Json(deleted))
}

// ---------------------------------------------------------------------------
// /list/{list}, /open/{list}, /close/{list}
// ---------------------------------------------------------------------------

/// Return all items of a list.
pub async fn get_list(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.store.get_list(&name).await?;
    Ok(Json(items))
}

/// Return the first open item of a list without closing it.
pub async fn open_item(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.store.first_open(&name).await?;
    Ok(Json(item))
}

/// Close the item at `?index=n`, or the first open item.
pub async fn close_item(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<CloseQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let position = query.position()?;
    let item = state.store.close_item(&name, position).await?;
    Ok(Json(item))
}

// ---------------------------------------------------------------------------
// POST /mcp
// ---------------------------------------------------------------------------

/// Announce the tool manifest on the event stream and make sure the
/// keep-alive loop is running.
pub async fn handshake(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let delivered = state.broadcast(&Manifest::default());
    debug!(delivered, "manifest published");

    if state.hub.start_keep_alive(state.keep_alive) {
        info!("event stream session started");
    }

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "ok" })),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(index: Option<&str>) -> CloseQuery {
        CloseQuery {
            index: index.map(str::to_owned),
        }
    }

    #[test]
    fn empty_index_means_first_open() {
        assert_eq!(query(None).position().unwrap(), None);
        assert_eq!(query(Some("")).position().unwrap(), None);
        assert_eq!(query(Some("3")).position().unwrap(), Some(3));
    }

    #[test]
    fn non_numeric_index_is_rejected() {
        for raw in ["abc", "-1", "1.5"] {
            assert!(matches!(
                query(Some(raw)).position(),
                Err(ApiError::BadRequest(_))
            ));
        }
    }
}
