//! Error types for the HTTP facade.
//!
//! [`ApiError`] carries store failures and request-parsing failures and
//! converts them into responses via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.
//!
//! | Kind | Status |
//! |------|--------|
//! | `not_found` | 404 |
//! | `conflict` | 409 |
//! | `invalid_input` | 400 |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use review_core::{ErrorKind, StoreError};

/// Errors that can occur while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A path segment or query value could not be parsed.
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    /// The error kind reported to clients.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(e) => e.kind(),
            Self::BadRequest(_) => ErrorKind::InvalidInput,
        }
    }

    /// The HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind().as_str(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
