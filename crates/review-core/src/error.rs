//! Error taxonomy for store operations.
//!
//! Every expected failure maps to one of three kinds so that callers can
//! branch on [`StoreError::kind`] without matching messages.

use core::fmt;

/// Errors returned by [`Store`](crate::Store) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A list with this name already exists.
    #[error("list exists: {0}")]
    Conflict(String),

    /// The list, the item, or an open item does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request was malformed or out of range.
    #[error("{0}")]
    InvalidInput(String),
}

impl StoreError {
    /// The stable kind of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    pub(crate) fn list_not_found(name: &str) -> Self {
        Self::NotFound(format!("list not found: {name}"))
    }

    pub(crate) fn no_open_item(name: &str) -> Self {
        Self::NotFound(format!("no open item in list: {name}"))
    }
}

/// Coarse classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Create or seed over an existing name.
    Conflict,
    /// Missing list, item, or open item.
    NotFound,
    /// Malformed payload, bad index, or delay out of range.
    InvalidInput,
}

impl ErrorKind {
    /// Snake-case name used in response bodies.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
