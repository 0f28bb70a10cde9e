//! Error types for the key-value store adapter.

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or the connection dropped.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store answered, but with an error.
    #[error("store command failed: {0}")]
    Command(String),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
