//! Error types for wpmirror-core

use thiserror::Error;

/// Result type alias using wpmirror-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in wpmirror-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Source request failed or returned a non-success status
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Source response body is not a collection of post records
    #[error("Decode failed: {0}")]
    Decode(String),

    /// A single post record could not be parsed
    #[error("Malformed post record: {0}")]
    MalformedRecord(String),

    /// Snapshot store could not be reached or rejected the request
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Snapshot key is absent from the store
    #[error("Snapshot not found: {0}")]
    NotFound(String),

    /// Create-only write found an existing snapshot
    #[error("Snapshot already exists: {0}")]
    Conflict(String),

    /// Stored bytes are not a valid snapshot
    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// Another cycle is already running on this runner
    #[error("A sync cycle is already in progress")]
    RunInProgress,

    /// Invalid input or configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error ends a whole cycle rather than a single item.
    pub const fn is_cycle_fatal(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Decode(_) | Self::RunInProgress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_and_decode_errors_are_cycle_fatal() {
        assert!(Error::Fetch("timeout".to_string()).is_cycle_fatal());
        assert!(Error::Decode("not an array".to_string()).is_cycle_fatal());
        assert!(Error::RunInProgress.is_cycle_fatal());
    }

    #[test]
    fn item_errors_are_not_cycle_fatal() {
        assert!(!Error::StoreUnavailable("down".to_string()).is_cycle_fatal());
        assert!(!Error::MalformedRecord("missing id".to_string()).is_cycle_fatal());
        assert!(!Error::Conflict("7".to_string()).is_cycle_fatal());
    }
}
