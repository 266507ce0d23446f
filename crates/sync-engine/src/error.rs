// crates/sync-engine/src/error.rs
//! Error types for state sync

use statesync_url::UrlStateError;
use thiserror::Error;

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while starting or running a sync
#[derive(Debug, Error)]
pub enum SyncError {
    /// A sync key is unusable
    #[error("Invalid sync key: {0}")]
    InvalidKey(String),

    /// Two configs in one call share a key
    #[error("Duplicate sync key: {0}")]
    DuplicateKey(String),

    /// `sync_state` was called outside a tokio runtime
    #[error("State sync requires a running tokio runtime")]
    NoRuntime,

    /// A custom strategy failed to read or write its storage
    #[error("Storage error: {0}")]
    Storage(String),

    /// Reading or writing URL state failed
    #[error("URL state error: {0}")]
    Url(#[from] UrlStateError),
}
