//! Error types for the vigil cache registry.
//!
//! Nothing in this crate is fatal to the embedding process: every failure is
//! returned to the caller, and callers can tell a kind that will never work
//! apart from one that merely has not synced yet.

use thiserror::Error;

/// Main error type for vigil operations.
#[derive(Debug, Error)]
pub enum VigilError {
    // Registry errors
    #[error("Failed to build watch cache for {kind}: {message}")]
    Construction { kind: String, message: String },

    #[error("Wait for initial sync of {kind} aborted by shutdown")]
    SyncAborted { kind: String },

    #[error("Cache registry is shutting down")]
    ShuttingDown,

    // Watch stream errors
    #[error("Watch stream for {kind} failed: {message}")]
    Stream { kind: String, message: String },
}

/// Result type alias for vigil operations.
pub type Result<T> = std::result::Result<T, VigilError>;

impl VigilError {
    /// Create a construction error for the given kind.
    pub fn construction(kind: impl Into<String>, message: impl Into<String>) -> Self {
        VigilError::Construction {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create a watch stream error for the given kind.
    pub fn stream(kind: impl Into<String>, message: impl Into<String>) -> Self {
        VigilError::Stream {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Check if a blocking wait was cut short while the cache keeps
    /// synchronizing in the background. The wait can be retried.
    pub fn is_sync_abort(&self) -> bool {
        matches!(self, VigilError::SyncAborted { .. })
    }

    /// Check if this error was raised because the shutdown signal fired.
    pub fn is_shutdown(&self) -> bool {
        matches!(
            self,
            VigilError::SyncAborted { .. } | VigilError::ShuttingDown
        )
    }
}
