//! Sync error types.

use std::io;

use clubcal_providers::ProviderError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that abort a sync run.
///
/// Per-event problems are not represented here; they are logged and the
/// event is dropped.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing or invalid configuration, detected before any I/O.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The event source failed (token exchange, listing, body shape).
    #[error("Source error: {0}")]
    Source(#[from] ProviderError),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A stored document could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A remote storage call failed.
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl SyncError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a storage error with an underlying cause.
    pub fn storage_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
