//! CLI error types.

use std::fmt;

use clubcal_core::TracingError;
use clubcal_sync::SyncError;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported by the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Sync, storage or configuration failure.
    Sync(SyncError),
    /// Org config file could not be read or parsed.
    OrgConfig(String),
    /// IO error.
    Io(std::io::Error),
    /// Output serialization failed.
    Json(serde_json::Error),
    /// Logging could not be initialized.
    Tracing(TracingError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(err) => write!(f, "{}", err),
            Self::OrgConfig(msg) => write!(f, "invalid org config: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Json(err) => write!(f, "JSON error: {}", err),
            Self::Tracing(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sync(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Tracing(err) => Some(err),
            Self::OrgConfig(_) => None,
        }
    }
}

impl From<SyncError> for CliError {
    fn from(err: SyncError) -> Self {
        Self::Sync(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<TracingError> for CliError {
    fn from(err: TracingError) -> Self {
        Self::Tracing(err)
    }
}
