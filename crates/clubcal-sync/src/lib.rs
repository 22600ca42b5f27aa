//! Sync orchestrator, storage backends and HTTP trigger.
//!
//! - [`SyncRunner`] - One fetch, normalize, publish cycle
//! - [`StorageBackend`] - Org config and event document persistence
//! - [`SyncConfig`] - Deployment settings (TOML + environment)
//! - [`trigger`] - axum router running a sync per request

pub mod config;
pub mod error;
pub mod storage;
pub mod sync;
pub mod trigger;

#[cfg(test)]
mod testing;

pub use config::{DeploymentMode, SyncConfig};
pub use error::{SyncError, SyncResult};
pub use storage::{CloudStorage, FileStorage, StorageBackend, create_storage};
pub use sync::SyncRunner;
