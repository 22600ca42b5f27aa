//! Storage backends for org config and the published event document.
//!
//! - [`FileStorage`] - Local filesystem (custom server deployment)
//! - [`CloudStorage`] - Firestore + Cloud Storage (Google Cloud deployment)
//!
//! Both return [`OrgConfig::default`] when no config is stored; a missing
//! config is never an error.

mod cloud;
pub mod firestore;
mod file;

use clubcal_core::{EventDocument, OrgConfig};
use clubcal_providers::BoxFuture;

use crate::config::{DeploymentMode, SyncConfig};
use crate::error::SyncResult;

pub use cloud::CloudStorage;
pub use file::FileStorage;

/// Object name of the published document, relative to the org prefix.
pub const EVENTS_FILE_NAME: &str = "events.json";

/// Persistence for one deployment.
///
/// Methods take the organization id on every call so one backend instance
/// can serve several organizations.
pub trait StorageBackend: Send + Sync {
    /// Returns the backend name (e.g., "file", "google_cloud").
    fn name(&self) -> &str;

    /// Loads an organization's config, or the default when none is stored.
    fn load_config<'a>(&'a self, org_id: &'a str) -> BoxFuture<'a, SyncResult<OrgConfig>>;

    /// Replaces an organization's config. Always written in camelCase.
    fn save_config<'a>(
        &'a self,
        org_id: &'a str,
        config: &'a OrgConfig,
    ) -> BoxFuture<'a, SyncResult<()>>;

    /// Publishes the event document and returns its retrieval URL.
    fn save_events<'a>(
        &'a self,
        org_id: &'a str,
        document: &'a EventDocument,
    ) -> BoxFuture<'a, SyncResult<String>>;

    /// Reads back the published document, if there is one.
    fn load_events<'a>(
        &'a self,
        org_id: &'a str,
    ) -> BoxFuture<'a, SyncResult<Option<EventDocument>>>;

    /// Describes where an organization's config lives.
    fn config_location(&self, org_id: &str) -> String;
}

/// Creates the backend selected by the deployment mode.
pub fn create_storage(config: &SyncConfig) -> SyncResult<Box<dyn StorageBackend>> {
    config.validate_storage()?;
    match config.deployment {
        DeploymentMode::GoogleCloud => Ok(Box::new(CloudStorage::new(&config.google_cloud)?)),
        DeploymentMode::CustomServer => Ok(Box::new(FileStorage::new(&config.custom_server)?)),
    }
}

/// Returns the object path of an organization's event document.
pub fn events_object_name(org_id: &str) -> String {
    format!("{}/{}", org_id, EVENTS_FILE_NAME)
}
