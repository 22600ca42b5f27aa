//! Local filesystem backend.
//!
//! Layout:
//! - org config: a single JSON file at the configured path
//! - event document: `{data_dir}/{org_id}/events.json`

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use clubcal_core::{EventDocument, OrgConfig};
use clubcal_providers::BoxFuture;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info};

use super::{EVENTS_FILE_NAME, StorageBackend};
use crate::config::{CustomServerSettings, validate_org_id};
use crate::error::{SyncError, SyncResult};

/// Filesystem storage for a custom server deployment.
#[derive(Debug, Clone)]
pub struct FileStorage {
    data_dir: PathBuf,
    config_file: PathBuf,
    base_url: Option<String>,
}

impl FileStorage {
    /// Creates the backend, creating the data directory if needed.
    pub fn new(settings: &CustomServerSettings) -> SyncResult<Self> {
        std::fs::create_dir_all(&settings.data_dir)?;
        Ok(Self {
            data_dir: settings.data_dir.clone(),
            config_file: settings.config_file.clone(),
            base_url: settings
                .base_url
                .as_deref()
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
        })
    }

    /// Returns the path of an organization's event document.
    pub fn events_path(&self, org_id: &str) -> PathBuf {
        self.data_dir.join(org_id).join(EVENTS_FILE_NAME)
    }

    /// Returns the retrieval URL of an organization's event document.
    fn events_url(&self, org_id: &str, path: &Path) -> SyncResult<String> {
        match &self.base_url {
            Some(base) => Ok(format!("{}/data/{}/{}", base, org_id, EVENTS_FILE_NAME)),
            None => Ok(std::path::absolute(path)?.display().to_string()),
        }
    }

    async fn read_config(&self) -> SyncResult<OrgConfig> {
        match fs::read_to_string(&self.config_file).await {
            Ok(content) => Ok(OrgConfig::from_json(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.config_file.display(), "no org config file, using defaults");
                Ok(OrgConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn read_events(&self, org_id: &str) -> SyncResult<Option<EventDocument>> {
        validate_org_id(org_id)?;
        match fs::read_to_string(self.events_path(org_id)).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_events(&self, org_id: &str, document: &EventDocument) -> SyncResult<String> {
        validate_org_id(org_id)?;
        let path = self.events_path(org_id);
        write_json_atomic(&path, document).await?;
        info!(path = %path.display(), events = document.event_count, "saved events");
        self.events_url(org_id, &path)
    }

    async fn write_config(&self, config: &OrgConfig) -> SyncResult<()> {
        write_json_atomic(&self.config_file, &config.to_value()?).await?;
        info!(path = %self.config_file.display(), "saved org config");
        Ok(())
    }
}

impl StorageBackend for FileStorage {
    fn name(&self) -> &str {
        "file"
    }

    fn load_config<'a>(&'a self, _org_id: &'a str) -> BoxFuture<'a, SyncResult<OrgConfig>> {
        Box::pin(self.read_config())
    }

    fn save_config<'a>(
        &'a self,
        _org_id: &'a str,
        config: &'a OrgConfig,
    ) -> BoxFuture<'a, SyncResult<()>> {
        Box::pin(self.write_config(config))
    }

    fn save_events<'a>(
        &'a self,
        org_id: &'a str,
        document: &'a EventDocument,
    ) -> BoxFuture<'a, SyncResult<String>> {
        Box::pin(self.write_events(org_id, document))
    }

    fn load_events<'a>(
        &'a self,
        org_id: &'a str,
    ) -> BoxFuture<'a, SyncResult<Option<EventDocument>>> {
        Box::pin(self.read_events(org_id))
    }

    fn config_location(&self, _org_id: &str) -> String {
        self.config_file.display().to_string()
    }
}

/// Writes pretty JSON to a uniquely named temp file next to `path`, then
/// renames it over `path`. Parent directories are created.
async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> SyncResult<()> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent.to_path_buf(),
        None => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).await?;

    let content = serde_json::to_vec_pretty(value)?;
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> SyncResult<()> {
        let mut temp = tempfile::Builder::new()
            .prefix(".clubcal-")
            .suffix(".json.tmp")
            .tempfile_in(&dir)?;
        temp.write_all(&content)?;
        temp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| SyncError::storage_with("atomic write task failed", e))?
}
