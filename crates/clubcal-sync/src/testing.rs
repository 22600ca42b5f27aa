//! Test doubles shared by the orchestrator and trigger tests.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use clubcal_providers::{BoxFuture, EventSource, FetchOptions, ProviderError, ProviderResult};
use serde_json::Value;
use tempfile::TempDir;

use crate::config::{CustomServerSettings, SyncConfig};
use crate::storage::FileStorage;
use crate::sync::SyncRunner;

/// Source returning canned records and recording the options it was given.
pub struct StaticSource {
    records: Vec<Value>,
    fail: bool,
    seen: Arc<Mutex<Vec<FetchOptions>>>,
}

impl StaticSource {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records,
            fail: false,
            seen: Arc::default(),
        }
    }

    /// A source whose listing always answers HTTP 500.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn seen(&self) -> Arc<Mutex<Vec<FetchOptions>>> {
        Arc::clone(&self.seen)
    }
}

impl EventSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch_events(&self, options: FetchOptions) -> BoxFuture<'_, ProviderResult<Vec<Value>>> {
        self.seen.lock().unwrap().push(options);
        Box::pin(async move {
            if self.fail {
                Err(ProviderError::from_status(500, "event listing", "down").with_provider("static"))
            } else {
                Ok(self.records.clone())
            }
        })
    }
}

/// 2024-03-10 15:30 UTC, a Sunday.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 15, 30, 0).unwrap()
}

/// Config for org `acme` with file storage under `dir`.
pub fn file_config(dir: &TempDir) -> (SyncConfig, FileStorage) {
    let mut config = SyncConfig::default();
    config.org_id = "acme".into();
    config.event_url_template = "https://acme.example.org/event-{id}".into();
    config.custom_server = CustomServerSettings {
        data_dir: dir.path().join("data"),
        config_file: dir.path().join("data/config.json"),
        base_url: Some("https://cal.example.org".into()),
    };
    let storage = FileStorage::new(&config.custom_server).unwrap();
    (config, storage)
}

/// Runner over `source` with file storage under `dir`.
pub fn file_runner(dir: &TempDir, source: StaticSource) -> SyncRunner {
    let (config, storage) = file_config(dir);
    SyncRunner::new(Box::new(source), Box::new(storage), &config)
}
