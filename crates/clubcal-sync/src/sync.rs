//! Sync orchestrator.
//!
//! One run: load the org config, list events, drop cancelled ones,
//! normalize the rest (skipping any that fail), publish the document and
//! report a [`SyncSummary`].

use chrono::{DateTime, NaiveDate, Utc};
use clubcal_core::{EventDocument, SyncSummary};
use clubcal_providers::{
    EventSource, FetchOptions, NormalizeOptions, WildApricotSource, is_cancelled_name,
    normalize_event, record_id, record_name,
};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::storage::{StorageBackend, create_storage};

/// Runs syncs for one organization.
pub struct SyncRunner {
    source: Box<dyn EventSource>,
    storage: Box<dyn StorageBackend>,
    org_id: String,
    include_past_days: u32,
    options: NormalizeOptions,
}

impl SyncRunner {
    /// Creates a runner from explicit parts.
    pub fn new(
        source: Box<dyn EventSource>,
        storage: Box<dyn StorageBackend>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            source,
            storage,
            org_id: config.org_id.clone(),
            include_past_days: config.include_past_days,
            options: config.normalize_options(),
        }
    }

    /// Creates a runner with the Wild Apricot source and the configured
    /// storage backend.
    ///
    /// Credentials are checked first; nothing is contacted if they are missing.
    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        config.validate_credentials()?;
        let storage = create_storage(config)?;
        let source = WildApricotSource::new(config.wild_apricot_config())?;
        Ok(Self::new(Box::new(source), storage, config))
    }

    /// Returns the storage backend.
    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    /// Listing options for a run on `today`.
    fn fetch_options(&self, today: NaiveDate) -> SyncResult<FetchOptions> {
        FetchOptions::from_today(today, self.include_past_days).ok_or_else(|| {
            SyncError::config(format!(
                "include_past_days {} reaches before the earliest supported date",
                self.include_past_days
            ))
        })
    }

    /// Runs one sync now.
    pub async fn run(&self) -> SyncResult<SyncSummary> {
        self.run_at(Utc::now()).await
    }

    /// Runs one sync as if the current time were `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> SyncResult<SyncSummary> {
        info!(
            org_id = %self.org_id,
            source = self.source.name(),
            storage = self.storage.name(),
            "starting sync"
        );

        let options = self.fetch_options(now.date_naive())?;

        let config = self.storage.load_config(&self.org_id).await?;
        debug!(rules = config.rules.len(), "loaded org config");

        let records = self.source.fetch_events(options).await?;
        let fetched = records.len();

        let mut events = Vec::with_capacity(fetched);
        let mut cancelled = 0;
        let mut skipped = 0;
        for record in records {
            if record_name(&record).is_some_and(is_cancelled_name) {
                cancelled += 1;
                continue;
            }

            let id = record_id(&record);
            match normalize_event(record, &config, &self.options) {
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!(event_id = %id, error = %e, "skipping event");
                    skipped += 1;
                }
            }
        }

        let document = EventDocument::new(&self.org_id, now, events);
        let url = self.storage.save_events(&self.org_id, &document).await?;

        info!(
            org_id = %self.org_id,
            fetched,
            cancelled,
            skipped,
            published = document.event_count,
            %url,
            "sync complete"
        );
        Ok(SyncSummary::from_document(&document, url))
    }
}
