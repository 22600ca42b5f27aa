//! Google Cloud backend: Firestore for org config, Cloud Storage for the
//! published document.
//!
//! Both services are called through their REST APIs with a bearer token
//! from the instance metadata server, so the backend only works where a
//! service account is attached (Cloud Run, Cloud Functions, GCE).

use std::time::Duration;

use clubcal_core::{EventDocument, OrgConfig};
use clubcal_providers::tokens::valid_value;
use clubcal_providers::{AccessToken, BoxFuture, TokenCache};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::firestore::{decode_document, encode_document};
use super::{StorageBackend, events_object_name};
use crate::config::{GoogleCloudSettings, validate_org_id};
use crate::error::{SyncError, SyncResult};

const METADATA_TOKEN_PATH: &str =
    "/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: i64,
}

/// Firestore + Cloud Storage backend.
#[derive(Debug)]
pub struct CloudStorage {
    http_client: reqwest::Client,
    settings: GoogleCloudSettings,
    tokens: TokenCache,
}

impl CloudStorage {
    /// Creates the backend. No request is made until first use.
    pub fn new(settings: &GoogleCloudSettings) -> SyncResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| SyncError::storage_with("failed to create HTTP client", e))?;

        let mut settings = settings.clone();
        for endpoint in [
            &mut settings.firestore_endpoint,
            &mut settings.storage_endpoint,
            &mut settings.metadata_endpoint,
        ] {
            let trimmed = endpoint.trim_end_matches('/').len();
            endpoint.truncate(trimmed);
        }

        Ok(Self {
            http_client,
            settings,
            tokens: TokenCache::new(),
        })
    }

    /// Returns the public URL of an organization's event document.
    pub fn public_url(&self, org_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.settings.storage_endpoint,
            self.settings.bucket,
            events_object_name(org_id)
        )
    }

    fn document_url(&self, org_id: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}/{}",
            self.settings.firestore_endpoint,
            urlencoding::encode(&self.settings.project_id),
            urlencoding::encode(&self.settings.collection),
            urlencoding::encode(org_id)
        )
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/upload/storage/v1/b/{}/o",
            self.settings.storage_endpoint,
            urlencoding::encode(&self.settings.bucket)
        )
    }

    fn object_url(&self, org_id: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}",
            self.settings.storage_endpoint,
            urlencoding::encode(&self.settings.bucket),
            urlencoding::encode(&events_object_name(org_id))
        )
    }

    /// Returns a valid access token, asking the metadata server when needed.
    async fn access_token(&self) -> SyncResult<String> {
        let mut slot = self.tokens.lock().await;
        if let Some(token) = valid_value(&slot) {
            return Ok(token);
        }

        debug!("requesting access token from metadata server");
        let url = format!("{}{}", self.settings.metadata_endpoint, METADATA_TOKEN_PATH);
        let response = self
            .http_client
            .get(url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| SyncError::storage_with("metadata server unreachable", e))?;
        let response = check_status(response, "metadata token request").await?;
        let token: MetadataToken = response
            .json()
            .await
            .map_err(|e| SyncError::storage_with("invalid metadata token response", e))?;

        let token = AccessToken::new(token.access_token, token.expires_in);
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }

    async fn read_config(&self, org_id: &str) -> SyncResult<OrgConfig> {
        validate_org_id(org_id)?;
        let token = self.access_token().await?;
        let response = self
            .http_client
            .get(self.document_url(org_id))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| SyncError::storage_with("Firestore request failed", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(org_id, "no org config document, using defaults");
            return Ok(OrgConfig::default());
        }
        let response = check_status(response, "Firestore get").await?;
        let document: Value = response
            .json()
            .await
            .map_err(|e| SyncError::storage_with("invalid Firestore document", e))?;

        Ok(OrgConfig::from_value(decode_document(&document)?)?)
    }

    async fn write_config(&self, org_id: &str, config: &OrgConfig) -> SyncResult<()> {
        validate_org_id(org_id)?;
        let Value::Object(fields) = config.to_value()? else {
            return Err(SyncError::storage("org config did not serialize to an object"));
        };
        let token = self.access_token().await?;
        let response = self
            .http_client
            .patch(self.document_url(org_id))
            .bearer_auth(&token)
            .json(&encode_document(&fields))
            .send()
            .await
            .map_err(|e| SyncError::storage_with("Firestore request failed", e))?;
        check_status(response, "Firestore write").await?;

        info!(org_id, collection = %self.settings.collection, "saved org config");
        Ok(())
    }

    async fn write_events(&self, org_id: &str, document: &EventDocument) -> SyncResult<String> {
        validate_org_id(org_id)?;
        let body = serde_json::to_string_pretty(document)?;
        let token = self.access_token().await?;
        let object_name = events_object_name(org_id);
        let response = self
            .http_client
            .post(self.upload_url())
            .bearer_auth(&token)
            .query(&[
                ("uploadType", "media"),
                ("name", object_name.as_str()),
                ("predefinedAcl", "publicRead"),
            ])
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| SyncError::storage_with("Cloud Storage upload failed", e))?;
        check_status(response, "Cloud Storage upload").await?;

        let url = self.public_url(org_id);
        info!(%url, events = document.event_count, "saved events");
        Ok(url)
    }

    async fn read_events(&self, org_id: &str) -> SyncResult<Option<EventDocument>> {
        validate_org_id(org_id)?;
        let token = self.access_token().await?;
        let response = self
            .http_client
            .get(self.object_url(org_id))
            .bearer_auth(&token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| SyncError::storage_with("Cloud Storage download failed", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response, "Cloud Storage download").await?;
        let body = response
            .text()
            .await
            .map_err(|e| SyncError::storage_with("failed to read object body", e))?;
        Ok(Some(serde_json::from_str(&body)?))
    }
}

impl StorageBackend for CloudStorage {
    fn name(&self) -> &str {
        "google_cloud"
    }

    fn load_config<'a>(&'a self, org_id: &'a str) -> BoxFuture<'a, SyncResult<OrgConfig>> {
        Box::pin(self.read_config(org_id))
    }

    fn save_config<'a>(
        &'a self,
        org_id: &'a str,
        config: &'a OrgConfig,
    ) -> BoxFuture<'a, SyncResult<()>> {
        Box::pin(self.write_config(org_id, config))
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

    fn config_location(&self, org_id: &str) -> String {
        format!(
            "firestore://{}/{}/{}",
            self.settings.project_id, self.settings.collection, org_id
        )
    }
}

async fn check_status(response: reqwest::Response, context: &str) -> SyncResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    Err(SyncError::storage(if body.is_empty() {
        format!("{} returned HTTP {}", context, status.as_u16())
    } else {
        format!("{} returned HTTP {}: {}", context, status.as_u16(), body)
    }))
}
