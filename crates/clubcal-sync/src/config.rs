//! Sync configuration.
//!
//! Settings come from an optional TOML file and are then overridden field by
//! field from command-line flags and environment variables (see the CLI).
//!
//! ```toml
//! deployment = "custom_server"
//! org_id = "sbnewcomers"
//! include_past_days = 0
//! event_url_template = "https://sbnewcomers.org/event-{id}"
//!
//! [wild_apricot]
//! account_id = "123456"
//! api_key = "..."
//!
//! [custom_server]
//! data_dir = "/srv/clubcal/data"
//! config_file = "/srv/clubcal/data/config.json"
//! base_url = "https://calendar.example.org"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use clubcal_providers::wildapricot::{DEFAULT_API_BASE, DEFAULT_TOKEN_URL};
use clubcal_providers::{
    DEFAULT_EVENT_URL_TEMPLATE, NormalizeOptions, WildApricotConfig,
};
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// Where configuration and output are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMode {
    /// Firestore for org config, Cloud Storage for the event document.
    GoogleCloud,
    /// Local filesystem.
    #[default]
    CustomServer,
}

impl DeploymentMode {
    /// Returns the configuration spelling of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoogleCloud => "google_cloud",
            Self::CustomServer => "custom_server",
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "google_cloud" | "gcp" => Ok(Self::GoogleCloud),
            "custom_server" | "local" => Ok(Self::CustomServer),
            other => Err(format!(
                "unknown deployment mode '{}' (expected google_cloud or custom_server)",
                other
            )),
        }
    }
}

/// Top-level sync configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Storage backend selection.
    pub deployment: DeploymentMode,

    /// Organization whose events are synced.
    pub org_id: String,

    /// Days before today to include in the listing.
    pub include_past_days: u32,

    /// URL for events without one; `{id}` is replaced with the event id.
    pub event_url_template: String,

    /// Wild Apricot credentials and endpoints.
    pub wild_apricot: WildApricotSettings,

    /// Google Cloud storage settings.
    pub google_cloud: GoogleCloudSettings,

    /// Filesystem storage settings.
    pub custom_server: CustomServerSettings,

    /// HTTP trigger settings.
    pub server: ServerSettings,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            deployment: DeploymentMode::default(),
            org_id: "default".to_string(),
            include_past_days: 0,
            event_url_template: DEFAULT_EVENT_URL_TEMPLATE.to_string(),
            wild_apricot: WildApricotSettings::default(),
            google_cloud: GoogleCloudSettings::default(),
            custom_server: CustomServerSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

/// Wild Apricot settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WildApricotSettings {
    /// Account identifier.
    pub account_id: String,

    /// API key.
    pub api_key: String,

    /// Admin API base URL.
    pub api_base: String,

    /// OAuth token endpoint.
    pub token_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for WildApricotSettings {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            api_key: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for WildApricotSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() {
            ""
        } else {
            "<redacted>"
        };
        f.debug_struct("WildApricotSettings")
            .field("account_id", &self.account_id)
            .field("api_key", &api_key)
            .field("api_base", &self.api_base)
            .field("token_url", &self.token_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Google Cloud settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleCloudSettings {
    /// Project holding the Firestore database.
    pub project_id: String,

    /// Bucket receiving `{org_id}/events.json`.
    pub bucket: String,

    /// Firestore collection holding one config document per organization.
    pub collection: String,

    /// Firestore REST endpoint.
    pub firestore_endpoint: String,

    /// Cloud Storage endpoint, also the base of public object URLs.
    pub storage_endpoint: String,

    /// Metadata server issuing access tokens.
    pub metadata_endpoint: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GoogleCloudSettings {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            bucket: String::new(),
            collection: "clubcal_config".to_string(),
            firestore_endpoint: "https://firestore.googleapis.com/v1".to_string(),
            storage_endpoint: "https://storage.googleapis.com".to_string(),
            metadata_endpoint: "http://metadata.google.internal".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Filesystem settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomServerSettings {
    /// Directory receiving `{org_id}/events.json`.
    pub data_dir: PathBuf,

    /// Org config JSON file.
    pub config_file: PathBuf,

    /// Public base URL the data directory is served under, as `{base_url}/data`.
    pub base_url: Option<String>,
}

impl Default for CustomServerSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            config_file: PathBuf::from("./data/config.json"),
            base_url: None,
        }
    }
}

/// HTTP trigger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address.
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

impl SyncConfig {
    /// Loads configuration from a TOML file.
    pub fn load_from(path: &Path) -> SyncResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| SyncError::config(format!("{}: {}", path.display(), e)))
    }

    /// Loads configuration from a file if given, defaults otherwise.
    pub fn load_optional(path: Option<&Path>) -> SyncResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Checks the upstream credentials. Called before any I/O.
    pub fn validate_credentials(&self) -> SyncResult<()> {
        if self.wild_apricot.account_id.trim().is_empty() {
            return Err(SyncError::config("WA_ACCOUNT_ID is required"));
        }
        if self.wild_apricot.api_key.trim().is_empty() {
            return Err(SyncError::config("WA_API_KEY is required"));
        }
        Ok(())
    }

    /// Checks the organization id and the settings of the selected backend.
    pub fn validate_storage(&self) -> SyncResult<()> {
        validate_org_id(&self.org_id)?;
        if self.deployment == DeploymentMode::GoogleCloud {
            if self.google_cloud.project_id.trim().is_empty() {
                return Err(SyncError::config(
                    "GCP_PROJECT_ID is required for google_cloud deployment",
                ));
            }
            if self.google_cloud.bucket.trim().is_empty() {
                return Err(SyncError::config(
                    "GCS_BUCKET is required for google_cloud deployment",
                ));
            }
        }
        Ok(())
    }

    /// Builds the Wild Apricot source configuration.
    pub fn wild_apricot_config(&self) -> WildApricotConfig {
        let settings = &self.wild_apricot;
        WildApricotConfig::new(&settings.account_id, &settings.api_key)
            .with_api_base(&settings.api_base)
            .with_token_url(&settings.token_url)
            .with_timeout(Duration::from_secs(settings.timeout_secs))
    }

    /// Builds the normalization options.
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions::new(&self.event_url_template)
    }
}

/// Checks that an organization id is usable as a single path segment.
pub fn validate_org_id(org_id: &str) -> SyncResult<()> {
    let valid = !org_id.is_empty()
        && org_id != "."
        && org_id != ".."
        && org_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(SyncError::config(format!(
            "invalid organization id '{}' (use letters, digits, '-', '_' or '.')",
            org_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.deployment, DeploymentMode::CustomServer);
        assert_eq!(config.org_id, "default");
        assert_eq!(config.include_past_days, 0);
        assert_eq!(config.event_url_template, "/event-{id}");
        assert_eq!(config.google_cloud.collection, "clubcal_config");
        assert_eq!(config.custom_server.data_dir, PathBuf::from("./data"));
        assert_eq!(
            config.custom_server.config_file,
            PathBuf::from("./data/config.json")
        );
        assert_eq!(config.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn parses_partial_toml() {
        let config = SyncConfig::from_toml(
            r#"
            deployment = "google_cloud"
            org_id = "sbnewcomers"

            [wild_apricot]
            account_id = "123"

            [google_cloud]
            project_id = "club-project"
            bucket = "club-bucket"
            "#,
        )
        .unwrap();

        assert_eq!(config.deployment, DeploymentMode::GoogleCloud);
        assert_eq!(config.org_id, "sbnewcomers");
        assert_eq!(config.wild_apricot.account_id, "123");
        assert_eq!(config.wild_apricot.timeout_secs, 30);
        assert_eq!(config.google_cloud.collection, "clubcal_config");
        assert!(config.validate_storage().is_ok());
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(SyncConfig::from_toml(r#"deployment = "azure""#).is_err());
    }

    #[test]
    fn load_from_missing_file_is_config_error() {
        let err = SyncConfig::load_from(Path::new("/nonexistent/clubcal.toml")).unwrap_err();
        assert!(matches!(err, SyncError::Config { .. }));
    }

    #[test]
    fn mode_from_str() {
        assert_eq!("google_cloud".parse::<DeploymentMode>(), Ok(DeploymentMode::GoogleCloud));
        assert_eq!("Google-Cloud".parse::<DeploymentMode>(), Ok(DeploymentMode::GoogleCloud));
        assert_eq!("custom_server".parse::<DeploymentMode>(), Ok(DeploymentMode::CustomServer));
        assert!("ftp".parse::<DeploymentMode>().is_err());
    }

    #[test]
    fn credentials_required() {
        let mut config = SyncConfig::default();
        let err = config.validate_credentials().unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: WA_ACCOUNT_ID is required");

        config.wild_apricot.account_id = "123".into();
        let err = config.validate_credentials().unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: WA_API_KEY is required");

        config.wild_apricot.api_key = "key".into();
        assert!(config.validate_credentials().is_ok());
    }

    #[test]
    fn google_cloud_requires_project_and_bucket() {
        let config = SyncConfig {
            deployment: DeploymentMode::GoogleCloud,
            ..SyncConfig::default()
        };
        assert!(config.validate_storage().is_err());
    }

    #[test]
    fn org_id_validation() {
        assert!(validate_org_id("sbnewcomers").is_ok());
        assert!(validate_org_id("club-2.west_side").is_ok());
        assert!(validate_org_id("").is_err());
        assert!(validate_org_id("..").is_err());
        assert!(validate_org_id("../etc").is_err());
        assert!(validate_org_id("a/b").is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = SyncConfig::default();
        config.wild_apricot.api_key = "hunter2".into();
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn derived_options() {
        let mut config = SyncConfig::default();
        config.event_url_template = "https://club.example.org/e/{id}".into();

        assert_eq!(
            config.normalize_options().event_url_template,
            "https://club.example.org/e/{id}"
        );
    }
}
