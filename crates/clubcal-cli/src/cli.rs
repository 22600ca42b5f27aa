//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clubcal_core::TracingOutputFormat;
use clubcal_sync::{DeploymentMode, SyncConfig};

use crate::error::CliResult;

/// clubcal - Publish club events as a tagged JSON feed
#[derive(Debug, Parser)]
#[command(name = "clubcal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, short, env = "CLUBCAL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log format: compact, pretty or json
    #[arg(long, default_value = "compact", global = true)]
    pub log_format: TracingOutputFormat,

    /// Print the sync summary as JSON
    #[arg(long, global = true)]
    pub json: bool,

    // --- Deployment ---
    /// Storage deployment: google_cloud or custom_server
    #[arg(long, env = "CLUBCAL_DEPLOYMENT", global = true)]
    pub deployment: Option<DeploymentMode>,

    /// Organization id (config key and output namespace)
    #[arg(long, env = "CLUBCAL_ORG_ID", global = true)]
    pub org_id: Option<String>,

    /// Also list events that started up to N days ago
    #[arg(long, env = "CLUBCAL_INCLUDE_PAST_DAYS", global = true)]
    pub include_past_days: Option<u32>,

    /// Event page URL used when the source omits one (`{id}` is replaced)
    #[arg(long, env = "CLUBCAL_EVENT_URL_TEMPLATE", global = true)]
    pub event_url_template: Option<String>,

    // --- Wild Apricot ---
    /// Wild Apricot account id
    #[arg(long, env = "WA_ACCOUNT_ID", global = true)]
    pub account_id: Option<String>,

    /// Wild Apricot API key
    #[arg(long, env = "WA_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    // --- Google Cloud ---
    /// Google Cloud project id
    #[arg(long, env = "GCP_PROJECT_ID", global = true)]
    pub project_id: Option<String>,

    /// Cloud Storage bucket for the event document
    #[arg(long, env = "GCS_BUCKET", global = true)]
    pub bucket: Option<String>,

    /// Firestore collection holding org configs
    #[arg(long, env = "FIRESTORE_COLLECTION", global = true)]
    pub collection: Option<String>,

    // --- Custom server ---
    /// Directory for published event documents
    #[arg(long, env = "CLUBCAL_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Org config JSON file
    #[arg(long, env = "CLUBCAL_CONFIG_FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Public base URL the data directory is served under
    #[arg(long, env = "CLUBCAL_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Address for `serve` to listen on
    #[arg(long, env = "CLUBCAL_BIND", global = true)]
    pub bind: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Loads the config file (if any) and applies flag overrides.
    pub fn resolve_config(&self) -> CliResult<SyncConfig> {
        let mut config = SyncConfig::load_optional(self.config.as_deref())?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    /// Overwrites every config field that was given on the command line or
    /// in the environment.
    pub fn apply_overrides(&self, config: &mut SyncConfig) {
        if let Some(deployment) = self.deployment {
            config.deployment = deployment;
        }
        set(&mut config.org_id, &self.org_id);
        if let Some(days) = self.include_past_days {
            config.include_past_days = days;
        }
        set(&mut config.event_url_template, &self.event_url_template);

        set(&mut config.wild_apricot.account_id, &self.account_id);
        set(&mut config.wild_apricot.api_key, &self.api_key);

        set(&mut config.google_cloud.project_id, &self.project_id);
        set(&mut config.google_cloud.bucket, &self.bucket);
        set(&mut config.google_cloud.collection, &self.collection);

        set(&mut config.custom_server.data_dir, &self.data_dir);
        set(&mut config.custom_server.config_file, &self.config_file);
        if let Some(ref base_url) = self.base_url {
            config.custom_server.base_url = Some(base_url.clone());
        }

        set(&mut config.server.bind, &self.bind);
    }
}

fn set<T: Clone>(field: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *field = value.clone();
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one sync (default)
    Sync,

    /// Serve the HTTP trigger
    Serve,

    /// Organization config commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Org config actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the stored org config (defaults when none is stored)
    Show,

    /// Validate a JSON org config file and store it
    Push {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// Show where the org config is stored
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("clubcal").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_subcommand_means_sync() {
        let cli = parse(&[]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log_format, TracingOutputFormat::Compact);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["sync", "--json", "--org-id", "acme"]);
        assert!(matches!(cli.command, Some(Command::Sync)));
        assert!(cli.json);
        assert_eq!(cli.org_id.as_deref(), Some("acme"));
    }

    #[test]
    fn config_push_takes_file() {
        let cli = parse(&["config", "push", "rules.json"]);
        match cli.command {
            Some(Command::Config {
                action: ConfigAction::Push { file },
            }) => assert_eq!(file, PathBuf::from("rules.json")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn deployment_and_log_format_parse() {
        let cli = parse(&["--deployment", "google-cloud", "--log-format", "json"]);
        assert_eq!(cli.deployment, Some(DeploymentMode::GoogleCloud));
        assert_eq!(cli.log_format, TracingOutputFormat::Json);
    }

    #[test]
    fn unknown_deployment_is_rejected() {
        let result = Cli::try_parse_from(["clubcal", "--deployment", "azure"]);
        assert!(result.is_err());
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = SyncConfig::from_toml(
            r#"
            org_id = "from-file"
            include_past_days = 2

            [wild_apricot]
            account_id = "111"
            api_key = "file-key"

            [custom_server]
            base_url = "https://file.example.org"
            "#,
        )
        .unwrap();

        let cli = parse(&[
            "--org-id",
            "acme",
            "--account-id",
            "222",
            "--data-dir",
            "/srv/clubcal",
            "--bind",
            "127.0.0.1:9000",
        ]);
        cli.apply_overrides(&mut config);

        assert_eq!(config.org_id, "acme");
        assert_eq!(config.include_past_days, 2);
        assert_eq!(config.wild_apricot.account_id, "222");
        assert_eq!(config.wild_apricot.api_key, "file-key");
        assert_eq!(config.custom_server.data_dir, PathBuf::from("/srv/clubcal"));
        assert_eq!(
            config.custom_server.base_url.as_deref(),
            Some("https://file.example.org")
        );
        assert_eq!(config.server.bind, "127.0.0.1:9000");
    }

    #[test]
    fn resolve_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clubcal.toml");
        std::fs::write(&path, "deployment = \"google_cloud\"\n[google_cloud]\nbucket = \"b\"\n")
            .unwrap();

        let cli = parse(&["--config", path.to_str().unwrap(), "--project-id", "p"]);
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.deployment, DeploymentMode::GoogleCloud);
        assert_eq!(config.google_cloud.bucket, "b");
        assert_eq!(config.google_cloud.project_id, "p");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = parse(&["--config", "/nonexistent/clubcal.toml"]);
        let err = cli.resolve_config().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/clubcal.toml"));
    }
}
