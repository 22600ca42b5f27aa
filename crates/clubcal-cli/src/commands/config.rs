//! Org config commands.

use std::path::Path;

use clubcal_core::OrgConfig;
use clubcal_sync::{StorageBackend, SyncConfig, create_storage};

use crate::error::{CliError, CliResult};

/// Prints the stored org config.
pub async fn show(config: &SyncConfig) -> CliResult<()> {
    let storage = create_storage(config)?;
    println!("{}", render(storage.as_ref(), &config.org_id).await?);
    Ok(())
}

/// Validates a JSON org config file and stores it.
pub async fn push(config: &SyncConfig, file: &Path) -> CliResult<()> {
    let storage = create_storage(config)?;
    let org_config = read_org_config(file).await?;
    storage.save_config(&config.org_id, &org_config).await?;
    println!(
        "Saved {} rule(s) to {}",
        org_config.rules.len(),
        storage.config_location(&config.org_id)
    );
    Ok(())
}

/// Prints where the org config is stored.
pub fn path(config: &SyncConfig) -> CliResult<()> {
    let storage = create_storage(config)?;
    println!("config: {}", storage.config_location(&config.org_id));
    Ok(())
}

async fn render(storage: &dyn StorageBackend, org_id: &str) -> CliResult<String> {
    let org_config = storage.load_config(org_id).await?;
    Ok(serde_json::to_string_pretty(&org_config.to_value()?)?)
}

async fn read_org_config(file: &Path) -> CliResult<OrgConfig> {
    let content = tokio::fs::read_to_string(file).await.map_err(|e| {
        CliError::OrgConfig(format!("failed to read {}: {}", file.display(), e))
    })?;
    OrgConfig::from_json(&content)
        .map_err(|e| CliError::OrgConfig(format!("{}: {}", file.display(), e)))
}
