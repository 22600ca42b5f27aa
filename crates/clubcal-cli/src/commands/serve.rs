//! Serve command: runs the HTTP trigger in the foreground.

use clubcal_sync::{SyncConfig, SyncRunner, trigger};
use tracing::info;

use crate::error::CliResult;

/// Builds the runner and serves until Ctrl-C.
///
/// Missing credentials or storage settings fail here, before the listener
/// is bound.
pub async fn run(config: &SyncConfig) -> CliResult<()> {
    let runner = SyncRunner::from_config(config)?;
    info!(
        org_id = %config.org_id,
        deployment = %config.deployment,
        bind = %config.server.bind,
        "starting trigger server"
    );
    trigger::serve(&config.server.bind, runner).await?;
    Ok(())
}
