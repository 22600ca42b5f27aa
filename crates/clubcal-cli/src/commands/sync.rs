//! Sync command: one run, summary on stdout.

use clubcal_core::SyncSummary;
use clubcal_sync::{SyncConfig, SyncRunner};

use crate::error::CliResult;

/// Runs one sync and prints the summary.
pub async fn run(config: &SyncConfig, json: bool) -> CliResult<()> {
    let runner = SyncRunner::from_config(config)?;
    let summary = runner.run().await?;
    println!("{}", render(&summary, json)?);
    Ok(())
}

/// Formats a summary for the terminal, or as pretty JSON.
pub fn render(summary: &SyncSummary, json: bool) -> CliResult<String> {
    if json {
        return Ok(serde_json::to_string_pretty(summary)?);
    }
    Ok(format!(
        "Success: Synced {} events\nOutput: {}",
        summary.event_count, summary.url
    ))
}
