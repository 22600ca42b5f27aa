//! clubcal CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use clubcal_cli::cli::{Cli, Command, ConfigAction};
use clubcal_cli::commands;
use clubcal_cli::error::CliResult;
use clubcal_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let mut tracing_config = TracingConfig::default().with_format(cli.log_format);
    if cli.debug {
        tracing_config = tracing_config.with_env_filter(format!("clubcal={}", Level::DEBUG));
    }
    init_tracing(tracing_config)?;

    let config = cli.resolve_config()?;

    match cli.command {
        None | Some(Command::Sync) => commands::sync::run(&config, cli.json).await,
        Some(Command::Serve) => commands::serve::run(&config).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Show => commands::config::show(&config).await,
            ConfigAction::Push { file } => commands::config::push(&config, &file).await,
            ConfigAction::Path => commands::config::path(&config),
        },
    }
}
