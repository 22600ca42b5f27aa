//! CLI for clubcal
//!
//! This crate provides the `clubcal` command: a one-shot sync, the HTTP
//! trigger server, and org config management.

pub mod cli;
pub mod commands;
pub mod error;

pub use cli::Cli;
pub use error::{CliError, CliResult};
