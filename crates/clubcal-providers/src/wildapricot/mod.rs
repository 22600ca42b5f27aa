//! Wild Apricot event source.
//!
//! This module provides a [`WildApricotSource`] that lists events from the
//! Wild Apricot admin API.
//!
//! # Authentication Flow
//!
//! 1. The API key is sent as the password of HTTP basic auth (user `APIKEY`)
//!    to the token endpoint with `grant_type=client_credentials&scope=auto`
//! 2. The returned bearer token is cached until 60 seconds before expiry
//! 3. Event listing requests carry the token as `Authorization: Bearer`
//!
//! # Example
//!
//! ```ignore
//! use clubcal_providers::{EventSource, FetchOptions, WildApricotConfig, WildApricotSource};
//!
//! let source = WildApricotSource::new(WildApricotConfig::new("12345", api_key))?;
//! let records = source.fetch_events(FetchOptions::new(since)).await?;
//! ```

mod client;
mod config;
mod provider;

pub use client::{EventsPage, WildApricotClient};
pub use config::{DEFAULT_API_BASE, DEFAULT_TIMEOUT, DEFAULT_TOKEN_URL, WildApricotConfig};
pub use provider::WildApricotSource;
