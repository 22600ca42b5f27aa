//! Wild Apricot source configuration.

use std::time::Duration;

use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// Default base URL of the Wild Apricot admin API.
pub const DEFAULT_API_BASE: &str = "https://api.wildapricot.org/v2.2";

/// Default OAuth token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://oauth.wildapricot.org/auth/token";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the Wild Apricot event source.
#[derive(Clone)]
pub struct WildApricotConfig {
    /// Numeric account identifier.
    pub account_id: String,

    /// API key, exchanged for a bearer token with the client-credentials flow.
    pub api_key: String,

    /// Base URL of the admin API, without trailing slash.
    pub api_base: String,

    /// OAuth token endpoint.
    pub token_url: String,

    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl std::fmt::Debug for WildApricotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WildApricotConfig")
            .field("account_id", &self.account_id)
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("token_url", &self.token_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl WildApricotConfig {
    /// Creates a configuration with the public endpoints.
    pub fn new(account_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Builder method to override the API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder method to override the token endpoint.
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Builder method to set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the URL listing the account's events.
    pub fn events_url(&self) -> String {
        format!(
            "{}/accounts/{}/events",
            self.api_base,
            urlencoding::encode(&self.account_id)
        )
    }

    /// Checks that both credentials are present and the endpoints parse.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.account_id.trim().is_empty() {
            return Err(ProviderError::configuration("Wild Apricot account id is required"));
        }
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::configuration("Wild Apricot API key is required"));
        }
        for (name, value) in [("api_base", &self.api_base), ("token_url", &self.token_url)] {
            Url::parse(value).map_err(|e| {
                ProviderError::configuration(format!("invalid {} {:?}: {}", name, value, e))
            })?;
        }
        Ok(())
    }
}
