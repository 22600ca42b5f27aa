//! Wild Apricot [`EventSource`] implementation.

use serde_json::Value;
use tracing::{debug, info};

use super::client::WildApricotClient;
use super::config::WildApricotConfig;
use crate::error::ProviderResult;
use crate::source::{BoxFuture, EventSource, FetchOptions};
use crate::tokens::{TokenCache, valid_value};

const PROVIDER_NAME: &str = "wildapricot";

/// Event source backed by the Wild Apricot admin API.
///
/// The bearer token is cached for the lifetime of the source and reused
/// until 60 seconds before it expires.
#[derive(Debug)]
pub struct WildApricotSource {
    client: WildApricotClient,
    tokens: TokenCache,
}

impl WildApricotSource {
    /// Creates a source from validated configuration.
    pub fn new(config: WildApricotConfig) -> ProviderResult<Self> {
        config
            .validate()
            .map_err(|e| e.with_provider(PROVIDER_NAME))?;
        let client = WildApricotClient::new(config).map_err(|e| e.with_provider(PROVIDER_NAME))?;
        Ok(Self {
            client,
            tokens: TokenCache::new(),
        })
    }

    /// Returns a valid bearer token, exchanging the API key when needed.
    async fn access_token(&self) -> ProviderResult<String> {
        let mut slot = self.tokens.lock().await;
        if let Some(token) = valid_value(&slot) {
            debug!("reusing cached access token");
            return Ok(token);
        }

        info!("refreshing Wild Apricot access token");
        let token = self.client.exchange_token().await?;
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }

    async fn list_events(&self, options: FetchOptions) -> ProviderResult<Vec<Value>> {
        let token = self.access_token().await?;
        info!(since = %options.since, "fetching events from Wild Apricot");

        let mut page = self.client.first_page(&token, options.since).await?;
        let mut all_events = Vec::new();
        let mut pages = 1;
        loop {
            let (events, next_page_url) = page.into_parts();
            all_events.extend(events);

            match next_page_url {
                Some(url) => {
                    debug!(page = pages + 1, "following next page");
                    page = self.client.next_page(&token, &url).await?;
                    pages += 1;
                }
                None => break,
            }
        }

        info!(
            count = all_events.len(),
            pages, "fetched events from Wild Apricot"
        );
        Ok(all_events)
    }
}

impl EventSource for WildApricotSource {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn fetch_events(&self, options: FetchOptions) -> BoxFuture<'_, ProviderResult<Vec<Value>>> {
        Box::pin(async move {
            self.list_events(options)
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))
        })
    }
}
