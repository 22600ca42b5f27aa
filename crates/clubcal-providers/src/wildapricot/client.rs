//! Wild Apricot API client.
//!
//! Low-level HTTP calls: the client-credentials token exchange and one page
//! of the event listing. Token caching and paging live in the provider.

use chrono::NaiveDate;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::config::WildApricotConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::tokens::AccessToken;

/// Username sent with the API key during the token exchange.
const API_KEY_USER: &str = "APIKEY";

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// One page of the event listing.
///
/// The listing answers either with an envelope carrying a continuation URL
/// or with a bare array holding every event.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EventsPage {
    /// `{"Events": [...], "ResultNextPageUrl": "..."}`
    Envelope {
        #[serde(rename = "Events", default)]
        events: Vec<Value>,
        #[serde(rename = "ResultNextPageUrl", default)]
        next_page_url: Option<String>,
    },
    /// `[...]`
    Bare(Vec<Value>),
}

impl EventsPage {
    /// Splits the page into its records and the next page URL, if any.
    pub fn into_parts(self) -> (Vec<Value>, Option<String>) {
        match self {
            Self::Envelope {
                events,
                next_page_url,
            } => (events, next_page_url.filter(|url| !url.is_empty())),
            Self::Bare(events) => (events, None),
        }
    }
}

/// Wild Apricot API client.
#[derive(Debug)]
pub struct WildApricotClient {
    http_client: reqwest::Client,
    config: WildApricotConfig,
}

impl WildApricotClient {
    /// Creates a new client.
    pub fn new(config: WildApricotConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Exchanges the API key for a bearer token.
    pub async fn exchange_token(&self) -> ProviderResult<AccessToken> {
        let response = self
            .http_client
            .post(&self.config.token_url)
            .basic_auth(API_KEY_USER, Some(&self.config.api_key))
            .form(&[("grant_type", "client_credentials"), ("scope", "auto")])
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ProviderError::from_status(status.as_u16(), "token exchange", &body);
            return Err(if status.is_client_error() {
                ProviderError::authentication(err.message())
            } else {
                err
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse token response: {}", e))
                .with_source(e)
        })?;

        Ok(AccessToken::new(token.access_token, token.expires_in))
    }

    /// Fetches the first page of events starting on or after `since`.
    pub async fn first_page(&self, token: &str, since: NaiveDate) -> ProviderResult<EventsPage> {
        let filter = format!("StartDate ge {}", since.format("%Y-%m-%d"));
        let request = self
            .http_client
            .get(self.config.events_url())
            .query(&[("$filter", filter.as_str()), ("$sort", "StartDate asc")]);
        self.fetch_page(request, token).await
    }

    /// Fetches a continuation page. The URL already carries its query.
    pub async fn next_page(&self, token: &str, url: &str) -> ProviderResult<EventsPage> {
        let request = self.http_client.get(url);
        self.fetch_page(request, token).await
    }

    async fn fetch_page(
        &self,
        request: reqwest::RequestBuilder,
        token: &str,
    ) -> ProviderResult<EventsPage> {
        let response = request
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                status.as_u16(),
                "event listing",
                &body,
            ));
        }

        let body = response.text().await.map_err(|e| {
            ProviderError::network(format!("failed to read response body: {}", e)).with_source(e)
        })?;
        debug!(bytes = body.len(), "received event page");

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("unexpected event listing body: {}", e))
                .with_source(e)
        })
    }
}

fn request_error(e: reqwest::Error) -> ProviderError {
    let message = if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        format!("request failed: {}", e)
    };
    ProviderError::network(message).with_source(e)
}
