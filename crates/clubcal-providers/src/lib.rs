//! Event sources and the raw-to-normalized event pipeline.
//!
//! - [`EventSource`] - The trait every upstream event listing implements
//! - [`WildApricotSource`] - Wild Apricot implementation (OAuth + paging)
//! - [`RawEvent`] - Typed view of one upstream record
//! - [`normalize_event`] - Pipeline turning a record into a [`NormalizedEvent`]
//! - [`ProviderError`] - Error types for source operations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ Wild Apricot API │
//! └────────┬─────────┘
//!          │  token exchange + paged GET
//!          ▼
//! ┌──────────────────┐
//! │ WildApricotSource│  (EventSource)
//! └────────┬─────────┘
//!          │  Vec<serde_json::Value>
//!          ▼
//! ┌──────────────────┐    rules::apply_tag_rules
//! │ normalize_event  │ ◄─ derive::{time_of_day, availability, is_weekend}
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │ NormalizedEvent  │
//! └──────────────────┘
//! ```
//!
//! [`NormalizedEvent`]: clubcal_core::NormalizedEvent

pub mod derive;
pub mod error;
pub mod normalize;
pub mod raw_event;
pub mod rules;
pub mod source;
pub mod tokens;
pub mod wildapricot;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use normalize::{
    DEFAULT_EVENT_URL_TEMPLATE, NormalizeOptions, TransformError, is_cancelled_name, normalize_event,
    normalize_raw,
};
pub use raw_event::{RawDetails, RawEvent, RawTags, record_id, record_name};
pub use source::{BoxFuture, EventSource, FetchOptions};
pub use tokens::{AccessToken, TokenCache};
pub use wildapricot::{WildApricotConfig, WildApricotSource};
