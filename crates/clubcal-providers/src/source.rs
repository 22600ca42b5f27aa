//! EventSource trait definition.
//!
//! An [`EventSource`] lists upcoming events from an upstream membership
//! system. Sources handle their own authentication and paging and return
//! the records undecoded; decoding happens per event in
//! [`normalize_event`](crate::normalize_event).

use std::future::Future;
use std::pin::Pin;

use chrono::{Days, NaiveDate};
use serde_json::Value;

use crate::error::ProviderResult;

/// A boxed future for trait methods that must stay object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Options for listing events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Only events starting on or after this date are returned.
    pub since: NaiveDate,
}

impl FetchOptions {
    /// Creates options listing events from `since` onward.
    pub fn new(since: NaiveDate) -> Self {
        Self { since }
    }

    /// Creates options listing events from `past_days` before `today`.
    ///
    /// Returns `None` when that date is before the earliest representable one.
    pub fn from_today(today: NaiveDate, past_days: u32) -> Option<Self> {
        today
            .checked_sub_days(Days::new(u64::from(past_days)))
            .map(Self::new)
    }
}

/// An upstream listing of events.
///
/// # Example Implementation
///
/// ```ignore
/// struct StaticSource(Vec<Value>);
///
/// impl EventSource for StaticSource {
///     fn name(&self) -> &str { "static" }
///
///     fn fetch_events(&self, _options: FetchOptions) -> BoxFuture<'_, ProviderResult<Vec<Value>>> {
///         Box::pin(async move { Ok(self.0.clone()) })
///     }
/// }
/// ```
pub trait EventSource: Send + Sync {
    /// Returns the name of this source (e.g., "wildapricot").
    fn name(&self) -> &str;

    /// Lists every event matching `options`, following pagination to the end.
    ///
    /// Records come back in source order and undecoded.
    ///
    /// # Errors
    ///
    /// Any authentication, network, HTTP or body-shape failure is returned
    /// as a [`ProviderError`](crate::ProviderError); partial results are
    /// never returned.
    fn fetch_events(&self, options: FetchOptions) -> BoxFuture<'_, ProviderResult<Vec<Value>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_today_subtracts_past_days() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(FetchOptions::from_today(today, 0).unwrap().since, today);
        assert_eq!(
            FetchOptions::from_today(today, 3).unwrap().since,
            NaiveDate::from_ymd_opt(2024, 2, 28).unwrap()
        );
    }

    #[test]
    fn from_today_out_of_range_is_none() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(FetchOptions::from_today(today, 100_000_000), None);
        assert_eq!(FetchOptions::from_today(today, u32::MAX), None);
    }
}
