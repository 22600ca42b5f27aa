//! In-memory bearer token cache.
//!
//! Tokens live only for the lifetime of the process. A cached token is
//! considered expired 60 seconds before the lifetime the issuer reported.
//! Reported lifetimes are clamped to at most one day.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, MutexGuard};

/// Seconds shaved off a reported lifetime so a token is never used at the edge.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Longest lifetime honored, whatever the issuer reports.
const MAX_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// A bearer token and the instant after which it must not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The bearer token value.
    pub value: String,
    /// When the token stops being usable.
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Creates a token issued at `now` with a lifetime of `expires_in_secs`.
    ///
    /// Negative lifetimes count as zero; lifetimes beyond one day count as
    /// one day.
    pub fn issued_at(value: impl Into<String>, expires_in_secs: i64, now: DateTime<Utc>) -> Self {
        let usable = expires_in_secs.clamp(0, MAX_LIFETIME_SECS) - EXPIRY_MARGIN_SECS;
        Self {
            value: value.into(),
            expires_at: now
                .checked_add_signed(Duration::seconds(usable))
                .unwrap_or(now),
        }
    }

    /// Creates a token issued now.
    pub fn new(value: impl Into<String>, expires_in_secs: i64) -> Self {
        Self::issued_at(value, expires_in_secs, Utc::now())
    }

    /// Returns true if the token is still usable at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Returns true if the token is still usable.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

/// Shared holder for one [`AccessToken`].
///
/// Callers lock with [`TokenCache::lock`] across the check-and-refresh so
/// concurrent requests do not exchange credentials twice.
#[derive(Debug, Default)]
pub struct TokenCache {
    token: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the cache for a check-and-refresh sequence.
    pub async fn lock(&self) -> MutexGuard<'_, Option<AccessToken>> {
        self.token.lock().await
    }
}

/// Returns the token value held in `slot` if it is still valid.
pub fn valid_value(slot: &Option<AccessToken>) -> Option<String> {
    slot.as_ref()
        .filter(|token| token.is_valid())
        .map(|token| token.value.clone())
}
