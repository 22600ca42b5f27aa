//! Raw record to [`NormalizedEvent`] conversion pipeline.
//!
//! The pipeline:
//! 1. Decodes the record into a [`RawEvent`]
//! 2. Splits the source tags
//! 3. Applies the organization's auto-tag rules to the name
//! 4. Adds the derived tags (time of day, availability, weekend)
//! 5. Deduplicates the union of source and derived tags
//! 6. Computes remaining capacity and the full flag
//! 7. Resolves the canonical URL, falling back to the configured template
//! 8. Copies the scalar fields with their defaults

use std::collections::BTreeSet;

use clubcal_core::{EventId, NormalizedEvent, OrgConfig};
use serde_json::Value;
use thiserror::Error;

use crate::derive::derived_tags;
use crate::raw_event::RawEvent;
use crate::rules::apply_tag_rules;

/// Fallback URL template used when none is configured.
pub const DEFAULT_EVENT_URL_TEMPLATE: &str = "/event-{id}";

/// Access level reported when the source omits one.
const DEFAULT_ACCESS_LEVEL: &str = "Public";

/// Why a single record could not be normalized.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The record does not decode as an event.
    #[error("invalid event record: {0}")]
    InvalidRecord(#[from] serde_json::Error),

    /// The registration counts do not fit in the spot arithmetic.
    #[error("event {id} has out-of-range registration counts (limit {limit}, confirmed {confirmed})")]
    InvalidCapacity {
        id: EventId,
        limit: i64,
        confirmed: i64,
    },

    /// Neither the source nor the fallback template produced a URL.
    #[error("event {id} has no URL and the fallback template rendered empty")]
    MissingUrl { id: EventId },
}

/// Options for the normalization pipeline that do not come from the
/// organization config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Template for events without a source URL. `{id}` is replaced with
    /// the event id, e.g. `https://club.example.org/event-{id}`.
    pub event_url_template: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            event_url_template: DEFAULT_EVENT_URL_TEMPLATE.to_string(),
        }
    }
}

impl NormalizeOptions {
    /// Creates options with the given fallback URL template.
    pub fn new(event_url_template: impl Into<String>) -> Self {
        Self {
            event_url_template: event_url_template.into(),
        }
    }

    /// Renders the fallback URL for an event id.
    pub fn fallback_url(&self, id: &EventId) -> String {
        self.event_url_template.replace("{id}", &id.to_string())
    }
}

/// Returns true if an event name marks the event as cancelled.
///
/// Matches `CANCELLED` anywhere in the name, in any case.
pub fn is_cancelled_name(name: &str) -> bool {
    name.to_uppercase().contains("CANCELLED")
}

/// Converts one undecoded source record into a [`NormalizedEvent`].
///
/// # Errors
///
/// Returns a [`TransformError`] when the record does not decode, its
/// registration counts are out of range, or no URL can be resolved. Callers drop that one event and continue.
pub fn normalize_event(
    record: Value,
    config: &OrgConfig,
    options: &NormalizeOptions,
) -> Result<NormalizedEvent, TransformError> {
    let raw = RawEvent::from_value(record)?;
    normalize_raw(raw, config, options)
}

/// Converts a decoded [`RawEvent`] into a [`NormalizedEvent`].
pub fn normalize_raw(
    raw: RawEvent,
    config: &OrgConfig,
    options: &NormalizeOptions,
) -> Result<NormalizedEvent, TransformError> {
    let mut tags: BTreeSet<String> = raw.source_tags().into_iter().collect();
    tags.extend(apply_tag_rules(raw.name(), &config.rules));
    tags.extend(
        derived_tags(&raw, &config.time_of_day)
            .into_iter()
            .map(String::from),
    );

    let spots_available = match raw.registrations_limit {
        Some(limit) => {
            let confirmed = raw.confirmed();
            let spots = limit
                .checked_sub(confirmed)
                .ok_or_else(|| TransformError::InvalidCapacity {
                    id: raw.id.clone(),
                    limit,
                    confirmed,
                })?;
            Some(spots.max(0))
        }
        None => None,
    };
    let is_full = spots_available == Some(0);

    let url = match raw.url.as_deref() {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => options.fallback_url(&raw.id),
    };
    if url.is_empty() {
        return Err(TransformError::MissingUrl { id: raw.id });
    }

    let description = raw.description().to_string();
    Ok(NormalizedEvent {
        id: raw.id,
        name: raw.name.unwrap_or_default(),
        start: raw.start_date.unwrap_or_default(),
        end: raw.end_date.unwrap_or_default(),
        location: raw.location.unwrap_or_default(),
        description,
        url,
        registration_url: raw.registration_url.unwrap_or_default(),
        tags: tags.into_iter().collect(),
        spots_available,
        is_full,
        registration_enabled: raw.registration_enabled.unwrap_or(true),
        access_level: raw
            .access_level
            .unwrap_or_else(|| DEFAULT_ACCESS_LEVEL.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw_event::RawTags;
    use clubcal_core::TagRule;
    use serde_json::json;

    fn options() -> NormalizeOptions {
        NormalizeOptions::new("https://club.example.org/event-{id}")
    }

    fn config() -> OrgConfig {
        OrgConfig::default().with_rules(vec![
            TagRule::prefix("Hike", "outdoors"),
            TagRule::contains("wine", "wine"),
        ])
    }

    mod full_pipeline {
        use super::*;

        #[test]
        fn normalizes_complete_record() {
            let event = normalize_event(
                json!({
                    "Id": 4821,
                    "Name": "Wine Tasting",
                    "StartDate": "2024-03-16T18:00:00-08:00",
                    "EndDate": "2024-03-16T20:00:00-08:00",
                    "Location": "Cellar 21",
                    "Details": { "DescriptionHtml": "<p>Reds</p>" },
                    "Url": "https://club.example.org/event-4821",
                    "RegistrationUrl": "https://club.example.org/event-4821/Registration",
                    "RegistrationsLimit": 20,
                    "ConfirmedRegistrationsCount": 17,
                    "RegistrationEnabled": true,
                    "AccessLevel": "Public",
                    "Tags": "social, members"
                }),
                &config(),
                &options(),
            )
            .unwrap();

            assert_eq!(event.id, EventId::Number(4821));
            assert_eq!(event.name, "Wine Tasting");
            assert_eq!(event.location, "Cellar 21");
            assert_eq!(event.description, "<p>Reds</p>");
            assert_eq!(
                event.tags,
                vec![
                    "availability:limited",
                    "day:weekend",
                    "members",
                    "social",
                    "time:evening",
                    "wine",
                ]
            );
            assert_eq!(event.spots_available, Some(3));
            assert!(!event.is_full);
        }

        #[test]
        fn applies_defaults_for_missing_fields() {
            let event = normalize_event(json!({ "Id": 9 }), &OrgConfig::default(), &options())
                .unwrap();

            assert_eq!(event.name, "");
            assert_eq!(event.start, "");
            assert_eq!(event.end, "");
            assert_eq!(event.location, "");
            assert_eq!(event.description, "");
            assert_eq!(event.registration_url, "");
            assert!(event.registration_enabled);
            assert_eq!(event.access_level, "Public");
            assert_eq!(event.tags, vec!["availability:open"]);
        }

        #[test]
        fn malformed_record_is_an_error() {
            let err = normalize_event(
                json!({ "Id": 1, "ConfirmedRegistrationsCount": "many" }),
                &config(),
                &options(),
            )
            .unwrap_err();
            assert!(matches!(err, TransformError::InvalidRecord(_)));
        }
    }

    mod tags {
        use super::*;

        #[test]
        fn deduplicates_source_and_derived_tags() {
            let raw = RawEvent::new(1, "Hike")
                .with_tags(RawTags::List(vec!["A".into(), "A".into(), "outdoors".into()]));
            let config = OrgConfig::default().with_rules(vec![
                TagRule::prefix("hike", "A"),
                TagRule::prefix("hike", "outdoors"),
            ]);

            let event = normalize_raw(raw, &config, &options()).unwrap();

            assert_eq!(event.tags.iter().filter(|t| *t == "A").count(), 1);
            assert_eq!(event.tags.iter().filter(|t| *t == "outdoors").count(), 1);
        }

        #[test]
        fn weekday_morning_event_has_no_weekend_tag() {
            let raw = RawEvent::new(1, "Coffee").with_start("2024-03-19T09:00:00-07:00");
            let event = normalize_raw(raw, &OrgConfig::default(), &options()).unwrap();

            assert!(event.has_tag("time:morning"));
            assert!(!event.has_tag("day:weekend"));
        }

        #[test]
        fn unparsable_start_only_drops_time_tags() {
            let raw = RawEvent::new(1, "Hike to the falls").with_start("TBD");
            let event = normalize_raw(raw, &config(), &options()).unwrap();

            assert_eq!(event.tags, vec!["availability:open", "outdoors"]);
        }

        #[test]
        fn uses_configured_boundaries() {
            let raw = RawEvent::new(1, "Lunch").with_start("2024-03-19T11:30:00");
            let config = OrgConfig::default().with_time_of_day(11, 17);
            let event = normalize_raw(raw, &config, &options()).unwrap();

            assert!(event.has_tag("time:afternoon"));
        }
    }

    mod capacity {
        use super::*;

        fn spots(limit: Option<i64>, confirmed: i64) -> (Option<i64>, bool) {
            let raw = RawEvent::new(1, "Dinner").with_registrations(limit, confirmed);
            let event = normalize_raw(raw, &OrgConfig::default(), &options()).unwrap();
            (event.spots_available, event.is_full)
        }

        #[test]
        fn unlimited_has_no_spot_count() {
            assert_eq!(spots(None, 12), (None, false));
        }

        #[test]
        fn remaining_spots() {
            assert_eq!(spots(Some(10), 6), (Some(4), false));
        }

        #[test]
        fn sold_out_is_full() {
            assert_eq!(spots(Some(10), 10), (Some(0), true));
        }

        #[test]
        fn overbooked_clamps_to_zero() {
            assert_eq!(spots(Some(10), 13), (Some(0), true));
        }

        #[test]
        fn overflowing_counts_are_an_error() {
            let raw = RawEvent::new(2, "Bad").with_registrations(Some(i64::MAX), -1);
            let err = normalize_raw(raw, &OrgConfig::default(), &options()).unwrap_err();
            assert!(matches!(
                err,
                TransformError::InvalidCapacity {
                    limit: i64::MAX,
                    confirmed: -1,
                    ..
                }
            ));
        }
    }

    mod url {
        use super::*;

        #[test]
        fn source_url_used_verbatim() {
            let raw = RawEvent::new(5, "Tour").with_url("https://elsewhere.example/x?y=1");
            let event = normalize_raw(raw, &OrgConfig::default(), &options()).unwrap();
            assert_eq!(event.url, "https://elsewhere.example/x?y=1");
        }

        #[test]
        fn missing_url_uses_template() {
            let raw = RawEvent::new(5, "Tour");
            let event = normalize_raw(raw, &OrgConfig::default(), &options()).unwrap();
            assert_eq!(event.url, "https://club.example.org/event-5");
        }

        #[test]
        fn empty_url_uses_template() {
            let raw = RawEvent::new(5, "Tour").with_url("");
            let event =
                normalize_raw(raw, &OrgConfig::default(), &NormalizeOptions::default()).unwrap();
            assert_eq!(event.url, "/event-5");
        }

        #[test]
        fn empty_template_is_an_error() {
            let raw = RawEvent::new(5, "Tour");
            let err = normalize_raw(raw, &OrgConfig::default(), &NormalizeOptions::new(""))
                .unwrap_err();
            assert!(matches!(err, TransformError::MissingUrl { .. }));
        }
    }

    #[test]
    fn cancelled_names() {
        assert!(is_cancelled_name("CANCELLED: Wine Walk"));
        assert!(is_cancelled_name("Wine Walk (cancelled)"));
        assert!(is_cancelled_name("Book Club - Cancelled"));
        assert!(!is_cancelled_name("Canceled spelling is different"));
        assert!(!is_cancelled_name("Wine Walk"));
    }
}
