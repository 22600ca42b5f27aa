//! Typed view of an upstream event record.
//!
//! Sources hand records over as opaque JSON so that one record with an
//! unexpected shape only costs that record. [`RawEvent::from_value`] is the
//! point where a record is decoded; it is called per event inside the
//! transform.
//!
//! Field names follow the Wild Apricot `Event` schema (PascalCase).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use clubcal_core::EventId;

/// Tags as reported by the source: either a comma-delimited string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTags {
    /// `"social, wine ,outdoors"`
    Delimited(String),
    /// `["social", "wine"]`
    List(Vec<String>),
}

impl RawTags {
    /// Splits into individual tags. Delimited strings are split on commas,
    /// trimmed, and empty pieces dropped. Lists are taken verbatim.
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::Delimited(s) => s
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
            Self::List(tags) => tags.clone(),
        }
    }
}

/// The `Details` block of an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawDetails {
    /// HTML description.
    #[serde(default)]
    pub description_html: Option<String>,
}

/// One event record from the membership API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawEvent {
    /// Source identifier.
    pub id: EventId,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Start timestamp (ISO-8601, kept verbatim).
    #[serde(default)]
    pub start_date: Option<String>,

    /// End timestamp (ISO-8601, kept verbatim).
    #[serde(default)]
    pub end_date: Option<String>,

    /// Free-text location.
    #[serde(default)]
    pub location: Option<String>,

    /// Details block. Only an object carries a description; other shapes
    /// are ignored.
    #[serde(default, deserialize_with = "details_if_object")]
    pub details: Option<RawDetails>,

    /// Canonical event page.
    #[serde(default)]
    pub url: Option<String>,

    /// Registration page.
    #[serde(default)]
    pub registration_url: Option<String>,

    /// Capacity limit; `None` means unlimited.
    #[serde(default)]
    pub registrations_limit: Option<i64>,

    /// Confirmed registrations so far.
    #[serde(default)]
    pub confirmed_registrations_count: Option<i64>,

    /// Whether online registration is open.
    #[serde(default)]
    pub registration_enabled: Option<bool>,

    /// Access level (`Public`, `AdminOnly`, ...).
    #[serde(default)]
    pub access_level: Option<String>,

    /// Source tags.
    #[serde(default)]
    pub tags: Option<RawTags>,
}

fn details_if_object<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<RawDetails>, D::Error> {
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

impl RawEvent {
    /// Creates a record with a numeric id and a name.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: EventId::Number(id),
            name: Some(name.into()),
            start_date: None,
            end_date: None,
            location: None,
            details: None,
            url: None,
            registration_url: None,
            registrations_limit: None,
            confirmed_registrations_count: None,
            registration_enabled: None,
            access_level: None,
            tags: None,
        }
    }

    /// Decodes a record handed over by a source.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Returns the display name, or `""` when absent.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Returns the start timestamp, or `""` when absent.
    pub fn start(&self) -> &str {
        self.start_date.as_deref().unwrap_or_default()
    }

    /// Returns the confirmed registration count, defaulting to 0.
    pub fn confirmed(&self) -> i64 {
        self.confirmed_registrations_count.unwrap_or(0)
    }

    /// Returns the HTML description, or `""`.
    pub fn description(&self) -> &str {
        self.details
            .as_ref()
            .and_then(|d| d.description_html.as_deref())
            .unwrap_or_default()
    }

    /// Returns the source tags, split.
    pub fn source_tags(&self) -> Vec<String> {
        self.tags.as_ref().map(RawTags::to_vec).unwrap_or_default()
    }

    /// Builder method to set the start timestamp.
    pub fn with_start(mut self, start: impl Into<String>) -> Self {
        self.start_date = Some(start.into());
        self
    }

    /// Builder method to set capacity and confirmed count.
    pub fn with_registrations(mut self, limit: Option<i64>, confirmed: i64) -> Self {
        self.registrations_limit = limit;
        self.confirmed_registrations_count = Some(confirmed);
        self
    }

    /// Builder method to set the event URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Builder method to set source tags.
    pub fn with_tags(mut self, tags: RawTags) -> Self {
        self.tags = Some(tags);
        self
    }
}

/// Reads the display name from an undecoded record, if it has one.
///
/// Used to filter cancelled events before paying for a full decode.
pub fn record_name(record: &Value) -> Option<&str> {
    record.get("Name").and_then(Value::as_str)
}

/// Reads the id from an undecoded record for log messages.
pub fn record_id(record: &Value) -> String {
    match record.get("Id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "<unknown>".to_string(),
    }
}
