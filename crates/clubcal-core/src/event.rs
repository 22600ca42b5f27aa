//! Normalized event types and the published document.
//!
//! [`NormalizedEvent`] is the per-event record consumed by the public
//! calendar front end. A sync run collects them into an [`EventDocument`],
//! which is serialized verbatim to the storage backend, and reports a
//! [`SyncSummary`] to whoever triggered the run.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::format_generated;

/// Banner written at the top of every published document.
pub const GENERATED_WARNING: &str = "This file is auto-generated. Do not edit manually.";

/// Identifier of an event in the source system.
///
/// The membership API uses integer ids, but string ids are accepted so a
/// record is never rejected for its id encoding alone. The JSON form is kept
/// as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventId {
    /// Numeric identifier.
    Number(i64),
    /// Textual identifier.
    Text(String),
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for EventId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A normalized, tagged event ready for publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    /// Source identifier.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Start timestamp, as reported by the source.
    pub start: String,
    /// End timestamp, as reported by the source.
    pub end: String,
    /// Free-text location.
    pub location: String,
    /// HTML description.
    pub description: String,
    /// Canonical event page. Never empty.
    pub url: String,
    /// Registration page.
    pub registration_url: String,
    /// Deduplicated tags, sorted.
    pub tags: Vec<String>,
    /// Remaining capacity; `None` when the event has no capacity limit.
    pub spots_available: Option<i64>,
    /// True iff `spots_available == Some(0)`.
    pub is_full: bool,
    /// Whether online registration is open.
    pub registration_enabled: bool,
    /// Access level (`Public`, `AdminOnly`, ...).
    pub access_level: String,
}

impl NormalizedEvent {
    /// Returns true if the event carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// The aggregate document published for one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDocument {
    /// Do-not-edit banner.
    #[serde(rename = "_warning")]
    pub warning: String,
    /// Generation time, ISO-8601 UTC with trailing `Z`.
    #[serde(rename = "_generated")]
    pub generated: String,
    /// Organization the events belong to.
    #[serde(rename = "_orgId")]
    pub org_id: String,
    /// Number of entries in `events`.
    #[serde(rename = "eventCount")]
    pub event_count: usize,
    /// Events, in the order they were fetched.
    pub events: Vec<NormalizedEvent>,
}

impl EventDocument {
    /// Builds a document stamped with `generated_at`.
    pub fn new(
        org_id: impl Into<String>,
        generated_at: DateTime<Utc>,
        events: Vec<NormalizedEvent>,
    ) -> Self {
        Self {
            warning: GENERATED_WARNING.to_string(),
            generated: format_generated(generated_at),
            org_id: org_id.into(),
            event_count: events.len(),
            events,
        }
    }

    /// Returns the event ids in document order.
    pub fn event_ids(&self) -> Vec<&EventId> {
        self.events.iter().map(|e| &e.id).collect()
    }
}

/// Outcome of a successful sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    /// Always true; failures are reported as errors instead.
    pub success: bool,
    /// Number of published events.
    pub event_count: usize,
    /// Retrieval URL of the published document.
    pub url: String,
    /// The document's generation stamp.
    pub timestamp: String,
}

impl SyncSummary {
    /// Summarizes a published document.
    pub fn from_document(document: &EventDocument, url: impl Into<String>) -> Self {
        Self {
            success: true,
            event_count: document.event_count,
            url: url.into(),
            timestamp: document.generated.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_event(id: i64) -> NormalizedEvent {
        NormalizedEvent {
            id: EventId::Number(id),
            name: "Coffee Social".to_string(),
            start: "2025-03-01T10:00:00-08:00".to_string(),
            end: "2025-03-01T11:30:00-08:00".to_string(),
            location: "Main Library".to_string(),
            description: "<p>Meet new members</p>".to_string(),
            url: format!("https://club.example.org/event-{}", id),
            registration_url: format!("https://club.example.org/event-{}/Registration", id),
            tags: vec![
                "availability:limited".to_string(),
                "day:weekend".to_string(),
                "social".to_string(),
                "time:morning".to_string(),
            ],
            spots_available: Some(4),
            is_full: false,
            registration_enabled: true,
            access_level: "Public".to_string(),
        }
    }

    #[test]
    fn event_id_keeps_json_shape() {
        let numeric: EventId = serde_json::from_str("4821").unwrap();
        assert_eq!(numeric, EventId::Number(4821));
        assert_eq!(serde_json::to_string(&numeric).unwrap(), "4821");

        let text: EventId = serde_json::from_str("\"evt-9\"").unwrap();
        assert_eq!(text, EventId::from("evt-9"));
        assert_eq!(text.to_string(), "evt-9");
    }

    #[test]
    fn document_counts_events() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 8, 15, 0).unwrap();
        let doc = EventDocument::new("sbnc", now, vec![sample_event(1), sample_event(2)]);

        assert_eq!(doc.event_count, 2);
        assert_eq!(doc.warning, GENERATED_WARNING);
        assert_eq!(doc.generated, "2025-03-01T08:15:00.000000Z");
        assert_eq!(
            doc.event_ids(),
            vec![&EventId::Number(1), &EventId::Number(2)]
        );
    }

    #[test]
    fn summary_mirrors_document() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 8, 15, 0).unwrap();
        let doc = EventDocument::new("sbnc", now, vec![sample_event(7)]);
        let summary = SyncSummary::from_document(&doc, "https://cdn.example.org/sbnc.json");

        assert!(summary.success);
        assert_eq!(summary.event_count, 1);
        assert_eq!(summary.timestamp, doc.generated);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["eventCount"], 1);
        assert_eq!(json["url"], "https://cdn.example.org/sbnc.json");
    }

    #[test]
    fn has_tag_lookup() {
        let event = sample_event(3);
        assert!(event.has_tag("social"));
        assert!(!event.has_tag("Social"));
    }

    #[test]
    fn published_document_layout() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 8, 15, 0).unwrap();
        let mut unlimited = sample_event(12);
        unlimited.tags = vec!["availability:open".to_string()];
        unlimited.spots_available = None;
        let doc = EventDocument::new("sbnc", now, vec![sample_event(11), unlimited]);

        let rendered = serde_json::to_string_pretty(&doc).unwrap();
        insta::assert_snapshot!("published_document", rendered);
    }
}
