//! Timestamp helpers.
//!
//! The membership API reports event times as ISO-8601 strings in the
//! organization's local offset (`2024-03-16T10:00:00-08:00`). Derived tags
//! look at the wall-clock time as written, so parsing keeps the local
//! reading and drops the offset.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Layouts accepted for timestamps that carry no offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Layouts with an offset that RFC 3339 parsing rejects.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Parses an ISO-8601 timestamp into its local wall-clock reading.
///
/// A trailing `Z` is treated as a UTC offset. Timestamps without an offset
/// and bare dates (midnight) are accepted as-is. Returns `None` when nothing
/// matches.
pub fn parse_wall_clock(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_local());
    }

    let with_offset = match input.strip_suffix('Z') {
        Some(stripped) => format!("{stripped}+00:00"),
        None => input.to_string(),
    };
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&with_offset, format) {
            return Some(dt.naive_local());
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Formats the generation stamp of a published document.
///
/// Always UTC with microsecond precision and a trailing `Z`,
/// e.g. `2025-03-01T08:15:00.000000Z`.
pub fn format_generated(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}
