//! Derived tags computed from raw event fields.
//!
//! Each function is independent and total: a field that cannot be read
//! yields no tag rather than an error.

use chrono::{Datelike, Timelike, Weekday};
use clubcal_core::{TimeOfDayBoundaries, parse_wall_clock};

use crate::raw_event::RawEvent;

/// Tag for events starting before the morning boundary.
pub const TAG_MORNING: &str = "time:morning";
/// Tag for events starting before the afternoon boundary.
pub const TAG_AFTERNOON: &str = "time:afternoon";
/// Tag for events starting at or after the afternoon boundary.
pub const TAG_EVENING: &str = "time:evening";
/// Availability tag: unlimited or more than five spots left.
pub const TAG_OPEN: &str = "availability:open";
/// Availability tag: one to five spots left.
pub const TAG_LIMITED: &str = "availability:limited";
/// Availability tag: no spots left.
pub const TAG_FULL: &str = "availability:full";
/// Tag for events starting on Saturday or Sunday.
pub const TAG_WEEKEND: &str = "day:weekend";

/// Remaining spots at or below which availability is `limited`.
const LIMITED_THRESHOLD: i64 = 5;

/// Buckets the start hour into morning, afternoon or evening.
///
/// Returns `None` when the start timestamp does not parse.
pub fn time_of_day(start: &str, boundaries: &TimeOfDayBoundaries) -> Option<&'static str> {
    let hour = parse_wall_clock(start)?.hour();
    if hour < boundaries.morning_before {
        Some(TAG_MORNING)
    } else if hour < boundaries.afternoon_before {
        Some(TAG_AFTERNOON)
    } else {
        Some(TAG_EVENING)
    }
}

/// Classifies remaining capacity.
///
/// A missing or zero limit means unlimited.
pub fn availability(limit: Option<i64>, confirmed: i64) -> &'static str {
    let limit = match limit {
        None | Some(0) => return TAG_OPEN,
        Some(limit) => limit,
    };

    let spots = limit.saturating_sub(confirmed);
    if spots <= 0 {
        TAG_FULL
    } else if spots <= LIMITED_THRESHOLD {
        TAG_LIMITED
    } else {
        TAG_OPEN
    }
}

/// Returns true if the start falls on a Saturday or Sunday.
pub fn is_weekend(start: &str) -> bool {
    parse_wall_clock(start)
        .is_some_and(|dt| matches!(dt.weekday(), Weekday::Sat | Weekday::Sun))
}

/// Collects the derived tags of an event: time of day (when derivable),
/// availability (always) and the weekend flag (when set).
pub fn derived_tags(raw: &RawEvent, boundaries: &TimeOfDayBoundaries) -> Vec<&'static str> {
    let start = raw.start();
    let mut tags = Vec::with_capacity(3);

    if let Some(tag) = time_of_day(start, boundaries) {
        tags.push(tag);
    }
    tags.push(availability(raw.registrations_limit, raw.confirmed()));
    if is_weekend(start) {
        tags.push(TAG_WEEKEND);
    }

    tags
}
