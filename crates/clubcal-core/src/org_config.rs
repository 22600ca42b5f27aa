//! Organization configuration: auto-tag rules and time-of-day boundaries.
//!
//! Stored documents come in two historical key conventions. Older files use
//! snake_case (`auto_tag_rules`, `derived_fields.time_of_day`), documents
//! written by the admin UI use camelCase (`autoTagRules`,
//! `derivedFields.timeOfDay`). Both are accepted; for each synonym pair the
//! first non-empty value wins, snake_case first. The pair is resolved once,
//! at deserialization, into [`OrgConfig`]. Documents are always written back
//! in camelCase.
//!
//! ```json
//! {
//!   "autoTagRules": [
//!     { "type": "name-prefix", "pattern": "Hike:", "tag": "outdoors" }
//!   ],
//!   "derivedFields": {
//!     "timeOfDay": {
//!       "morning": { "before": 12 },
//!       "afternoon": { "from": 12, "before": 17 },
//!       "evening": { "from": 17 }
//!     }
//!   }
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

/// Default end of the morning bucket (exclusive hour).
pub const DEFAULT_MORNING_BEFORE: u32 = 12;
/// Default end of the afternoon bucket (exclusive hour).
pub const DEFAULT_AFTERNOON_BEFORE: u32 = 17;

/// How a [`TagRule`] matches an event name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum RuleKind {
    /// `name-prefix`: name starts with the pattern.
    NamePrefix,
    /// `name-contains`: name contains the pattern.
    NameContains,
    /// `name-suffix`: name ends with the pattern.
    NameSuffix,
    /// Anything else. Never matches; kept so a save round-trips it.
    Unknown(String),
    /// The `type` key was absent.
    #[default]
    Missing,
}

impl RuleKind {
    /// Returns the wire name of this rule kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::NamePrefix => "name-prefix",
            Self::NameContains => "name-contains",
            Self::NameSuffix => "name-suffix",
            Self::Unknown(other) => other,
            Self::Missing => "",
        }
    }
}

impl From<&str> for RuleKind {
    fn from(value: &str) -> Self {
        match value {
            "name-prefix" => Self::NamePrefix,
            "name-contains" => Self::NameContains,
            "name-suffix" => Self::NameSuffix,
            "" => Self::Missing,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RuleKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RuleKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.as_deref().map(RuleKind::from).unwrap_or_default())
    }
}

/// A single auto-tag rule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagRule {
    /// Match strategy.
    #[serde(rename = "type", default)]
    pub kind: RuleKind,
    /// Pattern compared against the event name, case-insensitively.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub pattern: String,
    /// Tag emitted on match.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tag: String,
}

impl TagRule {
    /// Creates a rule.
    pub fn new(kind: RuleKind, pattern: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
            tag: tag.into(),
        }
    }

    /// Shorthand for a `name-prefix` rule.
    pub fn prefix(pattern: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::new(RuleKind::NamePrefix, pattern, tag)
    }

    /// Shorthand for a `name-contains` rule.
    pub fn contains(pattern: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::new(RuleKind::NameContains, pattern, tag)
    }

    /// Shorthand for a `name-suffix` rule.
    pub fn suffix(pattern: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::new(RuleKind::NameSuffix, pattern, tag)
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Hour boundaries for the time-of-day tag.
///
/// `hour < morning_before` is morning, `hour < afternoon_before` afternoon,
/// anything later evening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDayBoundaries {
    /// First hour that is no longer morning.
    pub morning_before: u32,
    /// First hour that is evening.
    pub afternoon_before: u32,
}

impl Default for TimeOfDayBoundaries {
    fn default() -> Self {
        Self {
            morning_before: DEFAULT_MORNING_BEFORE,
            afternoon_before: DEFAULT_AFTERNOON_BEFORE,
        }
    }
}

/// Canonical organization configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrgConfig {
    /// Auto-tag rules, evaluated in order.
    pub rules: Vec<TagRule>,
    /// Time-of-day bucket boundaries.
    pub time_of_day: TimeOfDayBoundaries,
    /// Top-level keys this crate does not interpret, preserved on save.
    pub extra: Map<String, Value>,
}

impl OrgConfig {
    /// Builds a config from a JSON document in either key convention.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Builds a config from JSON text in either key convention.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Renders the config as a camelCase JSON document.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Builder: replace the rules.
    pub fn with_rules(mut self, rules: Vec<TagRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Builder: set time-of-day boundaries.
    pub fn with_time_of_day(mut self, morning_before: u32, afternoon_before: u32) -> Self {
        self.time_of_day = TimeOfDayBoundaries {
            morning_before,
            afternoon_before,
        };
        self
    }
}

// ---------------------------------------------------------------------------
// Stored shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct StoredOrgConfig {
    auto_tag_rules: Option<Vec<TagRule>>,
    #[serde(rename = "autoTagRules")]
    auto_tag_rules_camel: Option<Vec<TagRule>>,
    derived_fields: Option<StoredDerivedFields>,
    #[serde(rename = "derivedFields")]
    derived_fields_camel: Option<StoredDerivedFields>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct StoredDerivedFields {
    time_of_day: Option<StoredTimeOfDay>,
    #[serde(rename = "timeOfDay")]
    time_of_day_camel: Option<StoredTimeOfDay>,
}

impl StoredDerivedFields {
    fn resolve(self) -> Option<StoredTimeOfDay> {
        first_non_empty(self.time_of_day, self.time_of_day_camel, StoredTimeOfDay::is_empty)
    }
}

#[derive(Debug, Default, Deserialize)]
struct StoredTimeOfDay {
    morning: Option<StoredBucket>,
    afternoon: Option<StoredBucket>,
}

impl StoredTimeOfDay {
    fn is_empty(&self) -> bool {
        self.morning.as_ref().and_then(|b| b.before).is_none()
            && self.afternoon.as_ref().and_then(|b| b.before).is_none()
    }
}

#[derive(Debug, Default, Deserialize)]
struct StoredBucket {
    before: Option<i64>,
}

fn first_non_empty<T>(first: Option<T>, second: Option<T>, is_empty: fn(&T) -> bool) -> Option<T> {
    match first {
        Some(value) if !is_empty(&value) => Some(value),
        first => second.filter(|v| !is_empty(v)).or(first),
    }
}

fn boundary_hour(bucket: Option<StoredBucket>, name: &str, default: u32) -> u32 {
    match bucket.and_then(|b| b.before) {
        None => default,
        Some(hour) if (0..=23).contains(&hour) => hour as u32,
        Some(hour) => {
            warn!(bucket = name, hour, "time-of-day boundary out of range, using default {}", default);
            default
        }
    }
}

impl From<StoredOrgConfig> for OrgConfig {
    fn from(stored: StoredOrgConfig) -> Self {
        let rules = first_non_empty(stored.auto_tag_rules, stored.auto_tag_rules_camel, Vec::is_empty)
            .unwrap_or_default();

        let time_of_day = first_non_empty(
            stored.derived_fields.and_then(StoredDerivedFields::resolve),
            stored.derived_fields_camel.and_then(StoredDerivedFields::resolve),
            StoredTimeOfDay::is_empty,
        )
        .map(|tod| TimeOfDayBoundaries {
            morning_before: boundary_hour(tod.morning, "morning", DEFAULT_MORNING_BEFORE),
            afternoon_before: boundary_hour(tod.afternoon, "afternoon", DEFAULT_AFTERNOON_BEFORE),
        })
        .unwrap_or_default();

        Self {
            rules,
            time_of_day,
            extra: stored.extra,
        }
    }
}

impl<'de> Deserialize<'de> for OrgConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        StoredOrgConfig::deserialize(deserializer).map(OrgConfig::from)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutgoingOrgConfig<'a> {
    auto_tag_rules: &'a [TagRule],
    derived_fields: OutgoingDerivedFields,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutgoingDerivedFields {
    time_of_day: OutgoingTimeOfDay,
}

#[derive(Serialize)]
struct OutgoingTimeOfDay {
    morning: Value,
    afternoon: Value,
    evening: Value,
}

impl Serialize for OrgConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let morning = self.time_of_day.morning_before;
        let afternoon = self.time_of_day.afternoon_before;
        OutgoingOrgConfig {
            auto_tag_rules: &self.rules,
            derived_fields: OutgoingDerivedFields {
                time_of_day: OutgoingTimeOfDay {
                    morning: serde_json::json!({ "before": morning }),
                    afternoon: serde_json::json!({ "from": morning, "before": afternoon }),
                    evening: serde_json::json!({ "from": afternoon }),
                },
            },
            extra: &self.extra,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_config_is_empty_with_standard_boundaries() {
        let config = OrgConfig::default();
        assert!(config.rules.is_empty());
        assert_eq!(config.time_of_day.morning_before, 12);
        assert_eq!(config.time_of_day.afternoon_before, 17);
    }

    #[test]
    fn empty_document_yields_default() {
        let config = OrgConfig::from_value(json!({})).unwrap();
        assert_eq!(config, OrgConfig::default());
    }

    #[test]
    fn reads_snake_case_document() {
        let config = OrgConfig::from_value(json!({
            "auto_tag_rules": [
                { "type": "name-prefix", "pattern": "Hike:", "tag": "outdoors" }
            ],
            "derived_fields": {
                "time_of_day": {
                    "morning": { "before": 11 },
                    "afternoon": { "from": 11, "before": 18 }
                }
            }
        }))
        .unwrap();

        assert_eq!(config.rules, vec![TagRule::prefix("Hike:", "outdoors")]);
        assert_eq!(config.time_of_day.morning_before, 11);
        assert_eq!(config.time_of_day.afternoon_before, 18);
        assert!(config.extra.is_empty());
    }

    #[test]
    fn reads_camel_case_document() {
        let config = OrgConfig::from_value(json!({
            "autoTagRules": [
                { "type": "name-contains", "pattern": "wine", "tag": "wine" },
                { "type": "name-suffix", "pattern": "(Zoom)", "tag": "online" }
            ],
            "derivedFields": {
                "timeOfDay": { "morning": { "before": 10 } }
            }
        }))
        .unwrap();

        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[1].kind, RuleKind::NameSuffix);
        assert_eq!(config.time_of_day.morning_before, 10);
        assert_eq!(config.time_of_day.afternoon_before, 17);
    }

    #[test]
    fn non_empty_snake_case_wins() {
        let config = OrgConfig::from_value(json!({
            "auto_tag_rules": [{ "type": "name-prefix", "pattern": "a", "tag": "snake" }],
            "autoTagRules": [{ "type": "name-prefix", "pattern": "a", "tag": "camel" }]
        }))
        .unwrap();
        assert_eq!(config.rules[0].tag, "snake");
    }

    #[test]
    fn empty_snake_case_falls_through_to_camel_case() {
        let config = OrgConfig::from_value(json!({
            "auto_tag_rules": [],
            "autoTagRules": [{ "type": "name-prefix", "pattern": "a", "tag": "camel" }],
            "derived_fields": {},
            "derivedFields": { "timeOfDay": { "afternoon": { "before": 16 } } }
        }))
        .unwrap();
        assert_eq!(config.rules[0].tag, "camel");
        assert_eq!(config.time_of_day.afternoon_before, 16);
    }

    #[test]
    fn mixed_nesting_conventions() {
        let config = OrgConfig::from_value(json!({
            "derivedFields": { "time_of_day": { "morning": { "before": 9 } } }
        }))
        .unwrap();
        assert_eq!(config.time_of_day.morning_before, 9);
    }

    #[test]
    fn out_of_range_hours_use_defaults() {
        let config = OrgConfig::from_value(json!({
            "derivedFields": {
                "timeOfDay": {
                    "morning": { "before": 30 },
                    "afternoon": { "before": -1 }
                }
            }
        }))
        .unwrap();
        assert_eq!(config.time_of_day, TimeOfDayBoundaries::default());
    }

    #[test]
    fn rule_fields_tolerate_nulls_and_unknown_types() {
        let config = OrgConfig::from_value(json!({
            "autoTagRules": [
                { "type": "regex", "pattern": "^x", "tag": "x" },
                { "pattern": null, "tag": "y" }
            ]
        }))
        .unwrap();

        assert_eq!(config.rules[0].kind, RuleKind::Unknown("regex".to_string()));
        assert_eq!(config.rules[1].kind, RuleKind::Missing);
        assert_eq!(config.rules[1].pattern, "");
    }

    #[test]
    fn writes_camel_case_and_preserves_unknown_keys() {
        let config = OrgConfig::from_value(json!({
            "auto_tag_rules": [{ "type": "name-prefix", "pattern": "Hike", "tag": "outdoors" }],
            "displayName": "Newcomers Club"
        }))
        .unwrap()
        .with_time_of_day(11, 18);

        let value = config.to_value().unwrap();
        assert_eq!(
            value,
            json!({
                "autoTagRules": [{ "type": "name-prefix", "pattern": "Hike", "tag": "outdoors" }],
                "derivedFields": {
                    "timeOfDay": {
                        "morning": { "before": 11 },
                        "afternoon": { "from": 11, "before": 18 },
                        "evening": { "from": 18 }
                    }
                },
                "displayName": "Newcomers Club"
            })
        );

        let reread = OrgConfig::from_value(value).unwrap();
        assert_eq!(reread, config);
    }

    #[test]
    fn malformed_rules_are_an_error() {
        assert!(OrgConfig::from_json(r#"{"autoTagRules": "nope"}"#).is_err());
    }
}
