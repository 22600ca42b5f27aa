//! Auto-tag rule evaluation.

use clubcal_core::{RuleKind, TagRule};
use tracing::trace;

/// Returns the tags of every rule matching `name`, in rule order.
///
/// Matching is case-insensitive. Rules with an empty pattern or tag are
/// skipped, as are rules of an unrecognized type. Duplicates are kept; the
/// caller deduplicates the final tag set.
pub fn apply_tag_rules(name: &str, rules: &[TagRule]) -> Vec<String> {
    let name = name.to_lowercase();

    rules
        .iter()
        .filter(|rule| !rule.pattern.is_empty() && !rule.tag.is_empty())
        .filter(|rule| rule_matches(&name, rule))
        .map(|rule| rule.tag.clone())
        .collect()
}

/// `name` must already be lowercase.
fn rule_matches(name: &str, rule: &TagRule) -> bool {
    let pattern = rule.pattern.to_lowercase();
    match rule.kind {
        RuleKind::NamePrefix => name.starts_with(&pattern),
        RuleKind::NameContains => name.contains(&pattern),
        RuleKind::NameSuffix => name.ends_with(&pattern),
        RuleKind::Unknown(_) | RuleKind::Missing => {
            trace!(kind = %rule.kind, "skipping rule with unrecognized type");
            false
        }
    }
}
