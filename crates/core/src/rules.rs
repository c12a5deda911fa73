//! Evaluates user-authored archive rules against document text.

use storage::ArchiveRule;
use tracing::debug;

/// Confidence reported for a match when the rule itself carries none.
pub const DEFAULT_RULE_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Clone)]
pub struct RuleMatch<'a> {
    pub rule: &'a ArchiveRule,
    pub confidence: f64,
    pub rationale: String,
}

/// Highest priority first; ties keep original order (stable sort). A rule
/// matches only when every one of its tokens is a case-insensitive
/// substring of `text` -- conjunction, never partial scoring.
pub fn match_rules<'a>(text: &str, rules: &'a [ArchiveRule]) -> Option<RuleMatch<'a>> {
    let lower = text.to_lowercase();
    let mut enabled: Vec<&ArchiveRule> = rules.iter().filter(|r| r.enabled).collect();
    enabled.sort_by_key(|r| std::cmp::Reverse(r.priority));

    for rule in enabled {
        let matches_all = rule
            .when
            .contains_tokens
            .iter()
            .all(|token| lower.contains(&token.to_lowercase()));
        if matches_all {
            debug!(rule = %rule.name, "rule matched");
            return Some(RuleMatch {
                rule,
                confidence: rule.when.minimum_confidence.unwrap_or(DEFAULT_RULE_CONFIDENCE),
                rationale: format!("Rule {} matched", rule.name),
            });
        }
    }
    None
}
