//! Threat neutralization
//!
//! Rewrites unsafe input so recognized attack signatures cannot survive
//! into downstream consumers. Runs only when the verdict is unsafe and the
//! caller asked for strict mode.
//!
//! Order contract: pattern-based redaction runs before the blanket
//! character strip. Stripping first would remove characters that later
//! redaction patterns need to see.

use serde::{Deserialize, Serialize};

use crate::scanner::matcher::PatternMatch;
use crate::scanner::patterns::RuleSet;

/// Characters removed unconditionally from unsafe input
const DANGEROUS_CHARS: &[char] = &[
    '<', '>', '"', '\'', '&', ';', '(', ')', '{', '}', '[', ']',
];

/// Sanitizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizerConfig {
    /// Replacement for every occurrence of a matched pattern
    #[serde(default = "default_redaction_marker")]
    pub redaction_marker: String,
}

fn default_redaction_marker() -> String {
    "[FILTERED]".to_string()
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            redaction_marker: default_redaction_marker(),
        }
    }
}

/// Sanitize normalized text judged unsafe.
///
/// Every occurrence of each matched rule is replaced with the redaction
/// marker, the dangerous character set is stripped, and whitespace is
/// collapsed to single spaces.
pub fn sanitize(
    normalized: &str,
    matches: &[PatternMatch],
    rules: &RuleSet,
    config: &SanitizerConfig,
) -> String {
    let mut text = normalized.to_string();

    for hit in matches {
        if let Some(rule) = rules.rules.get(hit.rule_index) {
            text = rule
                .regex
                .replace_all(&text, config.redaction_marker.as_str())
                .into_owned();
        }
    }

    let stripped: String = text
        .chars()
        .filter(|ch| !DANGEROUS_CHARS.contains(ch))
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::matcher::scan;
    use crate::scanner::patterns::{default_document, RuleSet};

    fn sanitize_default(text: &str) -> String {
        let rules = RuleSet::from_document(&default_document());
        let matches = scan(text, &rules);
        sanitize(text, &matches, &rules, &SanitizerConfig::default())
    }

    #[test]
    fn test_script_tag_is_redacted() {
        let out = sanitize_default("<script>alert(1)</script>");
        assert!(!out.contains("<script>"));
        assert!(!out.contains('<'));
        assert!(out.contains("FILTERED"));
    }

    #[test]
    fn test_every_occurrence_is_redacted() {
        let out = sanitize_default("<script>a</script> and <script>b</script>");
        assert!(!out.contains("script>"));
        assert!(out.matches("FILTERED").count() >= 2);
    }

    #[test]
    fn test_dangerous_characters_stripped() {
        let rules = RuleSet::from_document(&default_document());
        let out = sanitize("a <b> {c} [d] & 'e';", &[], &rules, &SanitizerConfig::default());
        assert_eq!(out, "a b c d e");
    }

    #[test]
    fn test_whitespace_collapsed_and_trimmed() {
        let rules = RuleSet::from_document(&default_document());
        let out = sanitize("  a\t\tb \n c  ", &[], &rules, &SanitizerConfig::default());
        assert_eq!(out, "a b c");
    }

    #[test]
    fn test_redaction_runs_before_stripping() {
        // stripping first would break the quote the pattern anchors on
        let out = sanitize_default("id=1' OR '1'='1");
        assert!(out.contains("FILTERED"));
        assert!(!out.contains("OR '1'='1"));
    }

    #[test]
    fn test_custom_marker() {
        let rules = RuleSet::from_document(&default_document());
        let matches = scan("<script>x</script>", &rules);
        let config = SanitizerConfig {
            redaction_marker: "XX-REMOVED-XX".to_string(),
        };
        let out = sanitize("<script>x</script>", &matches, &rules, &config);
        assert!(out.contains("XX-REMOVED-XX"));
    }
}
