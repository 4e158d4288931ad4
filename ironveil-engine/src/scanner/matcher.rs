//! Signature matching over the compiled rule set
//!
//! Every loaded rule is evaluated against the normalized text. This stage
//! dominates processing cost and is linear in the number of rules.

use super::patterns::RuleSet;
use super::Severity;

/// A rule that matched the scanned text
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    /// Index into the snapshot's rule list, used for redaction
    pub rule_index: usize,
    pub tag: String,
    pub category: String,
    pub severity: Severity,
    /// Byte span of the first occurrence
    pub span: (usize, usize),
}

/// Scan normalized text against every rule in the snapshot.
///
/// Each matching rule is recorded once with the span of its first
/// occurrence.
pub fn scan(text: &str, rules: &RuleSet) -> Vec<PatternMatch> {
    let mut matches = Vec::new();

    for (index, rule) in rules.rules.iter().enumerate() {
        if let Some(found) = rule.regex.find(text) {
            matches.push(PatternMatch {
                rule_index: index,
                tag: rule.tag.clone(),
                category: rule.category.clone(),
                severity: rule.severity,
                span: (found.start(), found.end()),
            });
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::patterns::{default_document, RuleSet};

    fn rules() -> RuleSet {
        RuleSet::from_document(&default_document())
    }

    #[test]
    fn test_clean_text_has_no_matches() {
        assert!(scan("Hello World", &rules()).is_empty());
        assert!(scan("", &rules()).is_empty());
    }

    #[test]
    fn test_sql_tautology_matches() {
        let matches = scan("' OR '1'='1", &rules());
        assert!(matches
            .iter()
            .any(|m| m.tag == "PATTERN_SQL_INJECTION_CLASSIC"));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let matches = scan("1 uNiOn SeLeCt password", &rules());
        assert!(matches
            .iter()
            .any(|m| m.tag == "PATTERN_SQL_INJECTION_UNION_BASED"));
    }

    #[test]
    fn test_each_rule_recorded_once() {
        let matches = scan("<script>a</script><script>b</script>", &rules());
        let script_tags = matches
            .iter()
            .filter(|m| m.tag == "PATTERN_SCRIPT_INJECTION_TAGS")
            .count();
        // two distinct tag rules match, each once
        assert_eq!(script_tags, 2);
    }

    #[test]
    fn test_severity_carried_from_rule() {
        let matches = scan("; rm -rf /", &rules());
        assert!(matches
            .iter()
            .any(|m| m.category == "command_injection" && m.severity == Severity::Critical));
    }

    #[test]
    fn test_span_points_at_first_occurrence() {
        let matches = scan("abc <script>x</script>", &rules());
        let hit = matches
            .iter()
            .find(|m| m.tag == "PATTERN_SCRIPT_INJECTION_TAGS")
            .unwrap();
        assert_eq!(hit.span.0, 4);
    }
}
