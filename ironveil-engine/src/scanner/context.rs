//! Contextual classification
//!
//! Tags an input with the execution contexts it resembles. The tags feed
//! the analysis report only; the safety decision never reads them.

use once_cell::sync::Lazy;
use regex::Regex;

use super::InputContext;

static SQL_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(select|insert|update|delete|drop)\b").expect("static regex")
});

/// Quote-adjacent boolean operators, the shape of `' OR '1'='1`
static SQL_TAUTOLOGY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)['"`]\s*(or|and)\s|\s(or|and)\s*['"`]"#).expect("static regex"));

static SCRIPT_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<script|javascript\s*:|\b(function|var|let|const|eval|alert)\b|=>")
        .expect("static regex")
});

static SERVER_CODE_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\?(php|=)?|<%|\$[a-z_][a-z0-9_]*|\b(echo|print)\b").expect("static regex")
});

/// Tag-like or entity-like substrings
static MARKUP_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[a-zA-Z][^>]*>|&#?[a-zA-Z0-9]+;").expect("static regex"));

/// Classify normalized text into zero or more execution contexts.
pub fn classify(text: &str) -> Vec<InputContext> {
    let mut contexts = Vec::new();

    if SQL_KEYWORDS.is_match(text) || SQL_TAUTOLOGY.is_match(text) {
        contexts.push(InputContext::Sql);
    }
    if SCRIPT_MARKERS.is_match(text) {
        contexts.push(InputContext::Script);
    }
    if SERVER_CODE_MARKERS.is_match(text) {
        contexts.push(InputContext::ServerCode);
    }
    if MARKUP_MARKERS.is_match(text) {
        contexts.push(InputContext::Markup);
    }

    contexts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_has_no_context() {
        assert!(classify("Hello World").is_empty());
    }

    #[test]
    fn test_sql_keywords() {
        let contexts = classify("SELECT name FROM users");
        assert!(contexts.contains(&InputContext::Sql));
    }

    #[test]
    fn test_sql_tautology_shape() {
        let contexts = classify("' OR '1'='1");
        assert!(contexts.contains(&InputContext::Sql));
    }

    #[test]
    fn test_script_and_markup() {
        let contexts = classify("<script>alert(1)</script>");
        assert!(contexts.contains(&InputContext::Script));
        assert!(contexts.contains(&InputContext::Markup));
    }

    #[test]
    fn test_server_code() {
        let contexts = classify("<?php echo $user; ?>");
        assert!(contexts.contains(&InputContext::ServerCode));

        let contexts = classify("$_GET['id']");
        assert!(contexts.contains(&InputContext::ServerCode));
    }

    #[test]
    fn test_entity_is_markup() {
        let contexts = classify("&lt;b&gt;");
        assert!(contexts.contains(&InputContext::Markup));
    }

    #[test]
    fn test_arrow_function_is_script() {
        let contexts = classify("items.map(x => x.id)");
        assert!(contexts.contains(&InputContext::Script));
    }
}
