//! Threat pattern repository
//!
//! Detection rules live in a versioned hierarchical document grouped by
//! category and subcategory. Rules are compiled once at load time; a rule
//! that fails validation is discarded and counted, never fatal. When the
//! external document cannot be read or parsed at all, a small built-in
//! emergency set takes its place so the engine always starts.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::scoring::{DecisionThresholds, ScoringWeights};
use super::Severity;
use crate::error::{EngineError, EngineResult};

/// Longest accepted pattern source
const MAX_PATTERN_LEN: usize = 512;

/// Compiled-size ceiling per rule
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Hierarchical rule document
///
/// Shape: `categories.<category>.<subcategory>.patterns` is a list of
/// pattern strings with an optional per-subcategory `severity`. Keys
/// beginning with `_` at either level are metadata and carry no rules.
/// The optional `configuration` section may override scoring weights and
/// decision thresholds at engine construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDocument {
    pub version: String,
    pub categories: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<DocumentTuning>,
}

/// Tuning section of a rule document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentTuning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<ScoringWeights>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<DecisionThresholds>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SubcategoryRules {
    patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    severity: Option<Severity>,
}

/// A single compiled detection rule
#[derive(Debug)]
pub struct PatternRule {
    pub regex: regex::Regex,
    pub raw: String,
    pub tag: String,
    pub category: String,
    pub severity: Severity,
}

/// Immutable versioned snapshot of compiled rules
///
/// Replaced wholesale on reload. Scans hold an `Arc` clone of the current
/// snapshot, so concurrent readers never observe a partially updated set.
#[derive(Debug)]
pub struct RuleSet {
    pub version: String,
    pub rules: Vec<PatternRule>,
    pub discarded: usize,
}

/// Rule snapshot plus any tuning section carried by the source document
pub struct LoadedRules {
    pub set: Arc<RuleSet>,
    pub tuning: Option<DocumentTuning>,
}

impl RuleSet {
    /// Load a rule snapshot from `source`, or the built-in document when
    /// `None`. Any read or parse failure falls back to the emergency set.
    pub fn load(source: Option<&Path>) -> LoadedRules {
        let doc = match source {
            None => default_document(),
            Some(path) => match read_document(path) {
                Ok(doc) => doc,
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "rule document unavailable, falling back to emergency set"
                    );
                    return LoadedRules {
                        set: Arc::new(Self::emergency()),
                        tuning: None,
                    };
                }
            },
        };

        let tuning = doc.configuration.clone();
        let set = Self::from_document(&doc);
        if set.rules.is_empty() {
            warn!(
                version = %set.version,
                "rule document yielded no usable patterns, falling back to emergency set"
            );
            return LoadedRules {
                set: Arc::new(Self::emergency()),
                tuning: None,
            };
        }

        debug!(
            version = %set.version,
            rules = set.rules.len(),
            discarded = set.discarded,
            "rule set compiled"
        );
        LoadedRules {
            set: Arc::new(set),
            tuning,
        }
    }

    /// Flatten and compile a document into an ordered rule list.
    ///
    /// Metadata entries are excluded; every invalid subcategory or pattern
    /// is discarded and counted without aborting the rest.
    pub fn from_document(doc: &RuleDocument) -> Self {
        let mut rules = Vec::new();
        let mut discarded = 0usize;

        for (category, subtree) in &doc.categories {
            if category.starts_with('_') {
                continue;
            }
            let Some(subcategories) = subtree.as_object() else {
                warn!(category = %category, "category is not a table, skipped");
                discarded += 1;
                continue;
            };

            for (name, value) in subcategories {
                if name.starts_with('_') {
                    continue;
                }
                let sub: SubcategoryRules = match serde_json::from_value(value.clone()) {
                    Ok(sub) => sub,
                    Err(err) => {
                        warn!(
                            category = %category,
                            subcategory = %name,
                            error = %err,
                            "malformed subcategory, skipped"
                        );
                        discarded += 1;
                        continue;
                    }
                };

                let severity = sub.severity.unwrap_or(Severity::High);
                let tag = format!(
                    "PATTERN_{}_{}",
                    category.to_uppercase(),
                    name.to_uppercase()
                );
                for raw in &sub.patterns {
                    match compile_pattern(raw) {
                        Ok(regex) => rules.push(PatternRule {
                            regex,
                            raw: raw.clone(),
                            tag: tag.clone(),
                            category: category.clone(),
                            severity,
                        }),
                        Err(err) => {
                            warn!(pattern = %raw, error = %err, "discarding invalid pattern");
                            discarded += 1;
                        }
                    }
                }
            }
        }

        Self {
            version: doc.version.clone(),
            rules,
            discarded,
        }
    }

    /// Minimal hard-coded fallback set
    pub fn emergency() -> Self {
        const EMERGENCY: &[(&str, &str, &str)] = &[
            (
                "sql_injection",
                "PATTERN_SQL_INJECTION_EMERGENCY",
                r"\b(union\s+select|drop\s+table|insert\s+into|delete\s+from)\b",
            ),
            (
                "sql_injection",
                "PATTERN_SQL_INJECTION_EMERGENCY",
                r"'\s*(or|and)\s*'?\d+'?\s*=\s*'?\d+",
            ),
            (
                "script_injection",
                "PATTERN_SCRIPT_INJECTION_EMERGENCY",
                r"<script[^>]*>",
            ),
            (
                "script_injection",
                "PATTERN_SCRIPT_INJECTION_EMERGENCY",
                r"javascript\s*:",
            ),
        ];

        let mut rules = Vec::new();
        for (category, tag, raw) in EMERGENCY {
            if let Ok(regex) = compile_pattern(raw) {
                rules.push(PatternRule {
                    regex,
                    raw: (*raw).to_string(),
                    tag: (*tag).to_string(),
                    category: (*category).to_string(),
                    severity: Severity::High,
                });
            }
        }

        Self {
            version: "emergency".to_string(),
            rules,
            discarded: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn read_document(path: &Path) -> EngineResult<RuleDocument> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Validate and compile one pattern string.
///
/// Matching is case-insensitive by default. The regex engine guarantees
/// linear-time matching, so a hostile pattern cannot stall a scan.
fn compile_pattern(raw: &str) -> EngineResult<regex::Regex> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidPattern {
            pattern: raw.to_string(),
            reason: "empty pattern".to_string(),
        });
    }
    if raw.len() > MAX_PATTERN_LEN {
        let head: String = raw.chars().take(32).collect();
        return Err(EngineError::InvalidPattern {
            pattern: format!("{head}..."),
            reason: format!("pattern exceeds {MAX_PATTERN_LEN} bytes"),
        });
    }

    RegexBuilder::new(raw)
        .case_insensitive(true)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|err| EngineError::InvalidPattern {
            pattern: raw.to_string(),
            reason: err.to_string(),
        })
}

/// Write the built-in document to `path` as a starting point for
/// operator-maintained rule files.
pub fn write_default_document(path: &Path) -> EngineResult<()> {
    let doc = default_document();
    let rendered = serde_json::to_string_pretty(&doc)?;
    fs::write(path, rendered)?;
    Ok(())
}

/// The built-in rule document.
pub fn default_document() -> RuleDocument {
    let mut categories = BTreeMap::new();

    categories.insert(
        "sql_injection".to_string(),
        json!({
            "_meta": { "revision": 7 },
            "classic": {
                "patterns": [
                    r"'\s*(or|and)\s*'?\d+'?\s*=\s*'?\d+",
                    r"'\s*(or|and)\s*'[^']*'\s*=\s*'",
                    r"\badmin'\s*--",
                    r"'\s*;\s*--",
                ],
            },
            "union_based": {
                "patterns": [
                    r"\bunion\s+(all\s+)?select\b",
                    r"\bunion\s+distinct\s+select\b",
                ],
            },
            "time_based": {
                "patterns": [
                    r"\bsleep\s*\(\s*\d+\s*\)",
                    r"\bwaitfor\s+delay\b",
                    r"\bbenchmark\s*\(",
                ],
            },
            "ddl_dml": {
                "severity": "critical",
                "patterns": [
                    r"\b(drop|truncate|alter)\s+(table|database|schema|index)\b",
                    r"\binsert\s+into\s+\w+",
                    r"\bdelete\s+from\s+\w+",
                    r"\bupdate\s+\w+\s+set\b",
                    r"\bselect\b[^;]{0,200}\bfrom\b",
                ],
            },
            "exfiltration": {
                "patterns": [
                    r"\bload_file\s*\(",
                    r"\binto\s+(out|dump)file\b",
                    r"\bextractvalue\s*\(",
                    r"\bupdatexml\s*\(",
                ],
            },
        }),
    );

    categories.insert(
        "script_injection".to_string(),
        json!({
            "tags": {
                "patterns": [
                    r"<script[^>]*>",
                    r"</script\s*>",
                    r"<iframe[^>]*>",
                    r"<(object|embed|applet)\b[^>]*>",
                ],
            },
            "handlers": {
                "patterns": [
                    r"\bon(error|load|click|mouseover|mouseout|focus|blur|submit|change|keydown|keyup)\s*=",
                ],
            },
            "protocols": {
                "patterns": [
                    r"javascript\s*:",
                    r"vbscript\s*:",
                    r"data\s*:\s*text/html",
                ],
            },
            "dom": {
                "severity": "critical",
                "patterns": [
                    r"\bdocument\.(cookie|write|location)\b",
                    r"\bwindow\.location\b",
                    r"\beval\s*\(",
                    r"\b(settimeout|setinterval)\s*\(",
                ],
            },
        }),
    );

    categories.insert(
        "command_injection".to_string(),
        json!({
            "separators": {
                "severity": "critical",
                "patterns": [
                    r";\s*(rm|cat|ls|wget|curl|nc|bash|sh|chmod|chown)\b",
                    r"\|\s*(sh|bash|nc|python|perl|ruby)\b",
                    r"&&\s*(rm|cat|wget|curl|nc)\b",
                ],
            },
            "substitution": {
                "severity": "critical",
                "patterns": [
                    r"\$\([^)]+\)",
                    r"`[^`]+`",
                    r"\$\{[^}]+\}",
                ],
            },
            "binaries": {
                "severity": "critical",
                "patterns": [
                    r"\b(rm|del)\s+-[rf]{1,2}\b",
                    r"/bin/(sh|bash|zsh|dash)\b",
                    r"\bcmd\.exe\b",
                    r"\bpowershell\b",
                    r"/etc/(passwd|shadow)\b",
                ],
            },
        }),
    );

    categories.insert(
        "server_code_injection".to_string(),
        json!({
            "php_tags": {
                "patterns": [
                    r"<\?php\b",
                    r"<\?=",
                ],
            },
            "eval_calls": {
                "severity": "critical",
                "patterns": [
                    r"\b(eval|assert|system|passthru|shell_exec|popen|proc_open)\s*\(",
                    r"\bbase64_decode\s*\(",
                    r"\bpreg_replace\s*\([^)]*/e",
                ],
            },
            "includes": {
                "patterns": [
                    r"\b(include|require)(_once)?\s*\(",
                    r"php://(input|filter)",
                ],
            },
        }),
    );

    categories.insert(
        "template_injection".to_string(),
        json!({
            "expressions": {
                "patterns": [
                    r"\{\{[^}]*\}\}",
                    r"\{%[^%]*%\}",
                    r"<%=?[^%]+%>",
                ],
            },
        }),
    );

    categories.insert(
        "markup_injection".to_string(),
        json!({
            "dangerous_tags": {
                "patterns": [
                    r"<(meta|base|form|link)\b[^>]*>",
                    r"<svg\b[^>]*\bon\w+\s*=",
                ],
            },
            "entity_flood": {
                "patterns": [
                    r"(&#x?[0-9a-f]{2,8};){3,}",
                ],
            },
        }),
    );

    categories.insert(
        "path_traversal".to_string(),
        json!({
            "unix": {
                "patterns": [
                    r"\.\./(\.\./)+",
                    r"\.\./(\.\./)*(etc|bin|usr|var|home|root)\b",
                    r"/etc/(passwd|shadow|hosts)\b",
                ],
            },
            "windows": {
                "patterns": [
                    r"\.\.\\(\.\.\\)+",
                    r"\.\.\\(\.\.\\)*(windows|system32|users)\b",
                ],
            },
            "encoded": {
                "patterns": [
                    r"%2e%2e[/\\]",
                    r"%252e%252e",
                    r"\.\.%2f",
                    r"\x00",
                ],
            },
        }),
    );

    categories.insert(
        "protocol_smuggling".to_string(),
        json!({
            "crlf": {
                "patterns": [
                    r"[\r\n]+\s*(set-cookie|location|content-(length|type))\s*:",
                    r"%0d%0a",
                ],
            },
            "request_smuggling": {
                "patterns": [
                    r"\btransfer-encoding\s*:\s*chunked",
                    r"\b(get|post|put|delete)\s+/\S*\s+http/1\.[01]\b",
                ],
            },
        }),
    );

    RuleDocument {
        version: "1.4.0".to_string(),
        categories,
        configuration: None,
    }
}
