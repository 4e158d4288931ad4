//! Threat analysis module
//!
//! Leaf-first pipeline: input text is canonicalized, scored for entropy and
//! structural suspicion, matched against the loaded rule set, classified by
//! execution context, and mapped to a discrete threat level.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod context;
pub mod entropy;
pub mod heuristics;
pub mod matcher;
pub mod normalize;
pub mod patterns;
pub mod scoring;

pub use context::classify;
pub use entropy::shannon_entropy;
pub use heuristics::{HeuristicConfig, HeuristicReport};
pub use matcher::PatternMatch;
pub use normalize::normalize;
pub use patterns::{PatternRule, RuleDocument, RuleSet};
pub use scoring::{DecisionThresholds, ScoringWeights};

/// Severity tag attached to an individual detection rule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Discrete severity classification of an analyzed input
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    Clean,
    Low,
    Medium,
    High,
    Critical,
}

/// Coarse execution context an input resembles
///
/// Purely informational. Context tags feed the report, not the safety
/// decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InputContext {
    Sql,
    Script,
    ServerCode,
    Markup,
}

/// Outcome of a single `filter_input` call
///
/// Immutable value object returned by value. `filtered_text` equals
/// `original_text` unless the input was judged unsafe and sanitized in
/// strict mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub is_safe: bool,
    pub filtered_text: String,
    pub original_text: String,
    /// Ordered threat tags, heuristic findings first, then pattern hits
    pub threats_detected: Vec<String>,
    pub heuristic_score: u32,
    /// Deterministic weighted composite in [0, 1], not a trained model
    pub ml_score: f64,
    pub entropy: f64,
    pub contexts: Vec<InputContext>,
    pub processing_time_ms: f64,
    pub threat_level: ThreatLevel,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreatLevel::Clean => write!(f, "CLEAN"),
            ThreatLevel::Low => write!(f, "LOW"),
            ThreatLevel::Medium => write!(f, "MEDIUM"),
            ThreatLevel::High => write!(f, "HIGH"),
            ThreatLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl fmt::Display for InputContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputContext::Sql => write!(f, "sql"),
            InputContext::Script => write!(f, "script"),
            InputContext::ServerCode => write!(f, "server_code"),
            InputContext::Markup => write!(f, "markup"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threat_level_ordering() {
        assert!(ThreatLevel::Clean < ThreatLevel::Low);
        assert!(ThreatLevel::Low < ThreatLevel::Medium);
        assert!(ThreatLevel::Medium < ThreatLevel::High);
        assert!(ThreatLevel::High < ThreatLevel::Critical);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_threat_level_display() {
        assert_eq!(ThreatLevel::Clean.to_string(), "CLEAN");
        assert_eq!(ThreatLevel::Critical.to_string(), "CRITICAL");
    }

    #[test]
    fn test_context_serialization() {
        let json = serde_json::to_string(&InputContext::ServerCode).unwrap();
        assert_eq!(json, "\"server_code\"");
    }
}
