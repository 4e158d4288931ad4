//! Composite scoring and threat-level mapping
//!
//! The composite score is a deterministic weighted sum over length,
//! special-character density, entropy, and heuristic density. It is
//! reported as `ml_score` for compatibility but is not a trained model;
//! replacing it with a real classifier invalidates every threshold below.

use serde::{Deserialize, Serialize};

use super::ThreatLevel;

/// Weights of the composite score terms
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Input length term, saturating at 100 characters
    #[serde(default = "default_length_weight")]
    pub length: f64,

    /// Special characters per character of input
    #[serde(default = "default_special_density_weight")]
    pub special_density: f64,

    /// Shannon entropy scaled by its 8-bit maximum
    #[serde(default = "default_entropy_weight")]
    pub entropy: f64,

    /// Heuristic score scaled by ten
    #[serde(default = "default_heuristic_weight")]
    pub heuristic: f64,
}

const fn default_length_weight() -> f64 {
    0.1
}
const fn default_special_density_weight() -> f64 {
    0.3
}
const fn default_entropy_weight() -> f64 {
    0.4
}
const fn default_heuristic_weight() -> f64 {
    0.2
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            length: default_length_weight(),
            special_density: default_special_density_weight(),
            entropy: default_entropy_weight(),
            heuristic: default_heuristic_weight(),
        }
    }
}

/// One tier of the threat-level ladder
///
/// A tier is reached when the pattern-match count meets `matches`, the
/// composite score exceeds `score`, or the heuristic score exceeds
/// `heuristics`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DecisionTier {
    pub matches: usize,
    pub score: f64,
    pub heuristics: u32,
}

/// Threat-level thresholds
///
/// The defaults are load-bearing for compatibility testing and must not
/// drift silently. Tiers are checked from critical downward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DecisionThresholds {
    #[serde(default = "default_critical_tier")]
    pub critical: DecisionTier,

    #[serde(default = "default_high_tier")]
    pub high: DecisionTier,

    #[serde(default = "default_medium_tier")]
    pub medium: DecisionTier,

    /// Composite score above which an otherwise clean input maps to LOW
    #[serde(default = "default_low_score")]
    pub low_score: f64,
}

const fn default_critical_tier() -> DecisionTier {
    DecisionTier {
        matches: 5,
        score: 0.8,
        heuristics: 4,
    }
}

const fn default_high_tier() -> DecisionTier {
    DecisionTier {
        matches: 3,
        score: 0.6,
        heuristics: 2,
    }
}

const fn default_medium_tier() -> DecisionTier {
    DecisionTier {
        matches: 1,
        score: 0.4,
        heuristics: 1,
    }
}

const fn default_low_score() -> f64 {
    0.2
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            critical: default_critical_tier(),
            high: default_high_tier(),
            medium: default_medium_tier(),
            low_score: default_low_score(),
        }
    }
}

/// Compute the bounded composite score for normalized text.
///
/// Empty input short-circuits to 0.
pub fn composite_score(
    text: &str,
    heuristic_score: u32,
    entropy: f64,
    weights: &ScoringWeights,
) -> f64 {
    let len = text.chars().count();
    if len == 0 {
        return 0.0;
    }

    let special = text
        .chars()
        .filter(|ch| !ch.is_alphanumeric() && !ch.is_whitespace())
        .count();

    let raw = weights.length * (len as f64 / 100.0).min(1.0)
        + weights.special_density * (special as f64 / len as f64)
        + weights.entropy * (entropy / 8.0)
        + weights.heuristic * (f64::from(heuristic_score) / 10.0);

    raw.clamp(0.0, 1.0)
}

/// Binary safety verdict over the combined signals.
pub fn is_unsafe(
    match_count: usize,
    score: f64,
    heuristic_score: u32,
    thresholds: &DecisionThresholds,
) -> bool {
    match_count > 0 || score > thresholds.high.score || heuristic_score > thresholds.high.heuristics
}

/// Map the combined signals to a discrete threat level.
pub fn threat_level(
    match_count: usize,
    score: f64,
    heuristic_score: u32,
    thresholds: &DecisionThresholds,
) -> ThreatLevel {
    if tier_reached(&thresholds.critical, match_count, score, heuristic_score) {
        ThreatLevel::Critical
    } else if tier_reached(&thresholds.high, match_count, score, heuristic_score) {
        ThreatLevel::High
    } else if tier_reached(&thresholds.medium, match_count, score, heuristic_score) {
        ThreatLevel::Medium
    } else if score > thresholds.low_score {
        ThreatLevel::Low
    } else {
        ThreatLevel::Clean
    }
}

fn tier_reached(tier: &DecisionTier, match_count: usize, score: f64, heuristic_score: u32) -> bool {
    match_count >= tier.matches || score > tier.score || heuristic_score > tier.heuristics
}
