// Copyright 2025 Ironveil Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Configuration for ironveil
//!
//! Weights and thresholds are loaded once and stay immutable for the
//! engine's lifetime; changing them requires constructing a new engine.
//! Every default reproduces the documented decision behavior, so a host
//! that never writes a config file still gets the reference verdicts.
//!
//! # Configuration Hierarchy
//!
//! Configuration sources are checked in order:
//! 1. Explicit path passed to `Config::load_from_file`
//! 2. Environment variable `IRONVEIL_CONFIG`
//! 3. `ironveil.toml` in the current directory
//! 4. Built-in defaults (lowest precedence)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::neutralizer::SanitizerConfig;
use crate::scanner::heuristics::HeuristicConfig;
use crate::scanner::patterns::DocumentTuning;
use crate::scanner::scoring::{DecisionThresholds, ScoringWeights};

/// Main configuration structure for the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Rule document source
    ///
    /// Where detection patterns come from. With no source configured the
    /// engine uses its built-in rule document.
    #[serde(default)]
    pub patterns: PatternSourceConfig,

    /// Composite score weights
    ///
    /// The four weighted terms of the deterministic threat score. The
    /// defaults are load-bearing for compatibility testing.
    #[serde(default)]
    pub scoring: ScoringWeights,

    /// Threat-level thresholds
    ///
    /// Tier boundaries mapping combined signals to CLEAN through CRITICAL.
    #[serde(default)]
    pub thresholds: DecisionThresholds,

    /// Structural pre-screening thresholds
    #[serde(default)]
    pub heuristics: HeuristicConfig,

    /// Sanitization settings
    #[serde(default)]
    pub sanitizer: SanitizerConfig,
}

/// Rule document source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSourceConfig {
    /// Path to an external rule document (JSON)
    ///
    /// **Default**: none, the built-in document is used.
    /// A missing or corrupt file downgrades to the emergency rule set and
    /// is logged, never fatal.
    pub source: Option<PathBuf>,

    /// Honor the `configuration` section of the rule document
    ///
    /// **Default**: true. When enabled, weights and thresholds carried by
    /// the rule document override this config at engine construction.
    #[serde(default = "default_true")]
    pub apply_document_tuning: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for PatternSourceConfig {
    fn default() -> Self {
        Self {
            source: None,
            apply_document_tuning: true,
        }
    }
}

impl Config {
    /// Load configuration from the standard hierarchy.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("IRONVEIL_CONFIG") {
            return Self::load_from_file(&path);
        }

        let local = std::path::Path::new("ironveil.toml");
        if local.exists() {
            return Self::load_from_file("ironveil.toml");
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific TOML file.
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {path}"))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("invalid config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply a rule document's tuning section over this config.
    pub fn apply_tuning(&mut self, tuning: &DocumentTuning) {
        if let Some(weights) = tuning.weights {
            self.scoring = weights;
        }
        if let Some(thresholds) = tuning.thresholds {
            self.thresholds = thresholds;
        }
    }

    /// Reject configurations that would make verdicts meaningless.
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in [
            ("scoring.length", self.scoring.length),
            ("scoring.special_density", self.scoring.special_density),
            ("scoring.entropy", self.scoring.entropy),
            ("scoring.heuristic", self.scoring.heuristic),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                bail!("{name} must be within [0, 1], got {weight}");
            }
        }

        let t = &self.thresholds;
        if !(0.0..=1.0).contains(&t.low_score) {
            bail!("thresholds.low_score must be within [0, 1]");
        }
        if t.critical.score < t.high.score
            || t.high.score < t.medium.score
            || t.medium.score < t.low_score
        {
            bail!("threshold score tiers must not decrease from critical to low");
        }
        if t.critical.matches < t.high.matches || t.high.matches < t.medium.matches {
            bail!("threshold match tiers must not decrease from critical to medium");
        }
        if t.medium.matches == 0 {
            bail!("thresholds.medium.matches must be at least 1");
        }
        if t.critical.heuristics < t.high.heuristics || t.high.heuristics < t.medium.heuristics {
            bail!("threshold heuristic tiers must not decrease from critical to medium");
        }

        if self.heuristics.entropy_threshold <= 0.0 || self.heuristics.entropy_threshold > 8.0 {
            bail!("heuristics.entropy_threshold must be within (0, 8]");
        }
        if self.heuristics.special_run_len == 0 {
            bail!("heuristics.special_run_len must be at least 1");
        }
        if self.heuristics.keyword_combo_min == 0 {
            bail!("heuristics.keyword_combo_min must be at least 1");
        }

        if self.sanitizer.redaction_marker.is_empty() {
            bail!("sanitizer.redaction_marker must not be empty");
        }

        Ok(())
    }
}
