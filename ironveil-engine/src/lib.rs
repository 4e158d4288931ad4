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
//! Ironveil engine library
//!
//! A multi-stage threat-detection and sanitization engine for untrusted
//! request text. Feed it a parameter, form field, or cookie value and it
//! returns a verdict, a discrete threat level, and optionally a redacted
//! replacement value.
//!
//! ```
//! use ironveil_engine::{Config, ThreatFilterEngine};
//!
//! let engine = ThreatFilterEngine::new(Config::default()).unwrap();
//! let result = engine.filter_input("' OR '1'='1", true);
//! assert!(!result.is_safe);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod neutralizer;
pub mod scanner;
pub mod stats;

pub use config::Config;
pub use engine::{RuleSetInfo, SelfTestReport, ThreatFilterEngine};
pub use error::{EngineError, EngineResult};
pub use neutralizer::SanitizerConfig;
pub use scanner::{
    AnalysisResult, DecisionThresholds, HeuristicConfig, InputContext, RuleDocument, RuleSet,
    ScoringWeights, Severity, ThreatLevel,
};
pub use stats::StatsSnapshot;
