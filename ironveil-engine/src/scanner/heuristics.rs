//! Structural pre-screening
//!
//! Cheap pattern-independent checks that run before signature matching.
//! Each triggered check contributes one point to the suspicion score and
//! one tag to the report. The heuristic score never decides safety on its
//! own.

use serde::{Deserialize, Serialize};

pub const TAG_EXCESSIVE_QUOTES: &str = "HEURISTIC_EXCESSIVE_QUOTES";
pub const TAG_SPECIAL_RUN: &str = "HEURISTIC_SPECIAL_RUN";
pub const TAG_KEYWORD_COMBO: &str = "HEURISTIC_KEYWORD_COMBO";
pub const TAG_HIGH_ENTROPY: &str = "HEURISTIC_HIGH_ENTROPY";

/// Scripting and shell keywords whose co-occurrence is suspicious
const SCRIPT_KEYWORDS: &[&str] = &["script", "eval", "exec", "system", "shell", "cmd"];

/// Characters counted by the special-run check
const RUN_CHARS: &[char] = &['<', '>', '=', '!', '&', '|', '%'];

/// Thresholds for the structural checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicConfig {
    /// Quote characters tolerated before the input is flagged
    #[serde(default = "default_max_quote_chars")]
    pub max_quote_chars: usize,

    /// Length of a special-character run that triggers a flag
    #[serde(default = "default_special_run_len")]
    pub special_run_len: usize,

    /// Distinct scripting keywords required to trigger the combo flag
    #[serde(default = "default_keyword_combo_min")]
    pub keyword_combo_min: usize,

    /// Entropy above this value is treated as suspicious
    #[serde(default = "default_entropy_threshold")]
    pub entropy_threshold: f64,

    /// Entropy is only considered for inputs longer than this
    #[serde(default = "default_entropy_min_chars")]
    pub entropy_min_chars: usize,
}

const fn default_max_quote_chars() -> usize {
    3
}
const fn default_special_run_len() -> usize {
    3
}
const fn default_keyword_combo_min() -> usize {
    2
}
const fn default_entropy_threshold() -> f64 {
    4.5
}
const fn default_entropy_min_chars() -> usize {
    20
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            max_quote_chars: default_max_quote_chars(),
            special_run_len: default_special_run_len(),
            keyword_combo_min: default_keyword_combo_min(),
            entropy_threshold: default_entropy_threshold(),
            entropy_min_chars: default_entropy_min_chars(),
        }
    }
}

/// Outcome of the structural checks for one input
#[derive(Debug, Clone, Default)]
pub struct HeuristicReport {
    pub tags: Vec<String>,
    pub score: u32,
    pub entropy: f64,
}

/// Run the four independent structural checks over normalized text.
pub fn analyze(text: &str, entropy: f64, config: &HeuristicConfig) -> HeuristicReport {
    let mut report = HeuristicReport {
        entropy,
        ..Default::default()
    };

    if quote_count(text) > config.max_quote_chars {
        flag(&mut report, TAG_EXCESSIVE_QUOTES);
    }

    if has_special_run(text, config.special_run_len) {
        flag(&mut report, TAG_SPECIAL_RUN);
    }

    if distinct_keywords(text) >= config.keyword_combo_min {
        flag(&mut report, TAG_KEYWORD_COMBO);
    }

    if entropy > config.entropy_threshold && text.chars().count() > config.entropy_min_chars {
        flag(&mut report, TAG_HIGH_ENTROPY);
    }

    report
}

fn flag(report: &mut HeuristicReport, tag: &str) {
    report.tags.push(tag.to_string());
    report.score += 1;
}

fn quote_count(text: &str) -> usize {
    text.chars()
        .filter(|ch| matches!(ch, '\'' | '"' | '`'))
        .count()
}

fn has_special_run(text: &str, run_len: usize) -> bool {
    let mut run = 0usize;
    for ch in text.chars() {
        if RUN_CHARS.contains(&ch) {
            run += 1;
            if run >= run_len {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

fn distinct_keywords(text: &str) -> usize {
    let lower = text.to_lowercase();
    SCRIPT_KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(**keyword))
        .count()
}
