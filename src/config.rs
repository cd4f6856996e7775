//! Guardian configuration.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Classification thresholds applied to the aggregate score. Structural
/// overrides from evaluators take precedence over these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskThresholds {
    #[serde(default = "default_high_threshold")]
    pub high: f64,
    #[serde(default = "default_medium_threshold")]
    pub medium: f64,
    #[serde(default = "default_low_threshold")]
    pub low: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high: default_high_threshold(),
            medium: default_medium_threshold(),
            low: default_low_threshold(),
        }
    }
}

fn default_high_threshold() -> f64 {
    0.9
}
fn default_medium_threshold() -> f64 {
    0.7
}
fn default_low_threshold() -> f64 {
    0.3
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Tunable guardian settings. Every field has a sensible default, so an
/// empty document deserializes to a working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardianConfig {
    /// Master switch. When false, evaluation is skipped and candidates are
    /// allowed with an explanatory reason; the trail is still written.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Decision cache time-to-live.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Per-evaluator timeout; a slow evaluator is treated as no opinion.
    #[serde(default = "default_evaluator_timeout_ms")]
    pub evaluator_timeout_ms: u64,
    /// Rolling window for historical-precedent queries.
    #[serde(default = "default_history_window_days")]
    pub history_window_days: u32,
    /// Audit-record count at which the historical evaluator escalates.
    #[serde(default = "default_recent_block_threshold")]
    pub recent_block_threshold: u64,
    #[serde(default)]
    pub thresholds: RiskThresholds,
    /// Score assigned when no evaluator contributes.
    #[serde(default = "default_score_floor")]
    pub score_floor: f64,
    #[serde(default = "default_base_confidence")]
    pub base_confidence: f64,
    /// Confidence added per contributing signal, capped at 1.0.
    #[serde(default = "default_confidence_step")]
    pub confidence_step: f64,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            cache_ttl_secs: default_cache_ttl_secs(),
            evaluator_timeout_ms: default_evaluator_timeout_ms(),
            history_window_days: default_history_window_days(),
            recent_block_threshold: default_recent_block_threshold(),
            thresholds: RiskThresholds::default(),
            score_floor: default_score_floor(),
            base_confidence: default_base_confidence(),
            confidence_step: default_confidence_step(),
        }
    }
}

fn default_enabled() -> bool {
    true
}
fn default_cache_ttl_secs() -> u64 {
    3600
}
fn default_evaluator_timeout_ms() -> u64 {
    2000
}
fn default_history_window_days() -> u32 {
    30
}
fn default_recent_block_threshold() -> u64 {
    5
}
fn default_score_floor() -> f64 {
    0.1
}
fn default_base_confidence() -> f64 {
    0.6
}
fn default_confidence_step() -> f64 {
    0.2
}
