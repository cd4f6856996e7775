//! Core data model shared across the guardian.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Risk level
// ---------------------------------------------------------------------------

/// Risk classification for a candidate block, ordered from safest to most
/// dangerous.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Suggested action
// ---------------------------------------------------------------------------

/// What the caller should do with the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Safe to add to the blocklist.
    Allow,
    /// Add with caution; monitor for disruption afterwards.
    Warn,
    /// Hold for a human decision.
    ManualReview,
    /// Do not add; the block itself is the hazard.
    Block,
    /// The candidate was malformed and must not be processed.
    Reject,
}

impl SuggestedAction {
    /// The action implied by a risk level.
    pub fn for_level(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Safe | RiskLevel::Low => SuggestedAction::Allow,
            RiskLevel::Medium => SuggestedAction::Warn,
            RiskLevel::High => SuggestedAction::ManualReview,
            RiskLevel::Critical => SuggestedAction::Block,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestedAction::Allow => "allow",
            SuggestedAction::Warn => "warn",
            SuggestedAction::ManualReview => "manual_review",
            SuggestedAction::Block => "block",
            SuggestedAction::Reject => "reject",
        }
    }
}

impl fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Signal result
// ---------------------------------------------------------------------------

/// Output of a single signal evaluator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalResult {
    /// Risk contribution in `[0.0, 1.0]`.
    pub score: f64,
    /// Human-readable findings, in the order they were discovered.
    #[serde(default)]
    pub reasons: Vec<String>,
    /// Floor the final classification at this level regardless of score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_level: Option<RiskLevel>,
    /// Structured data backing the findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl SignalResult {
    pub fn scored(score: f64) -> Self {
        Self {
            score,
            ..Self::default()
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reasons.push(reason.into());
        self
    }

    pub fn with_override(mut self, level: RiskLevel) -> Self {
        self.override_level = Some(level);
        self
    }
}

// ---------------------------------------------------------------------------
// Request context
// ---------------------------------------------------------------------------

/// Caller-supplied context for a block request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// The block was requested by an automated system, not a person.
    #[serde(default)]
    pub automated: bool,
    /// The candidate is part of a bulk submission.
    #[serde(default)]
    pub bulk_operation: bool,
    /// Identifier of the requesting system, e.g. `"honeypot"` or `"ids"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// The immutable verdict for one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Unique id for this evaluation.
    pub id: Uuid,
    /// Canonical `base/prefix` form, or the raw input when parsing failed.
    pub range: String,
    pub risk_level: RiskLevel,
    /// Aggregate risk score in `[0.0, 1.0]`.
    pub score: f64,
    /// Confidence in the assessment, grows with the number of contributing
    /// signals.
    pub confidence: f64,
    /// Findings in evaluator-registration order.
    pub reasons: Vec<String>,
    pub action: SuggestedAction,
    pub evaluated_at: DateTime<Utc>,
    /// Network summary and per-evaluator snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Decision {
    /// True when the caller may proceed with adding the candidate to the
    /// blocklist.
    pub fn allowed(&self) -> bool {
        matches!(
            self.action,
            SuggestedAction::Allow | SuggestedAction::Warn
        )
    }
}
