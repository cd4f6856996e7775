//! Error types for the guardian.

use thiserror::Error;

/// Errors produced by guardian subsystems.
///
/// Note that a malformed candidate passed to [`crate::Guardian::evaluate`]
/// never surfaces as an error; the engine converts it into a terminal
/// reject decision. `InvalidCandidate` is returned only by the lower-level
/// parsing API.
#[derive(Debug, Error)]
pub enum GuardianError {
    /// The candidate string is not an IP address or CIDR range.
    #[error("invalid network candidate {candidate:?}: {reason}")]
    InvalidCandidate { candidate: String, reason: String },

    /// A signal evaluator failed.
    #[error("evaluator {name} failed: {message}")]
    Evaluator { name: &'static str, message: String },

    /// The decision cache backend failed.
    #[error("decision cache error: {0}")]
    Cache(String),

    /// The audit store backend failed.
    #[error("audit store error: {0}")]
    AuditStore(String),

    /// JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for guardian operations.
pub type Result<T> = std::result::Result<T, GuardianError>;
