//! Blocklist risk guardian.
//!
//! Evaluates whether adding an IP address or CIDR range to a network
//! blocklist is safe, and stops the blocks that would take down DNS,
//! private infrastructure, or large swaths of the internet.
//!
//! This crate provides:
//! - Candidate normalization to canonical CIDR form ([`net`])
//! - A registry of critical ranges with documentation-range exceptions
//!   ([`registry`])
//! - Blast-radius sizing for subnet blocks ([`blast`])
//! - Pluggable signal evaluators run concurrently with per-evaluator
//!   timeouts ([`signals`])
//! - A decision engine with max-based aggregation, structural overrides,
//!   TTL-cached decisions, and a synchronous audit trail ([`engine`],
//!   [`cache`], [`audit`])
//! - Human-readable recommendations ([`explain`])
//!
//! # Example
//!
//! ```no_run
//! use blockguard::{Guardian, RequestContext};
//!
//! # async fn run() {
//! let guardian = Guardian::builder().build();
//! let decision = guardian.evaluate("8.8.8.8", &RequestContext::default()).await;
//! assert!(!decision.allowed());
//! # }
//! ```

pub mod audit;
pub mod blast;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod explain;
pub mod net;
pub mod registry;
pub mod signals;
pub mod types;

pub use engine::{BulkReport, BulkSummary, Guardian, GuardianBuilder, Validation};
pub use error::{GuardianError, Result};
pub use net::NetworkRange;
pub use registry::{CriticalRangeEntry, CriticalRangeRegistry, EntryKind, RangeCategory};
pub use types::{Decision, RequestContext, RiskLevel, SignalResult, SuggestedAction};
