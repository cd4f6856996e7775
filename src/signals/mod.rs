//! Signal evaluators.
//!
//! Each evaluator inspects one dimension of a candidate block and returns
//! an optional [`SignalResult`]; `Ok(None)` means the evaluator has no
//! opinion on this candidate. Evaluators never mutate shared state: given
//! the same range, context, and backing source they produce the same
//! result.

pub mod context;
pub mod critical;
pub mod geo;
pub mod history;
pub mod reputation;
pub mod size;

use async_trait::async_trait;

use crate::error::Result;
use crate::net::NetworkRange;
use crate::types::{RequestContext, SignalResult};

/// A single risk dimension.
#[async_trait]
pub trait SignalEvaluator: Send + Sync {
    /// Short stable name used in logs and decision metadata.
    fn name(&self) -> &'static str;

    /// Score the candidate. `Ok(None)` means no opinion.
    async fn evaluate(
        &self,
        range: &NetworkRange,
        ctx: &RequestContext,
    ) -> Result<Option<SignalResult>>;
}

pub use context::ContextEvaluator;
pub use critical::CriticalOverlapEvaluator;
pub use geo::{GeoEvaluator, GeoInfo, GeoSource, StaticGeoSource};
pub use history::HistoryEvaluator;
pub use reputation::{
    ReputationEvaluator, ReputationInfo, ReputationSource, StaticReputationSource,
};
pub use size::SizeEvaluator;
