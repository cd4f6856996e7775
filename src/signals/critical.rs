//! Critical-infrastructure overlap evaluation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::net::NetworkRange;
use crate::registry::CriticalRangeRegistry;
use crate::types::{RequestContext, RiskLevel, SignalResult};

use super::SignalEvaluator;

/// Score contributed by any critical-range match.
const OVERLAP_SCORE: f64 = 0.95;

/// Flags candidates that intersect known critical infrastructure. Any match
/// floors the final classification at CRITICAL.
pub struct CriticalOverlapEvaluator {
    registry: Arc<CriticalRangeRegistry>,
}

impl CriticalOverlapEvaluator {
    pub fn new(registry: Arc<CriticalRangeRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl SignalEvaluator for CriticalOverlapEvaluator {
    fn name(&self) -> &'static str {
        "critical-overlap"
    }

    async fn evaluate(
        &self,
        range: &NetworkRange,
        _ctx: &RequestContext,
    ) -> Result<Option<SignalResult>> {
        let matches = self.registry.overlaps(range);
        if matches.is_empty() {
            return Ok(None);
        }

        let mut result =
            SignalResult::scored(OVERLAP_SCORE).with_override(RiskLevel::Critical);
        for entry in &matches {
            result.reasons.push(format!(
                "critical: overlaps {} ({})",
                entry.range,
                entry.category.describe()
            ));
            result.reasons.push(entry.rationale.clone());
        }
        result.metadata = Some(serde_json::json!({
            "matched_ranges": matches
                .iter()
                .map(|m| m.range.to_string())
                .collect::<Vec<_>>(),
        }));
        Ok(Some(result))
    }
}
