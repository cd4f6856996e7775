//! Historical-precedent scoring from the audit trail.

use std::sync::Arc;

use async_trait::async_trait;

use crate::audit::AuditStore;
use crate::error::Result;
use crate::net::NetworkRange;
use crate::types::{RequestContext, RiskLevel, SignalResult};

use super::SignalEvaluator;

/// Scores prior verdicts and recent blocking churn around the candidate.
pub struct HistoryEvaluator {
    store: Arc<dyn AuditStore>,
    window_days: u32,
    block_threshold: u64,
}

impl HistoryEvaluator {
    pub fn new(store: Arc<dyn AuditStore>, window_days: u32, block_threshold: u64) -> Self {
        Self {
            store,
            window_days,
            block_threshold,
        }
    }
}

#[async_trait]
impl SignalEvaluator for HistoryEvaluator {
    fn name(&self) -> &'static str {
        "historical"
    }

    async fn evaluate(
        &self,
        range: &NetworkRange,
        _ctx: &RequestContext,
    ) -> Result<Option<SignalResult>> {
        let mut score: f64 = 0.0;
        let mut reasons = Vec::new();

        if let Some(previous) = self.store.recent_decision(range)? {
            if previous.risk_level >= RiskLevel::High {
                reasons.push(format!(
                    "previously flagged as {} risk",
                    previous.risk_level
                ));
                score = 0.6;
            }
        }

        let recent = self
            .store
            .count_recent_blocks(range.base_addr(), self.window_days)?;
        if recent >= self.block_threshold {
            reasons.push(format!(
                "similar addresses evaluated {} times in the last {} days",
                recent, self.window_days
            ));
            score = score.max(0.4);
        }

        if reasons.is_empty() {
            return Ok(None);
        }
        Ok(Some(SignalResult {
            score,
            reasons,
            override_level: None,
            metadata: None,
        }))
    }
}
