//! Request-context scoring.

use async_trait::async_trait;

use crate::error::Result;
use crate::net::NetworkRange;
use crate::types::{RequestContext, SignalResult};

use super::SignalEvaluator;

/// Sources whose requests carry an elevated false-positive floor.
const NOISY_SOURCES: &[&str] = &["honeypot", "ids", "automated_scanner"];

/// Scores caller-supplied context flags.
pub struct ContextEvaluator;

#[async_trait]
impl SignalEvaluator for ContextEvaluator {
    fn name(&self) -> &'static str {
        "request-context"
    }

    async fn evaluate(
        &self,
        _range: &NetworkRange,
        ctx: &RequestContext,
    ) -> Result<Option<SignalResult>> {
        let mut score: f64 = 0.0;
        let mut reasons = Vec::new();

        if ctx.automated {
            reasons.push("automated block request, extra validation required".to_string());
            score = 0.4;
        }
        if let Some(source) = &ctx.source {
            if NOISY_SOURCES.contains(&source.as_str()) {
                // Score floor only; noisy sources do not add a reason.
                score = score.max(0.2);
            }
        }
        if ctx.bulk_operation {
            reasons.push("part of a bulk operation, elevated chance of error".to_string());
            score = score.max(0.5);
        }

        if reasons.is_empty() && score <= 0.0 {
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
