//! Blast-radius scoring.

use async_trait::async_trait;

use crate::blast;
use crate::error::Result;
use crate::net::NetworkRange;
use crate::types::{RequestContext, SignalResult};

use super::SignalEvaluator;

/// Scores the number of addresses a block would take down.
pub struct SizeEvaluator;

#[async_trait]
impl SignalEvaluator for SizeEvaluator {
    fn name(&self) -> &'static str {
        "size"
    }

    async fn evaluate(
        &self,
        range: &NetworkRange,
        _ctx: &RequestContext,
    ) -> Result<Option<SignalResult>> {
        let radius = blast::assess(range);
        let mut result = SignalResult::scored(radius.band.risk_score());
        if range.is_single_host() {
            result.reasons.push("single address, minimal blast radius".to_string());
        } else {
            result.reasons.push(format!(
                "subnet block covers {} addresses",
                radius.address_count
            ));
            result
                .reasons
                .push(format!("scope: {}", radius.scope_description));
        }
        result.metadata = Some(serde_json::to_value(&radius)?);
        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blast::ScopeBand;

    #[tokio::test]
    async fn single_host_scores_floor() {
        let range = NetworkRange::parse("198.51.100.42").unwrap();
        let signal = SizeEvaluator
            .evaluate(&range, &RequestContext::default())
            .await
            .unwrap()
            .expect("size always has an opinion");
        assert_eq!(signal.score, ScopeBand::SingleHost.risk_score());
        assert!(signal.override_level.is_none());
    }

    #[tokio::test]
    async fn wide_block_scores_catastrophic() {
        let range = NetworkRange::parse("12.0.0.0/8").unwrap();
        let signal = SizeEvaluator
            .evaluate(&range, &RequestContext::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(signal.score, ScopeBand::Catastrophic.risk_score());
        assert!(signal
            .reasons
            .iter()
            .any(|r| r.contains("16777216 addresses")));
    }

    #[tokio::test]
    async fn score_is_monotone_in_prefix_width() {
        let ctx = RequestContext::default();
        let mut last = 0.0;
        for prefix in [32u8, 28, 24, 20, 16, 12, 8] {
            let range = NetworkRange::parse(&format!("20.0.0.0/{prefix}")).unwrap();
            let signal = SizeEvaluator
                .evaluate(&range, &ctx)
                .await
                .unwrap()
                .unwrap();
            assert!(signal.score >= last, "prefix /{prefix}");
            last = signal.score;
        }
    }
}
