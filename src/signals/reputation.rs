//! Reputation-based risk scoring.
//!
//! Counter-intuitively, a genuinely malicious address is *low* risk here:
//! blocking it is the right call. The danger case is a legitimate service
//! provider that ended up on a threat feed by mistake.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::net::NetworkRange;
use crate::types::{RequestContext, RiskLevel, SignalResult};

use super::SignalEvaluator;

/// Reputation record for an address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationInfo {
    /// 0 = clean, 100 = confirmed malicious.
    pub threat_score: u8,
    pub categories: Vec<String>,
}

/// Source of reputation data.
#[async_trait]
pub trait ReputationSource: Send + Sync {
    /// `Ok(None)` when nothing is known about the address.
    async fn lookup(&self, addr: IpAddr) -> Result<Option<ReputationInfo>>;
}

/// Offline heuristic source keyed on well-known prefixes.
pub struct StaticReputationSource;

#[async_trait]
impl ReputationSource for StaticReputationSource {
    async fn lookup(&self, addr: IpAddr) -> Result<Option<ReputationInfo>> {
        let text = addr.to_string();
        if text.starts_with("8.8.") || text.starts_with("1.1.") {
            Ok(Some(ReputationInfo {
                threat_score: 0,
                categories: vec![
                    "dns".to_string(),
                    "legitimate".to_string(),
                    "cdn".to_string(),
                ],
            }))
        } else {
            Ok(Some(ReputationInfo {
                threat_score: 25,
                categories: vec!["unknown".to_string()],
            }))
        }
    }
}

/// Scores the candidate's standing in threat intelligence.
pub struct ReputationEvaluator {
    source: Arc<dyn ReputationSource>,
}

impl ReputationEvaluator {
    pub fn new(source: Arc<dyn ReputationSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl SignalEvaluator for ReputationEvaluator {
    fn name(&self) -> &'static str {
        "reputation"
    }

    async fn evaluate(
        &self,
        range: &NetworkRange,
        _ctx: &RequestContext,
    ) -> Result<Option<SignalResult>> {
        let Some(info) = self.source.lookup(range.base_addr()).await? else {
            return Ok(None);
        };

        let mut score: f64 = 0.1;
        let mut reasons = Vec::new();
        let mut override_level = None;

        if info.threat_score > 80 {
            reasons.push(format!(
                "known malicious address (threat score {})",
                info.threat_score
            ));
            score = 0.2;
        } else if info.threat_score > 50 {
            reasons.push(format!(
                "suspicious activity (threat score {})",
                info.threat_score
            ));
        }

        if info
            .categories
            .iter()
            .any(|c| c == "cdn" || c == "legitimate")
        {
            reasons.push("legitimate service provider".to_string());
            score = score.max(0.8);
            override_level = Some(RiskLevel::High);
        }

        if reasons.is_empty() {
            return Ok(None);
        }
        Ok(Some(SignalResult {
            score,
            reasons,
            override_level,
            metadata: Some(serde_json::to_value(&info)?),
        }))
    }
}
