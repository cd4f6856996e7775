//! Geolocation-based risk scoring.
//!
//! The evaluator consults a [`GeoSource`]; the bundled [`StaticGeoSource`]
//! is an offline heuristic table so the guardian works without a GeoIP
//! backend. Real backends implement the trait and plug in via the builder.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::net::NetworkRange;
use crate::types::{RequestContext, RiskLevel, SignalResult};

use super::SignalEvaluator;

/// Organization terms indicating major cloud or service providers.
const CLOUD_ORGS: &[&str] = &["google", "amazon", "microsoft", "cloudflare", "github"];
/// Organization terms indicating consumer ISPs.
const ISP_TERMS: &[&str] = &["isp", "telecom", "internet service", "broadband"];
/// Organization terms indicating institutional networks.
const INSTITUTION_TERMS: &[&str] = &["university", "edu", "government", "gov"];

/// Geolocation record for an address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoInfo {
    pub country: String,
    pub org: String,
}

/// Source of geolocation data.
#[async_trait]
pub trait GeoSource: Send + Sync {
    /// `Ok(None)` when nothing is known about the address.
    async fn lookup(&self, addr: IpAddr) -> Result<Option<GeoInfo>>;
}

/// Offline heuristic source keyed on well-known prefixes.
pub struct StaticGeoSource;

#[async_trait]
impl GeoSource for StaticGeoSource {
    async fn lookup(&self, addr: IpAddr) -> Result<Option<GeoInfo>> {
        let text = addr.to_string();
        let org = if text.starts_with("8.8.") {
            "Google LLC"
        } else if text.starts_with("1.1.") {
            "Cloudflare Inc"
        } else if text.starts_with("52.") {
            "Amazon.com Inc"
        } else {
            "Example ISP Inc"
        };
        Ok(Some(GeoInfo {
            country: "US".to_string(),
            org: org.to_string(),
        }))
    }
}

/// Scores the organization behind the candidate's base address.
pub struct GeoEvaluator {
    source: Arc<dyn GeoSource>,
}

impl GeoEvaluator {
    pub fn new(source: Arc<dyn GeoSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl SignalEvaluator for GeoEvaluator {
    fn name(&self) -> &'static str {
        "geolocation"
    }

    async fn evaluate(
        &self,
        range: &NetworkRange,
        _ctx: &RequestContext,
    ) -> Result<Option<SignalResult>> {
        let Some(info) = self.source.lookup(range.base_addr()).await? else {
            return Ok(None);
        };
        let org = info.org.to_lowercase();

        let mut score: f64 = 0.1;
        let mut reasons = Vec::new();
        let mut override_level = None;

        if CLOUD_ORGS.iter().any(|term| org.contains(term)) {
            reasons.push(format!("major cloud or service provider ({})", info.org));
            score = score.max(0.8);
            override_level = Some(RiskLevel::High);
        }
        if ISP_TERMS.iter().any(|term| org.contains(term)) {
            reasons.push(format!("ISP network ({})", info.org));
            score = score.max(0.6);
        }
        if INSTITUTION_TERMS.iter().any(|term| org.contains(term)) {
            reasons.push(format!("educational or government network ({})", info.org));
            score = score.max(0.75);
            override_level = Some(override_level.map_or(RiskLevel::High, |l: RiskLevel| {
                l.max(RiskLevel::High)
            }));
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
