//! Human-readable recommendations for decisions.
//!
//! The engine never depends on an explainer succeeding: if a configured
//! backend fails, it falls back to [`TemplateExplainer`], which is fully
//! deterministic and always available.

use crate::error::Result;
use crate::types::{Decision, RiskLevel};

/// Produces the recommendation text attached to a validation.
pub trait Explainer: Send + Sync {
    fn explain(&self, decision: &Decision) -> Result<String>;
}

/// Canned per-pattern expansions keyed on reason text.
const REASON_DETAILS: &[(&str, &str)] = &[
    (
        "dns",
        "Blocking public DNS infrastructure causes widespread name-resolution failures.",
    ),
    (
        "private",
        "Private ranges carry internal traffic; blocking them breaks file sharing, printers, and internal services.",
    ),
    (
        "loopback",
        "Loopback traffic is essential for local services and development tooling.",
    ),
    (
        "cloud",
        "Cloud provider ranges host business applications, email, and remote-work services.",
    ),
    (
        "government",
        "Government networks carry official communications; blocking them can have legal implications.",
    ),
    (
        "educational",
        "Educational networks support research collaboration and student access to resources.",
    ),
    (
        "isp",
        "ISP ranges serve many legitimate subscribers on the same provider.",
    ),
    (
        "subnet block",
        "Wide blocks have a high probability of catching legitimate users alongside the target.",
    ),
];

/// Deterministic template-based explainer.
pub struct TemplateExplainer;

impl TemplateExplainer {
    fn headline(level: RiskLevel) -> &'static str {
        match level {
            RiskLevel::Critical => "Critical risk - do not block",
            RiskLevel::High => "High risk - manual review required",
            RiskLevel::Medium => "Medium risk - proceed with caution",
            RiskLevel::Low => "Low risk - generally safe",
            RiskLevel::Safe => "Safe to block",
        }
    }

    fn business_impact(level: RiskLevel) -> Option<&'static str> {
        match level {
            RiskLevel::Critical => Some(
                "Business impact: could cause major outages affecting revenue and customer trust; recovery may take hours to days.",
            ),
            RiskLevel::High => Some(
                "Business impact: may cause service degradation requiring manual intervention; recovery in minutes to hours.",
            ),
            RiskLevel::Medium => {
                Some("Business impact: minor impact expected with limited effect on operations.")
            }
            _ => None,
        }
    }

    fn alternatives(decision: &Decision) -> Option<String> {
        let mut options = Vec::new();
        let all_reasons = decision.reasons.join(" ").to_lowercase();

        if decision.risk_level >= RiskLevel::High {
            options.push("rate limiting, geo-scoped rules, or an allowlist approach instead of a full block");
        }
        if all_reasons.contains("dns") {
            options.push("DNS filtering or custom resolver configuration");
        }
        if all_reasons.contains("cloud") {
            options.push("application-level controls or cloud security groups");
        }

        if options.is_empty() {
            None
        } else {
            Some(format!("Alternatives: {}.", options.join("; ")))
        }
    }

    fn general_assessment(decision: &Decision) -> String {
        let confidence = if decision.confidence > 0.9 {
            "high confidence in the assessment"
        } else if decision.confidence > 0.7 {
            "moderate confidence with some risk indicators"
        } else {
            "lower confidence due to limited data"
        };
        let breadth = if decision.reasons.len() > 5 {
            "multiple risk factors identified"
        } else if decision.reasons.len() > 2 {
            "several risk factors present"
        } else {
            "limited risk factors detected"
        };
        format!("General assessment: {confidence}; {breadth}.")
    }
}

impl Explainer for TemplateExplainer {
    fn explain(&self, decision: &Decision) -> Result<String> {
        let mut sections = vec![Self::headline(decision.risk_level).to_string()];

        let mut details: Vec<&str> = Vec::new();
        for reason in &decision.reasons {
            let lower = reason.to_lowercase();
            for &(pattern, detail) in REASON_DETAILS {
                if lower.contains(pattern) && !details.contains(&detail) {
                    details.push(detail);
                }
            }
        }
        if details.is_empty() {
            sections.push(Self::general_assessment(decision));
        } else {
            sections.extend(details.iter().map(|d| d.to_string()));
        }

        if let Some(impact) = Self::business_impact(decision.risk_level) {
            sections.push(impact.to_string());
        }
        if let Some(alternatives) = Self::alternatives(decision) {
            sections.push(alternatives);
        }

        Ok(sections.join("\n\n"))
    }
}
