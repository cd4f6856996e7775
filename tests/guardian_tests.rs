//! End-to-end scenarios against the full guardian pipeline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use blockguard::audit::{AuditStore, JsonlAuditStore, MemoryAuditStore};
use blockguard::config::GuardianConfig;
use blockguard::error::GuardianError;
use blockguard::signals::SignalEvaluator;
use blockguard::{
    Guardian, NetworkRange, RequestContext, RiskLevel, SignalResult, SuggestedAction,
};
use tempfile::TempDir;

fn ctx() -> RequestContext {
    RequestContext::default()
}

#[tokio::test]
async fn google_dns_is_critical_and_blocked() {
    let guardian = Guardian::builder().build();
    let decision = guardian.evaluate("8.8.8.8", &ctx()).await;

    assert_eq!(decision.risk_level, RiskLevel::Critical);
    assert_eq!(decision.action, SuggestedAction::Block);
    assert!(!decision.allowed());
    assert!(decision
        .reasons
        .iter()
        .any(|r| r.contains("critical: overlaps")));
}

#[tokio::test]
async fn documentation_address_is_allowed() {
    let guardian = Guardian::builder().build();
    let decision = guardian.evaluate("203.0.113.5", &ctx()).await;

    // TEST-NET-3 is exempted from the hazard registry, so only the soft
    // signals apply.
    assert!(decision.risk_level <= RiskLevel::Low);
    assert_eq!(decision.action, SuggestedAction::Allow);
    assert!(decision.allowed());
}

#[tokio::test]
async fn private_slash_eight_is_critical() {
    let guardian = Guardian::builder().build();
    let decision = guardian.evaluate("10.0.0.0/8", &ctx()).await;

    assert_eq!(decision.risk_level, RiskLevel::Critical);
    assert_eq!(decision.action, SuggestedAction::Block);
}

#[tokio::test]
async fn invalid_candidate_is_rejected_not_an_error() {
    let guardian = Guardian::builder().build();
    let decision = guardian.evaluate("999.999.0.1", &ctx()).await;

    assert_eq!(decision.risk_level, RiskLevel::Critical);
    assert_eq!(decision.action, SuggestedAction::Reject);
    assert_eq!(decision.range, "999.999.0.1");
    assert!(decision.reasons[0].starts_with("invalid address format"));
}

#[tokio::test]
async fn repeated_evaluation_hits_the_cache() {
    let audit = Arc::new(MemoryAuditStore::new());
    let guardian = Guardian::builder()
        .audit_store(Arc::clone(&audit) as Arc<dyn AuditStore>)
        .build();

    let first = guardian.evaluate("192.0.2.77", &ctx()).await;
    let second = guardian.evaluate("192.0.2.77", &ctx()).await;

    // Same decision id means the cache served the second call, and cache
    // hits are not re-audited.
    assert_eq!(first.id, second.id);
    assert_eq!(audit.len(), 1);
}

#[tokio::test]
async fn equivalent_spellings_share_one_cache_entry() {
    let guardian = Guardian::builder().build();

    let host = guardian.evaluate("192.0.2.77", &ctx()).await;
    let explicit = guardian.evaluate("192.0.2.77/32", &ctx()).await;

    assert_eq!(host.id, explicit.id);
}

#[tokio::test]
async fn bulk_batch_reports_summary_and_safety_score() {
    let guardian = Guardian::builder().build();
    let candidates = vec![
        "8.8.8.8".to_string(),
        "203.0.113.5".to_string(),
        "1.1.1.1".to_string(),
    ];
    let report = guardian.evaluate_bulk(&candidates, &ctx()).await;

    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.blocked_count, 2);
    assert_eq!(report.summary.allowed_count, 1);
    assert_eq!(report.summary.pending_count, 0);
    assert!(report.summary.safety_score > 0.0);
    assert!(report.summary.safety_score < 1.0);
    assert_eq!(report.results.len(), 3);
    assert!(!report.results[0].allowed);
    assert!(report.results[1].allowed);
}

#[tokio::test]
async fn empty_bulk_batch_is_fully_safe() {
    let guardian = Guardian::builder().build();
    let report = guardian.evaluate_bulk(&[], &ctx()).await;

    assert_eq!(report.summary.total, 0);
    assert_eq!(report.summary.safety_score, 1.0);
}

struct FailingEvaluator;

#[async_trait]
impl SignalEvaluator for FailingEvaluator {
    fn name(&self) -> &'static str {
        "always-failing"
    }

    async fn evaluate(
        &self,
        _range: &NetworkRange,
        _ctx: &RequestContext,
    ) -> blockguard::Result<Option<SignalResult>> {
        Err(GuardianError::Evaluator {
            name: "always-failing",
            message: "backend unreachable".to_string(),
        })
    }
}

#[tokio::test]
async fn failing_evaluator_is_treated_as_no_opinion() {
    let guardian = Guardian::builder()
        .evaluator(Arc::new(FailingEvaluator))
        .build();
    let decision = guardian.evaluate("203.0.113.5", &ctx()).await;

    // The failure must not poison the decision or surface as an error.
    assert!(decision.allowed());
    assert!(!decision
        .reasons
        .iter()
        .any(|r| r.contains("backend unreachable")));
}

struct SlowEvaluator;

#[async_trait]
impl SignalEvaluator for SlowEvaluator {
    fn name(&self) -> &'static str {
        "always-slow"
    }

    async fn evaluate(
        &self,
        _range: &NetworkRange,
        _ctx: &RequestContext,
    ) -> blockguard::Result<Option<SignalResult>> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(Some(
            SignalResult::scored(0.99).with_reason("too late to matter"),
        ))
    }
}

#[tokio::test]
async fn slow_evaluator_times_out_without_affecting_the_decision() {
    let config = GuardianConfig {
        evaluator_timeout_ms: 50,
        ..GuardianConfig::default()
    };
    let guardian = Guardian::builder()
        .config(config)
        .evaluator(Arc::new(SlowEvaluator))
        .build();
    let decision = guardian.evaluate("203.0.113.5", &ctx()).await;

    assert!(decision.score < 0.99);
    assert!(!decision.reasons.iter().any(|r| r.contains("too late")));
}

#[tokio::test]
async fn history_escalates_a_previously_flagged_range() {
    let audit = Arc::new(MemoryAuditStore::new());
    let guardian = Guardian::builder()
        .audit_store(Arc::clone(&audit) as Arc<dyn AuditStore>)
        .build();

    // First evaluation of a very wide block lands high on size alone and
    // is written to the trail.
    let first = guardian.evaluate("198.0.0.0/11", &ctx()).await;
    assert!(first.risk_level >= RiskLevel::High);

    // A later evaluation of the same range must carry the precedent
    // reason. Use a fresh guardian over the same trail so the decision
    // cache cannot short-circuit the history lookup.
    let fresh = Guardian::builder()
        .audit_store(Arc::clone(&audit) as Arc<dyn AuditStore>)
        .build();
    let second = fresh.evaluate("198.0.0.0/11", &ctx()).await;
    assert!(second
        .reasons
        .iter()
        .any(|r| r.contains("previously flagged")));
}

#[tokio::test]
async fn disabled_guardian_allows_everything() {
    let config = GuardianConfig {
        enabled: false,
        ..GuardianConfig::default()
    };
    let guardian = Guardian::builder().config(config).build();
    let decision = guardian.evaluate("8.8.8.8", &ctx()).await;

    assert_eq!(decision.risk_level, RiskLevel::Safe);
    assert!(decision.allowed());
    assert!(decision.reasons[0].contains("disabled"));
}

#[tokio::test]
async fn validate_attaches_a_recommendation() {
    let guardian = Guardian::builder().build();
    let validation = guardian.validate("8.8.8.8", &ctx()).await;

    assert!(!validation.allowed);
    assert!(validation
        .recommendation
        .starts_with("Critical risk - do not block"));
    assert!(validation.recommendation.contains("Alternatives:"));
}

#[tokio::test]
async fn stats_reflect_prevented_blocks() {
    let guardian = Guardian::builder().build();
    guardian.evaluate("8.8.8.8", &ctx()).await;
    guardian.evaluate("192.0.2.77", &ctx()).await;

    let stats = guardian.stats(30).unwrap();
    assert_eq!(stats.total_evaluations, 2);
    assert_eq!(stats.prevented_blocks, 1);
    assert_eq!(stats.by_risk_level["critical"], 1);
}

#[tokio::test]
async fn jsonl_trail_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.jsonl");

    {
        let store = Arc::new(JsonlAuditStore::open(&path).unwrap());
        let guardian = Guardian::builder()
            .audit_store(store as Arc<dyn AuditStore>)
            .build();
        guardian.evaluate("10.0.0.0/8", &ctx()).await;
        guardian.evaluate("192.0.2.77", &ctx()).await;
    }

    let reopened = JsonlAuditStore::open(&path).unwrap();
    let stats = reopened.stats(30).unwrap();
    assert_eq!(stats.total_evaluations, 2);
    assert_eq!(stats.prevented_blocks, 1);
}

#[tokio::test]
async fn concurrent_identical_candidates_share_a_decision() {
    let audit = Arc::new(MemoryAuditStore::new());
    let guardian = Arc::new(
        Guardian::builder()
            .audit_store(Arc::clone(&audit) as Arc<dyn AuditStore>)
            .build(),
    );

    let a = Arc::clone(&guardian);
    let b = Arc::clone(&guardian);
    let ctx_a = RequestContext::default();
    let ctx_b = RequestContext::default();
    let (first, second) = tokio::join!(
        a.evaluate("192.0.2.99", &ctx_a),
        b.evaluate("192.0.2.99", &ctx_b),
    );

    assert_eq!(first.id, second.id);
    assert_eq!(audit.len(), 1);
}
