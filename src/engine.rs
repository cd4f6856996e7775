//! Decision engine.
//!
//! The [`Guardian`] runs every registered evaluator concurrently with an
//! individual timeout, aggregates their signals (max score, structural
//! override floors), caches the decision, and appends to the audit trail
//! before returning. `evaluate` always yields a [`Decision`]: malformed
//! input becomes a critical reject, and failing subsystems degrade with a
//! warning rather than erroring out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::audit::{AuditRecord, AuditStats, AuditStore, MemoryAuditStore};
use crate::cache::{DecisionCache, MemoryDecisionCache};
use crate::config::GuardianConfig;
use crate::error::{GuardianError, Result};
use crate::explain::{Explainer, TemplateExplainer};
use crate::net::NetworkRange;
use crate::registry::CriticalRangeRegistry;
use crate::signals::{
    ContextEvaluator, CriticalOverlapEvaluator, GeoEvaluator, GeoSource, HistoryEvaluator,
    ReputationEvaluator, ReputationSource, SignalEvaluator, SizeEvaluator, StaticGeoSource,
    StaticReputationSource,
};
use crate::types::{Decision, RequestContext, RiskLevel, SignalResult, SuggestedAction};

// ---------------------------------------------------------------------------
// Result wrappers
// ---------------------------------------------------------------------------

/// Decision plus the caller-facing verdict and recommendation text.
#[derive(Debug, Clone, Serialize)]
pub struct Validation {
    pub decision: Decision,
    /// True when the caller may proceed with the block.
    pub allowed: bool,
    pub recommendation: String,
}

/// Per-range outcomes of a bulk request plus the batch summary.
#[derive(Debug, Clone, Serialize)]
pub struct BulkReport {
    pub results: Vec<Validation>,
    pub summary: BulkSummary,
}

/// Aggregate counters for a bulk request. There is no cross-batch
/// atomicity; each candidate is evaluated independently.
#[derive(Debug, Clone, Serialize)]
pub struct BulkSummary {
    pub total: usize,
    pub allowed_count: usize,
    pub blocked_count: usize,
    pub pending_count: usize,
    /// 1.0 means every candidate in the batch was safe to block.
    pub safety_score: f64,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder wiring the guardian's subsystems. Everything defaults to the
/// bundled implementations.
pub struct GuardianBuilder {
    config: GuardianConfig,
    registry: Option<CriticalRangeRegistry>,
    geo: Option<Arc<dyn GeoSource>>,
    reputation: Option<Arc<dyn ReputationSource>>,
    cache: Option<Arc<dyn DecisionCache>>,
    audit: Option<Arc<dyn AuditStore>>,
    explainer: Option<Arc<dyn Explainer>>,
    extra_evaluators: Vec<Arc<dyn SignalEvaluator>>,
}

impl GuardianBuilder {
    pub fn new() -> Self {
        Self {
            config: GuardianConfig::default(),
            registry: None,
            geo: None,
            reputation: None,
            cache: None,
            audit: None,
            explainer: None,
            extra_evaluators: Vec::new(),
        }
    }

    pub fn config(mut self, config: GuardianConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(mut self, registry: CriticalRangeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn geo_source(mut self, source: Arc<dyn GeoSource>) -> Self {
        self.geo = Some(source);
        self
    }

    pub fn reputation_source(mut self, source: Arc<dyn ReputationSource>) -> Self {
        self.reputation = Some(source);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn DecisionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn audit_store(mut self, store: Arc<dyn AuditStore>) -> Self {
        self.audit = Some(store);
        self
    }

    pub fn explainer(mut self, explainer: Arc<dyn Explainer>) -> Self {
        self.explainer = Some(explainer);
        self
    }

    /// Register an additional evaluator after the built-in six.
    pub fn evaluator(mut self, evaluator: Arc<dyn SignalEvaluator>) -> Self {
        self.extra_evaluators.push(evaluator);
        self
    }

    pub fn build(self) -> Guardian {
        let config = self.config;
        let registry = Arc::new(
            self.registry
                .unwrap_or_else(CriticalRangeRegistry::builtin),
        );
        let audit: Arc<dyn AuditStore> = self
            .audit
            .unwrap_or_else(|| Arc::new(MemoryAuditStore::new()));
        let cache: Arc<dyn DecisionCache> = self.cache.unwrap_or_else(|| {
            Arc::new(MemoryDecisionCache::new(Duration::from_secs(
                config.cache_ttl_secs,
            )))
        });
        let geo = self.geo.unwrap_or_else(|| Arc::new(StaticGeoSource));
        let reputation = self
            .reputation
            .unwrap_or_else(|| Arc::new(StaticReputationSource));
        let explainer: Arc<dyn Explainer> = self
            .explainer
            .unwrap_or_else(|| Arc::new(TemplateExplainer));

        // Registration order fixes the order of reasons in decisions.
        let mut evaluators: Vec<Arc<dyn SignalEvaluator>> = vec![
            Arc::new(CriticalOverlapEvaluator::new(registry)),
            Arc::new(SizeEvaluator),
            Arc::new(GeoEvaluator::new(geo)),
            Arc::new(ReputationEvaluator::new(reputation)),
            Arc::new(HistoryEvaluator::new(
                Arc::clone(&audit),
                config.history_window_days,
                config.recent_block_threshold,
            )),
            Arc::new(ContextEvaluator),
        ];
        evaluators.extend(self.extra_evaluators);

        Guardian {
            config,
            evaluators,
            cache,
            audit,
            explainer,
            in_flight: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for GuardianBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Guardian
// ---------------------------------------------------------------------------

/// The blocklist risk guardian.
pub struct Guardian {
    config: GuardianConfig,
    evaluators: Vec<Arc<dyn SignalEvaluator>>,
    cache: Arc<dyn DecisionCache>,
    audit: Arc<dyn AuditStore>,
    explainer: Arc<dyn Explainer>,
    /// Per-key locks giving best-effort single-flight for identical
    /// candidates; distinct ranges never contend.
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Guardian {
    pub fn builder() -> GuardianBuilder {
        GuardianBuilder::new()
    }

    /// Evaluate one candidate. Always returns a decision; malformed input
    /// yields a critical reject rather than an error.
    pub async fn evaluate(&self, candidate: &str, ctx: &RequestContext) -> Decision {
        let range = match NetworkRange::parse(candidate) {
            Ok(range) => range,
            Err(e) => {
                let decision = Self::reject_invalid(candidate, &e);
                self.write_audit(candidate, &decision);
                return decision;
            }
        };
        let key = range.to_string();

        if !self.config.enabled {
            let decision = Self::disabled_decision(&key);
            self.write_audit(&range.base_addr().to_string(), &decision);
            return decision;
        }

        // Identical candidates wait for the first evaluation, then take the
        // cache hit it populated.
        let key_lock = {
            let mut map = self.in_flight.lock().await;
            Arc::clone(
                map.entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        let decision = {
            let _guard = key_lock.lock().await;
            if let Some(hit) = self.cache_get(&key) {
                debug!(range = %key, "decision cache hit");
                hit
            } else {
                let decision = self.run_evaluators(&range, ctx).await;
                self.cache_put(&key, &decision);
                self.write_audit(&range.base_addr().to_string(), &decision);
                decision
            }
        };

        // Drop the key entry once no other waiter holds it.
        {
            let mut map = self.in_flight.lock().await;
            if let Some(lock) = map.get(&key) {
                if Arc::strong_count(lock) <= 2 {
                    map.remove(&key);
                }
            }
        }

        decision
    }

    /// Evaluate and wrap with the allow/deny verdict and recommendation
    /// text.
    pub async fn validate(&self, candidate: &str, ctx: &RequestContext) -> Validation {
        let decision = self.evaluate(candidate, ctx).await;
        let recommendation = match self.explainer.explain(&decision) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, range = %decision.range, "explainer failed, using template fallback");
                TemplateExplainer
                    .explain(&decision)
                    .unwrap_or_else(|_| decision.reasons.join("; "))
            }
        };
        Validation {
            allowed: decision.allowed(),
            recommendation,
            decision,
        }
    }

    /// Evaluate a batch of candidates independently. The batch context is
    /// marked as automated and bulk.
    pub async fn evaluate_bulk(&self, candidates: &[String], ctx: &RequestContext) -> BulkReport {
        let mut bulk_ctx = ctx.clone();
        bulk_ctx.automated = true;
        bulk_ctx.bulk_operation = true;

        let mut results = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            results.push(self.validate(candidate, &bulk_ctx).await);
        }

        let total = results.len();
        let mut allowed_count = 0;
        let mut blocked_count = 0;
        let mut pending_count = 0;
        for validation in &results {
            match validation.decision.action {
                SuggestedAction::Allow | SuggestedAction::Warn => allowed_count += 1,
                SuggestedAction::ManualReview => pending_count += 1,
                SuggestedAction::Block | SuggestedAction::Reject => blocked_count += 1,
            }
        }
        let safety_score = if total == 0 {
            1.0
        } else {
            (1.0 - (blocked_count as f64 + 0.5 * pending_count as f64) / total as f64)
                .clamp(0.0, 1.0)
        };

        BulkReport {
            results,
            summary: BulkSummary {
                total,
                allowed_count,
                blocked_count,
                pending_count,
                safety_score,
            },
        }
    }

    /// Rolling activity counters from the audit trail.
    pub fn stats(&self, window_days: u32) -> Result<AuditStats> {
        self.audit.stats(window_days)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn run_evaluators(&self, range: &NetworkRange, ctx: &RequestContext) -> Decision {
        let timeout = Duration::from_millis(self.config.evaluator_timeout_ms);

        let mut handles = Vec::with_capacity(self.evaluators.len());
        for evaluator in &self.evaluators {
            let name = evaluator.name();
            let evaluator = Arc::clone(evaluator);
            let range = *range;
            let ctx = ctx.clone();
            handles.push((
                name,
                tokio::spawn(async move {
                    tokio::time::timeout(timeout, evaluator.evaluate(&range, &ctx)).await
                }),
            ));
        }

        // Await in registration order so reasons stay deterministic.
        let mut signals: Vec<(&'static str, SignalResult)> = Vec::new();
        for (name, handle) in handles {
            match handle.await {
                Ok(Ok(Ok(Some(signal)))) => {
                    debug!(evaluator = name, score = signal.score, "signal contributed");
                    signals.push((name, signal));
                }
                Ok(Ok(Ok(None))) => {}
                Ok(Ok(Err(e))) => {
                    warn!(evaluator = name, error = %e, "evaluator failed, treating as no opinion");
                }
                Ok(Err(_)) => {
                    warn!(
                        evaluator = name,
                        timeout_ms = self.config.evaluator_timeout_ms,
                        "evaluator timed out, treating as no opinion"
                    );
                }
                Err(e) => {
                    warn!(evaluator = name, error = %e, "evaluator task failed, treating as no opinion");
                }
            }
        }

        self.aggregate(range, signals)
    }

    fn aggregate(
        &self,
        range: &NetworkRange,
        signals: Vec<(&'static str, SignalResult)>,
    ) -> Decision {
        let mut reasons = Vec::new();
        let mut score: f64 = 0.0;
        let mut override_level: Option<RiskLevel> = None;
        let mut metadata = serde_json::Map::new();

        for (name, signal) in &signals {
            reasons.extend(signal.reasons.iter().cloned());
            // Max, not average: one catastrophic signal must not be diluted
            // by several benign ones.
            score = score.max(signal.score);
            if let Some(level) = signal.override_level {
                override_level = Some(override_level.map_or(level, |cur| cur.max(level)));
            }
            if let Some(meta) = &signal.metadata {
                metadata.insert((*name).to_string(), meta.clone());
            }
        }
        if signals.is_empty() {
            score = self.config.score_floor;
        }
        let confidence = (self.config.base_confidence
            + self.config.confidence_step * signals.len() as f64)
            .min(1.0);

        let risk_level = self.classify(score, override_level);
        let action = SuggestedAction::for_level(risk_level);
        debug_assert!(
            (risk_level <= RiskLevel::Medium)
                == matches!(action, SuggestedAction::Allow | SuggestedAction::Warn)
        );

        metadata.insert(
            "network".to_string(),
            serde_json::json!({
                "range": range.to_string(),
                "prefix_len": range.prefix_len(),
                "address_count": range.address_count(),
            }),
        );

        Decision {
            id: Uuid::new_v4(),
            range: range.to_string(),
            risk_level,
            score,
            confidence,
            reasons,
            action,
            evaluated_at: Utc::now(),
            metadata: Some(serde_json::Value::Object(metadata)),
        }
    }

    /// Structural overrides floor the classification; thresholds apply to
    /// the aggregate score.
    fn classify(&self, score: f64, override_level: Option<RiskLevel>) -> RiskLevel {
        let thresholds = self.config.thresholds;
        let by_score = if score >= thresholds.high {
            RiskLevel::High
        } else if score >= thresholds.medium {
            RiskLevel::Medium
        } else if score >= thresholds.low {
            RiskLevel::Low
        } else {
            RiskLevel::Safe
        };
        match override_level {
            Some(level) => by_score.max(level),
            None => by_score,
        }
    }

    fn reject_invalid(candidate: &str, err: &GuardianError) -> Decision {
        let detail = match err {
            GuardianError::InvalidCandidate { reason, .. } => reason.clone(),
            other => other.to_string(),
        };
        Decision {
            id: Uuid::new_v4(),
            range: candidate.to_string(),
            risk_level: RiskLevel::Critical,
            score: 1.0,
            confidence: 1.0,
            reasons: vec![format!("invalid address format: {detail}")],
            action: SuggestedAction::Reject,
            evaluated_at: Utc::now(),
            metadata: None,
        }
    }

    fn disabled_decision(range: &str) -> Decision {
        Decision {
            id: Uuid::new_v4(),
            range: range.to_string(),
            risk_level: RiskLevel::Safe,
            score: 0.0,
            confidence: 1.0,
            reasons: vec![
                "guardian disabled by configuration, no evaluation performed".to_string(),
            ],
            action: SuggestedAction::Allow,
            evaluated_at: Utc::now(),
            metadata: None,
        }
    }

    fn write_audit(&self, base_address: &str, decision: &Decision) {
        let record = AuditRecord {
            timestamp: decision.evaluated_at,
            range: decision.range.clone(),
            base_address: base_address.to_string(),
            risk_level: decision.risk_level,
            action: decision.action,
            prevented: !decision.allowed(),
        };
        if let Err(e) = self.audit.record(&record) {
            warn!(error = %e, range = %decision.range, "audit write failed, continuing degraded");
        }
    }

    fn cache_get(&self, key: &str) -> Option<Decision> {
        match self.cache.get(key) {
            Ok(hit) => hit,
            Err(e) => {
                warn!(error = %e, range = %key, "decision cache read failed, treating as miss");
                None
            }
        }
    }

    fn cache_put(&self, key: &str, decision: &Decision) {
        if let Err(e) = self.cache.put(key, decision) {
            warn!(error = %e, range = %key, "decision cache write failed, continuing");
        }
    }
}
