//! Decision caching with TTL expiry.
//!
//! Cache failures are never fatal: the engine treats a failed read as a
//! miss and a failed write as a no-op, logging a warning either way.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::types::Decision;

/// Entry count at which `put` sweeps expired slots.
const SWEEP_THRESHOLD: usize = 1024;

/// Cache backend for completed decisions, keyed by canonical range string.
pub trait DecisionCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Decision>>;
    fn put(&self, key: &str, decision: &Decision) -> Result<()>;
}

struct CacheSlot {
    decision: Decision,
    inserted_at: Instant,
}

/// In-process cache with lazy TTL expiry and an opportunistic sweep.
pub struct MemoryDecisionCache {
    ttl: Duration,
    slots: Mutex<HashMap<String, CacheSlot>>,
}

impl MemoryDecisionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DecisionCache for MemoryDecisionCache {
    fn get(&self, key: &str) -> Result<Option<Decision>> {
        let mut slots = lock(&self.slots);
        if let Some(slot) = slots.get(key) {
            if slot.inserted_at.elapsed() < self.ttl {
                return Ok(Some(slot.decision.clone()));
            }
            slots.remove(key);
        }
        Ok(None)
    }

    fn put(&self, key: &str, decision: &Decision) -> Result<()> {
        let mut slots = lock(&self.slots);
        if slots.len() >= SWEEP_THRESHOLD {
            let ttl = self.ttl;
            slots.retain(|_, slot| slot.inserted_at.elapsed() < ttl);
        }
        slots.insert(
            key.to_string(),
            CacheSlot {
                decision: decision.clone(),
                inserted_at: Instant::now(),
            },
        );
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RiskLevel, SuggestedAction};
    use chrono::Utc;
    use uuid::Uuid;

    fn decision(range: &str) -> Decision {
        Decision {
            id: Uuid::new_v4(),
            range: range.to_string(),
            risk_level: RiskLevel::Low,
            score: 0.3,
            confidence: 0.8,
            reasons: vec!["test".to_string()],
            action: SuggestedAction::Allow,
            evaluated_at: Utc::now(),
            metadata: None,
        }
    }

    #[test]
    fn hit_within_ttl() {
        let cache = MemoryDecisionCache::new(Duration::from_secs(60));
        let d = decision("198.18.0.1/32");
        cache.put("198.18.0.1/32", &d).unwrap();

        let hit = cache.get("198.18.0.1/32").unwrap().unwrap();
        assert_eq!(hit.id, d.id);
        assert!(cache.get("198.18.0.2/32").unwrap().is_none());
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = MemoryDecisionCache::new(Duration::from_millis(10));
        let d = decision("198.18.0.1/32");
        cache.put("198.18.0.1/32", &d).unwrap();

        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.get("198.18.0.1/32").unwrap().is_none());
        // Lazy expiry removed the slot.
        assert!(cache.is_empty());
    }

    #[test]
    fn put_replaces_existing_entry() {
        let cache = MemoryDecisionCache::new(Duration::from_secs(60));
        let first = decision("198.18.0.1/32");
        let second = decision("198.18.0.1/32");
        cache.put("198.18.0.1/32", &first).unwrap();
        cache.put("198.18.0.1/32", &second).unwrap();

        let hit = cache.get("198.18.0.1/32").unwrap().unwrap();
        assert_eq!(hit.id, second.id);
        assert_eq!(cache.len(), 1);
    }
}
