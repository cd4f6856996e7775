//! Registry of critical network ranges that must never be casually blocked.
//!
//! The registry holds two kinds of entries: hazards (ranges whose blocking
//! would damage infrastructure or connectivity) and exceptions (ranges such
//! as the documentation blocks that are safe despite sitting near hazards).
//! A bundled default set ships with the crate; deployments can replace or
//! extend it at construction time.

use ipnet::IpNet;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::Result;
use crate::net::NetworkRange;

/// Default registry data compiled into the binary.
const BUILTIN_RANGES: &str = include_str!("../data/critical_ranges.json");

static BUILTIN: Lazy<CriticalRangeRegistry> =
    Lazy::new(|| match CriticalRangeRegistry::from_json(BUILTIN_RANGES) {
        Ok(registry) => registry,
        Err(e) => {
            error!(error = %e, "bundled critical-range data failed to parse");
            CriticalRangeRegistry::empty()
        }
    });

// ---------------------------------------------------------------------------
// Entry types
// ---------------------------------------------------------------------------

/// Why a range appears in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangeCategory {
    Loopback,
    LinkLocal,
    Private,
    Multicast,
    DnsInfrastructure,
    CloudProvider,
    IspBackbone,
    Government,
    Documentation,
}

impl RangeCategory {
    /// Short description used when building decision reasons.
    pub fn describe(&self) -> &'static str {
        match self {
            RangeCategory::Loopback => "loopback range",
            RangeCategory::LinkLocal => "link-local range",
            RangeCategory::Private => "private network range",
            RangeCategory::Multicast => "multicast range",
            RangeCategory::DnsInfrastructure => "public DNS infrastructure",
            RangeCategory::CloudProvider => "major cloud provider range",
            RangeCategory::IspBackbone => "ISP backbone range",
            RangeCategory::Government => "government network range",
            RangeCategory::Documentation => "documentation range",
        }
    }
}

/// Whether an entry marks danger or carves out a safe zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Hazard,
    Exception,
}

/// One configured critical range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalRangeEntry {
    pub range: IpNet,
    pub category: RangeCategory,
    pub kind: EntryKind,
    /// Why blocking (or exempting) this range matters.
    pub rationale: String,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[allow(dead_code)]
    version: u32,
    entries: Vec<CriticalRangeEntry>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// In-memory critical-range registry. Read-only during evaluation;
/// mutation is the administrative path before the guardian is built.
#[derive(Debug, Clone, Default)]
pub struct CriticalRangeRegistry {
    hazards: Vec<CriticalRangeEntry>,
    exceptions: Vec<CriticalRangeEntry>,
}

impl CriticalRangeRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The bundled default set.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn from_entries(entries: Vec<CriticalRangeEntry>) -> Self {
        let mut registry = Self::default();
        for entry in entries {
            registry.add(entry);
        }
        registry
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let file: RegistryFile = serde_json::from_str(data)?;
        Ok(Self::from_entries(file.entries))
    }

    pub fn add(&mut self, entry: CriticalRangeEntry) {
        match entry.kind {
            EntryKind::Hazard => self.hazards.push(entry),
            EntryKind::Exception => self.exceptions.push(entry),
        }
    }

    pub fn hazard_count(&self) -> usize {
        self.hazards.len()
    }

    pub fn exception_count(&self) -> usize {
        self.exceptions.len()
    }

    /// All hazard entries whose span intersects `candidate`, partial
    /// overlaps included. A candidate fully contained within any exception
    /// entry matches nothing.
    pub fn overlaps(&self, candidate: &NetworkRange) -> Vec<&CriticalRangeEntry> {
        let exempt = self
            .exceptions
            .iter()
            .any(|e| NetworkRange::from(e.range).contains(candidate));
        if exempt {
            return Vec::new();
        }
        self.hazards
            .iter()
            .filter(|h| NetworkRange::from(h.range).overlaps(candidate))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(s: &str) -> NetworkRange {
        NetworkRange::parse(s).unwrap()
    }

    #[test]
    fn builtin_registry_loads() {
        let registry = CriticalRangeRegistry::builtin();
        assert!(registry.hazard_count() >= 15);
        assert!(registry.exception_count() >= 4);
    }

    #[test]
    fn dns_address_matches_hazard() {
        let registry = CriticalRangeRegistry::builtin();
        let matches = registry.overlaps(&range("8.8.8.8"));
        assert!(!matches.is_empty());
        assert!(matches
            .iter()
            .any(|m| m.category == RangeCategory::DnsInfrastructure));
    }

    #[test]
    fn documentation_range_is_exempt() {
        let registry = CriticalRangeRegistry::builtin();
        assert!(registry.overlaps(&range("203.0.113.5")).is_empty());
        assert!(registry.overlaps(&range("198.51.100.0/24")).is_empty());
        assert!(registry.overlaps(&range("2001:db8::1")).is_empty());
    }

    #[test]
    fn partial_overlap_counts() {
        let registry = CriticalRangeRegistry::builtin();
        // 8.8.0.0/16 is wider than the 8.8.8.0/24 hazard but intersects it.
        let matches = registry.overlaps(&range("8.8.0.0/16"));
        assert!(matches
            .iter()
            .any(|m| m.range.to_string() == "8.8.8.0/24"));
    }

    #[test]
    fn candidate_inside_hazard_matches() {
        let registry = CriticalRangeRegistry::builtin();
        assert!(!registry.overlaps(&range("10.42.0.0/16")).is_empty());
        assert!(!registry.overlaps(&range("fe80::1")).is_empty());
    }

    #[test]
    fn exception_requires_full_containment() {
        let mut registry = CriticalRangeRegistry::empty();
        registry.add(CriticalRangeEntry {
            range: "198.18.0.0/16".parse().unwrap(),
            category: RangeCategory::IspBackbone,
            kind: EntryKind::Hazard,
            rationale: "test hazard".to_string(),
        });
        registry.add(CriticalRangeEntry {
            range: "198.18.5.0/24".parse().unwrap(),
            category: RangeCategory::Documentation,
            kind: EntryKind::Exception,
            rationale: "test exception".to_string(),
        });

        // Fully inside the exception: suppressed.
        assert!(registry.overlaps(&range("198.18.5.10")).is_empty());
        // Straddles the exception boundary: hazard still applies.
        assert!(!registry.overlaps(&range("198.18.4.0/23")).is_empty());
    }
}
