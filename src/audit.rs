//! Append-only audit trail for evaluations.
//!
//! Every fresh evaluation is recorded before its decision is returned, and
//! the trail doubles as the data source for historical-precedent scoring.
//! The file store writes JSON Lines, skipping corrupt lines on load so a
//! damaged trail degrades rather than fails.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::net::NetworkRange;
use crate::types::{RiskLevel, SuggestedAction};

// ---------------------------------------------------------------------------
// Record and stats
// ---------------------------------------------------------------------------

/// One completed evaluation, durable before the decision is returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    /// Canonical range string that was evaluated.
    pub range: String,
    /// Base address, used for prefix queries.
    pub base_address: String,
    pub risk_level: RiskLevel,
    pub action: SuggestedAction,
    /// True when the guardian stopped a dangerous block.
    pub prevented: bool,
}

/// Aggregate counters over a query window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditStats {
    pub total_evaluations: u64,
    pub prevented_blocks: u64,
    /// Counts keyed by risk level name.
    pub by_risk_level: HashMap<String, u64>,
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Storage backend for the audit trail.
pub trait AuditStore: Send + Sync {
    /// Append one record. The record must be durable when this returns.
    fn record(&self, record: &AuditRecord) -> Result<()>;

    /// Most recent record for the exact canonical range.
    fn recent_decision(&self, range: &NetworkRange) -> Result<Option<AuditRecord>>;

    /// Records within the window whose base address string starts with
    /// `base`.
    fn count_recent_blocks(&self, base: IpAddr, window_days: u32) -> Result<u64>;

    /// Aggregate counters for the window.
    fn stats(&self, window_days: u32) -> Result<AuditStats>;
}

fn window_cutoff(window_days: u32) -> DateTime<Utc> {
    Utc::now() - ChronoDuration::days(i64::from(window_days))
}

fn compute_stats(records: &[AuditRecord], window_days: u32) -> AuditStats {
    let cutoff = window_cutoff(window_days);
    let mut stats = AuditStats::default();
    for record in records.iter().filter(|r| r.timestamp >= cutoff) {
        stats.total_evaluations += 1;
        if record.prevented {
            stats.prevented_blocks += 1;
        }
        *stats
            .by_risk_level
            .entry(record.risk_level.as_str().to_string())
            .or_insert(0) += 1;
    }
    stats
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Volatile store for tests and embedded use.
#[derive(Default)]
pub struct MemoryAuditStore {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditStore for MemoryAuditStore {
    fn record(&self, record: &AuditRecord) -> Result<()> {
        lock(&self.records).push(record.clone());
        Ok(())
    }

    fn recent_decision(&self, range: &NetworkRange) -> Result<Option<AuditRecord>> {
        let key = range.to_string();
        Ok(lock(&self.records)
            .iter()
            .rev()
            .find(|r| r.range == key)
            .cloned())
    }

    fn count_recent_blocks(&self, base: IpAddr, window_days: u32) -> Result<u64> {
        let cutoff = window_cutoff(window_days);
        let prefix = base.to_string();
        Ok(lock(&self.records)
            .iter()
            .filter(|r| r.timestamp >= cutoff && r.base_address.starts_with(&prefix))
            .count() as u64)
    }

    fn stats(&self, window_days: u32) -> Result<AuditStats> {
        Ok(compute_stats(&lock(&self.records), window_days))
    }
}

// ---------------------------------------------------------------------------
// JSONL store
// ---------------------------------------------------------------------------

/// File-backed store writing JSON Lines with synchronous flushed appends.
/// An in-memory index is rebuilt from the file on open.
pub struct JsonlAuditStore {
    inner: Mutex<Inner>,
}

struct Inner {
    file: File,
    records: Vec<AuditRecord>,
}

impl JsonlAuditStore {
    /// Open (or create) the trail at `log_path`, creating parent
    /// directories as needed. Corrupt lines in an existing file are
    /// skipped.
    pub fn open(log_path: impl Into<PathBuf>) -> Result<Self> {
        let log_path = log_path.into();
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        let mut records = Vec::new();
        read_records(&log_path, &mut records);
        Ok(Self {
            inner: Mutex::new(Inner { file, records }),
        })
    }
}

impl AuditStore for JsonlAuditStore {
    fn record(&self, record: &AuditRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        let mut inner = lock(&self.inner);
        writeln!(inner.file, "{json}")?;
        inner.file.flush()?;
        inner.records.push(record.clone());
        Ok(())
    }

    fn recent_decision(&self, range: &NetworkRange) -> Result<Option<AuditRecord>> {
        let key = range.to_string();
        Ok(lock(&self.inner)
            .records
            .iter()
            .rev()
            .find(|r| r.range == key)
            .cloned())
    }

    fn count_recent_blocks(&self, base: IpAddr, window_days: u32) -> Result<u64> {
        let cutoff = window_cutoff(window_days);
        let prefix = base.to_string();
        Ok(lock(&self.inner)
            .records
            .iter()
            .filter(|r| r.timestamp >= cutoff && r.base_address.starts_with(&prefix))
            .count() as u64)
    }

    fn stats(&self, window_days: u32) -> Result<AuditStats> {
        Ok(compute_stats(&lock(&self.inner).records, window_days))
    }
}

/// Read records from a JSONL file, skipping corrupt lines.
fn read_records(path: &Path, records: &mut Vec<AuditRecord>) {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return,
    };
    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditRecord>(line) {
            Ok(record) => records.push(record),
            Err(_) => continue,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
