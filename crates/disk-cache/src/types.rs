//! Cache types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One file under the cache root, as observed by a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub path: PathBuf,
    pub size: u64,
    /// File modification time, refreshed on every read and write
    pub last_access: DateTime<Utc>,
}

/// Entries collected by one scan, ranked oldest first once sorted
#[derive(Debug, Clone, Default)]
pub struct EntryList {
    entries: Vec<CacheEntry>,
}

impl EntryList {
    pub fn new(entries: Vec<CacheEntry>) -> Self {
        Self { entries }
    }

    /// Order by `last_access`, oldest first. Equal timestamps end up in no
    /// particular order.
    pub fn sort_by_recency(&mut self) {
        self.entries.sort_unstable_by_key(|e| e.last_access);
    }

    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CacheEntry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[CacheEntry] {
        &self.entries
    }
}

impl From<Vec<CacheEntry>> for EntryList {
    fn from(entries: Vec<CacheEntry>) -> Self {
        Self::new(entries)
    }
}

/// Outcome of a single sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub total_size_before: u64,
    pub evicted: usize,
    pub evicted_bytes: u64,
    pub failed_removals: usize,
    /// Bookkeeping after eviction; assumes every removal succeeded
    pub remaining: usize,
    pub remaining_size: u64,
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_size: u64,
    pub hits: u64,
    pub misses: u64,
}
