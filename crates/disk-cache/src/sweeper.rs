//! Eviction passes over the cache root
//!
//! Each pass lists the directory from scratch, ranks entries by mtime and
//! removes the oldest ones until both the byte budget and the file-count
//! budget hold. Nothing is remembered between passes, so files added or
//! removed behind the cache's back are picked up on the next sweep.

use crate::config::DiskCacheConfig;
use crate::error::{DiskCacheError, Result};
use crate::types::{CacheEntry, EntryList, SweepReport};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, warn};

/// Number of leading entries of `entries` that must be removed so that the
/// rest fit within both budgets.
///
/// `entries` must already be sorted oldest first. Removal stops at the first
/// point where both budgets hold. Only the aggregate is checked, so a large
/// recent entry survives as long as dropping older ones is enough.
pub fn plan_evictions(entries: &EntryList, max_bytes: u64, max_files: u64) -> usize {
    let mut size = entries.total_size();
    let mut count = entries.len() as u64;
    let mut evict = 0;

    for entry in entries.iter() {
        if size <= max_bytes && count <= max_files {
            break;
        }
        size = size.saturating_sub(entry.size);
        count -= 1;
        evict += 1;
    }

    evict
}

/// Runs eviction passes against one directory
#[derive(Debug, Clone)]
pub struct Sweeper {
    root: PathBuf,
    max_bytes: u64,
    max_files: u64,
}

impl Sweeper {
    pub fn new(root: impl Into<PathBuf>, max_bytes: u64, max_files: u64) -> Self {
        Self {
            root: root.into(),
            max_bytes,
            max_files,
        }
    }

    pub fn from_config(config: &DiskCacheConfig) -> Self {
        Self::new(config.dir.clone(), config.max_bytes, config.max_files)
    }

    /// List every regular file directly under the root.
    ///
    /// Subdirectories and symlinks are not entries. Entries that can't be
    /// read are skipped; failing to open the root at all is an error.
    pub async fn scan(&self) -> Result<EntryList> {
        let mut read_dir = fs::read_dir(&self.root)
            .await
            .map_err(|e| DiskCacheError::Sweep(Box::new(e)))?;

        let mut entries = Vec::new();
        loop {
            let dir_entry = match read_dir.next_entry().await {
                Ok(Some(dir_entry)) => dir_entry,
                Ok(None) => break,
                Err(e) => {
                    debug!(root = ?self.root, error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            let path = dir_entry.path();

            let metadata = match dir_entry.metadata().await {
                Ok(m) => m,
                Err(e) => {
                    debug!(path = ?path, error = %e, "Skipping entry with unreadable metadata");
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            let modified = match metadata.modified() {
                Ok(t) => t,
                Err(e) => {
                    debug!(path = ?path, error = %e, "Skipping entry without mtime");
                    continue;
                }
            };

            entries.push(CacheEntry {
                key: dir_entry.file_name().to_string_lossy().into_owned(),
                path,
                size: metadata.len(),
                last_access: DateTime::<Utc>::from(modified),
            });
        }

        Ok(EntryList::new(entries))
    }

    /// Run one pass: scan, rank oldest first, evict until within budget.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let mut entries = self.scan().await?;
        entries.sort_by_recency();
        Ok(self.evict(&entries).await)
    }

    /// Remove the oldest of `entries` until both budgets hold.
    ///
    /// `entries` must be sorted oldest first. A failed removal is logged and
    /// counted, but the bookkeeping carries on as if the file were gone; the
    /// next pass re-reads the directory anyway.
    pub async fn evict(&self, entries: &EntryList) -> SweepReport {
        let total_size_before = entries.total_size();
        let mut report = SweepReport {
            scanned: entries.len(),
            total_size_before,
            remaining: entries.len(),
            remaining_size: total_size_before,
            ..Default::default()
        };

        let evict = plan_evictions(entries, self.max_bytes, self.max_files);

        for entry in entries.iter().take(evict) {
            match fs::remove_file(&entry.path).await {
                Ok(()) => {
                    debug!(key = %entry.key, size = entry.size, "Evicted cache entry");
                }
                Err(e) => {
                    warn!(key = %entry.key, error = %e, "Failed to remove cache entry");
                    report.failed_removals += 1;
                }
            }

            report.evicted += 1;
            report.evicted_bytes += entry.size;
            report.remaining -= 1;
            report.remaining_size = report.remaining_size.saturating_sub(entry.size);
        }

        report
    }
}
