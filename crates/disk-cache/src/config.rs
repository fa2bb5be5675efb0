//! Cache configuration

use crate::error::{DiskCacheError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MAX_BYTES: u64 = 1 << 20; // 1 MiB
pub const DEFAULT_MAX_FILES: u64 = 256;
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for a disk cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskCacheConfig {
    /// Directory holding one file per key
    pub dir: PathBuf,
    /// Budget for the aggregate size of all entries
    pub max_bytes: u64,
    /// Budget for the number of entries
    pub max_files: u64,
    /// Time between sweeps
    pub sweep_interval: Duration,
}

impl Default for DiskCacheConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir(),
            max_bytes: DEFAULT_MAX_BYTES,
            max_files: DEFAULT_MAX_FILES,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl DiskCacheConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    /// Load configuration from `DISK_CACHE_*` environment variables.
    ///
    /// Unset or unparsable values fall back to the defaults; call
    /// [`validate`](Self::validate) (or `DiskCache::start`) to reject zeros.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let dir = lookup("DISK_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.dir);

        let max_bytes = lookup("DISK_CACHE_MAX_BYTES")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.max_bytes);

        let max_files = lookup("DISK_CACHE_MAX_FILES")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.max_files);

        let sweep_interval = lookup("DISK_CACHE_SWEEP_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.sweep_interval);

        Self {
            dir,
            max_bytes,
            max_files,
            sweep_interval,
        }
    }

    /// Check that both budgets and the sweep interval are non-zero
    pub fn validate(&self) -> Result<()> {
        if self.max_bytes == 0 {
            return Err(DiskCacheError::Config(
                "max_bytes must be greater than 0".to_string(),
            ));
        }
        if self.max_files == 0 {
            return Err(DiskCacheError::Config(
                "max_files must be greater than 0".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(DiskCacheError::Config(
                "sweep_interval must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
