//! Bounded file-based cache with periodic LRU sweeping
//!
//! Each entry is a plain file under the cache directory, named by its key.
//! A file's modification time is its recency: reads and writes refresh it,
//! and a background sweep deletes the oldest files whenever the directory
//! holds more bytes or more files than configured. There is no in-memory
//! index; the directory listing is the source of truth on every sweep.

mod cache;
mod config;
mod error;
mod store;
mod sweeper;
mod types;

pub use cache::{DiskCache, SweeperHandle};
pub use config::{
    DiskCacheConfig, DEFAULT_MAX_BYTES, DEFAULT_MAX_FILES, DEFAULT_SWEEP_INTERVAL,
};
pub use error::{DiskCacheError, Result};
pub use store::Store;
pub use sweeper::{plan_evictions, Sweeper};
pub use types::{CacheEntry, CacheStats, EntryList, SweepReport};
