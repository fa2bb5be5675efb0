//! Disk cache facade and the background sweep loop

use crate::config::DiskCacheConfig;
use crate::error::{DiskCacheError, Result};
use crate::store::Store;
use crate::sweeper::Sweeper;
use crate::types::{CacheStats, SweepReport};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

struct Inner {
    config: DiskCacheConfig,
    store: Store,
    sweeper: Sweeper,
    /// Process-local counters, never used to decide eviction
    hits: AtomicU64,
    misses: AtomicU64,
}

/// A bounded on-disk cache.
///
/// Reads and writes go straight to the filesystem. Budgets are enforced
/// only by the sweep loop launched with [`DiskCache::start`], so the
/// directory may temporarily exceed them between sweeps. Clones share the
/// same directory and counters.
#[derive(Clone)]
pub struct DiskCache {
    inner: Arc<Inner>,
}

impl DiskCache {
    /// Create a cache over `config.dir`. Nothing is validated or spawned yet.
    pub fn new(config: DiskCacheConfig) -> Self {
        let store = Store::new(config.dir.clone());
        let sweeper = Sweeper::from_config(&config);
        Self {
            inner: Arc::new(Inner {
                config,
                store,
                sweeper,
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &DiskCacheConfig {
        &self.inner.config
    }

    /// Make sure the cache directory exists
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.inner.config.dir).await?;
        info!(cache_dir = ?self.inner.config.dir, "Cache initialized");
        Ok(())
    }

    /// Validate the configuration and spawn the periodic sweep loop.
    ///
    /// The first sweep runs one full interval after this call. Returns a
    /// configuration error when called outside a tokio runtime.
    pub fn start(&self) -> Result<SweeperHandle> {
        self.inner.config.validate()?;

        let runtime = Handle::try_current().map_err(|e| {
            DiskCacheError::Config(format!("sweeper needs a tokio runtime: {}", e))
        })?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sweeper = self.inner.sweeper.clone();
        let period = self.inner.config.sweep_interval;
        let task = runtime.spawn(run_sweep_loop(sweeper, period, shutdown_rx));

        info!(
            cache_dir = ?self.inner.config.dir,
            max_bytes = self.inner.config.max_bytes,
            max_files = self.inner.config.max_files,
            sweep_interval = ?period,
            "Disk cache sweeper started"
        );

        Ok(SweeperHandle { shutdown_tx, task })
    }

    /// Read the entry stored under `key`. Any failure is `NotFound`.
    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let result = self.inner.store.get(key).await;
        let counter = if result.is_ok() {
            &self.inner.hits
        } else {
            &self.inner.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        result
    }

    /// Store `data` under `key`, replacing whatever was there
    pub async fn set(&self, key: &str, data: &[u8]) -> Result<()> {
        self.inner.store.set(key, data).await
    }

    /// Mark `key` as recently used without reading it
    pub async fn touch(&self, key: &str) -> Result<()> {
        self.inner.store.touch(key).await
    }

    /// Run one sweep right away, independent of the background loop
    pub async fn sweep_now(&self) -> Result<SweepReport> {
        self.inner.sweeper.sweep().await
    }

    /// Current size of the cache, read fresh from disk
    pub async fn stats(&self) -> Result<CacheStats> {
        let entries = self.inner.sweeper.scan().await?;
        Ok(CacheStats {
            entries: entries.len(),
            total_size: entries.total_size(),
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
        })
    }
}

/// Owner of a running sweep loop.
///
/// Dropping the handle has the same effect as
/// [`request_shutdown`](Self::request_shutdown).
#[must_use = "dropping the handle stops the sweeper"]
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Ask the loop to exit at its next wake-up. Safe to call repeatedly.
    /// A sweep already in progress runs to completion first.
    pub fn request_shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal shutdown and wait for the loop to exit
    pub async fn shutdown(self) {
        self.request_shutdown();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Sweeper task ended abnormally");
        }
    }
}

async fn run_sweep_loop(sweeper: Sweeper, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            // A closed channel means the handle was dropped
            _ = shutdown.changed() => {
                info!("Shutting down disk cache sweeper");
                return;
            }
            _ = ticker.tick() => {
                match sweeper.sweep().await {
                    Ok(report) if report.evicted > 0 => {
                        info!(
                            scanned = report.scanned,
                            evicted = report.evicted,
                            evicted_bytes = report.evicted_bytes,
                            failed_removals = report.failed_removals,
                            remaining = report.remaining,
                            remaining_size = report.remaining_size,
                            "Sweep evicted cache entries"
                        );
                    }
                    Ok(report) => {
                        debug!(
                            scanned = report.scanned,
                            total_size = report.total_size_before,
                            "Sweep found cache within budget"
                        );
                    }
                    Err(e) => {
                        error!(error = %e, "Error during sweep");
                    }
                }
            }
        }
    }
}
