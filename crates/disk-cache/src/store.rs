//! File-level reads and writes against the cache root
//!
//! The store keeps no state besides the root path. Every lookup goes to the
//! filesystem, so a key evicted by a concurrent sweep simply reads as a miss.

use crate::error::{DiskCacheError, Result};
use filetime::FileTime;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[cfg(unix)]
const ENTRY_MODE: u32 = 0o644;

/// Reads and writes cache entries as plain files named by their key
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `key`. The key is used verbatim.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Read the full contents stored under `key` and mark it as recently used.
    ///
    /// Every read failure is reported as [`DiskCacheError::NotFound`]; the
    /// actual cause is only logged.
    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key);

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(key = %key, "Cache miss");
                return Err(DiskCacheError::NotFound);
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cache entry");
                return Err(DiskCacheError::NotFound);
            }
        };

        // Best effort: a failed touch leaves the entry older than it should be
        if let Err(e) = touch_path(path).await {
            debug!(key = %key, error = %e, "Failed to refresh entry timestamp");
        }

        debug!(key = %key, size = data.len(), "Cache hit");
        Ok(data)
    }

    /// Store `data` under `key`, replacing any previous contents
    pub async fn set(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(key);

        if let Err(e) = write_entry(&path, data).await {
            warn!(key = %key, error = %e, "Failed to write cache entry");
            return Err(DiskCacheError::Write {
                key: key.to_string(),
                source: Box::new(e),
            });
        }

        debug!(key = %key, size = data.len(), "Cached entry");
        Ok(())
    }

    /// Refresh the recency of `key` without reading it
    pub async fn touch(&self, key: &str) -> Result<()> {
        touch_path(self.path_for(key)).await?;
        Ok(())
    }
}

async fn write_entry(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(ENTRY_MODE);

    let mut file = options.open(path).await?;
    file.write_all(data).await?;
    file.flush().await?;
    Ok(())
}

/// Set both access and modification time to now. OS atime tracking is often
/// disabled, so recency is carried by mtime alone.
async fn touch_path(path: PathBuf) -> io::Result<()> {
    tokio::task::spawn_blocking(move || {
        let now = FileTime::now();
        filetime::set_file_times(&path, now, now)
    })
    .await
    .map_err(io::Error::other)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_get_missing_key() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());

        let result = store.get("notexist").await;
        assert!(matches!(result, Err(DiskCacheError::NotFound)));
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());

        store.set("1", b"some data here").await.unwrap();
        let data = store.get("1").await.unwrap();
        assert_eq!(data, b"some data here");
    }

    #[tokio::test]
    async fn test_set_stores_raw_bytes_under_key() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let payload: Vec<u8> = (0..=255u8).collect();

        store.set("binary.bin", &payload).await.unwrap();

        let on_disk = std::fs::read(dir.path().join("binary.bin")).unwrap();
        assert_eq!(on_disk, payload);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_contents() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());

        store.set("k", b"first value, longer").await.unwrap();
        store.set("k", b"second").await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_empty_payload() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());

        store.set("empty", b"").await.unwrap();
        assert!(store.get("empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_refreshes_mtime() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        store.set("old", b"data").await.unwrap();

        let path = dir.path().join("old");
        let an_hour_ago = SystemTime::now() - Duration::from_secs(3600);
        filetime::set_file_mtime(&path, FileTime::from_system_time(an_hour_ago)).unwrap();

        store.get("old").await.unwrap();

        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert!(modified > an_hour_ago + Duration::from_secs(3000));
    }

    #[tokio::test]
    async fn test_failed_get_does_not_create_file() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());

        let _ = store.get("ghost").await;
        assert!(!dir.path().join("ghost").exists());
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_not_found() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("a-directory")).unwrap();
        let store = Store::new(dir.path());

        let result = store.get("a-directory").await;
        assert!(matches!(result, Err(DiskCacheError::NotFound)));
    }

    #[tokio::test]
    async fn test_set_surfaces_write_failure() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("missing-root"));

        let err = store.set("key", b"data").await.unwrap_err();
        match err {
            DiskCacheError::Write { key, source } => {
                assert_eq!(key, "key");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("Expected Write error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_touch_missing_key_errors() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());

        assert!(store.touch("nothing").await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_new_entry_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        store.set("perm", b"x").await.unwrap();

        let mode = std::fs::metadata(dir.path().join("perm"))
            .unwrap()
            .permissions()
            .mode();
        // umask may strip bits but never adds any
        assert_eq!(mode & 0o777 & !ENTRY_MODE, 0);
        assert_ne!(mode & 0o600, 0);
    }
}
