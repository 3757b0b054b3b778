//! A bounded on-disk cache of served feeds.
//!
//! Every entry is one JSON file in the cache directory, named after the SHA-256 of its key.
//! Entries are written to a temporary file first and renamed into place.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{DateTime, Utc};
use lc_core::config::Config;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

static ENTRY_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache entry is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    key: String,
    /// `None` never expires.
    expires_at: Option<DateTime<Utc>>,
    value: String,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
    timeout: Duration,
    threshold: usize,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>, timeout: Duration, threshold: usize) -> Self {
        Self {
            dir: dir.into(),
            timeout,
            threshold,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.cache_dir.clone(),
            config.cache_timeout,
            config.cache_threshold,
        )
    }

    /// Get a value which has not expired yet.
    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.get_at(key, Utc::now()).await
    }

    /// Store a value, making room first if the cache is full.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.set_at(key, value, Utc::now()).await
    }

    async fn get_at(&self, key: &str, now: DateTime<Utc>) -> Result<Option<String>, CacheError> {
        let path = self.path(key);
        let Some(entry) = read_entry(&path).await? else {
            return Ok(None);
        };
        if entry.key != key {
            return Ok(None);
        }
        if entry.is_expired(now) {
            remove(&path).await?;
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    async fn set_at(&self, key: &str, value: &str, now: DateTime<Utc>) -> Result<(), CacheError> {
        if self.threshold == 0 {
            return Ok(());
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        self.prune(now).await?;
        let entry = CacheEntry {
            key: key.to_string(),
            expires_at: self.expires_at(now),
            value: value.to_string(),
        };
        let path = self.path(key);
        let tmp = self
            .dir
            .join(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, serde_json::to_vec(&entry)?).await?;
        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            remove(&tmp).await?;
            return Err(err.into());
        }
        Ok(())
    }

    /// Make room for one more entry.
    ///
    /// Expired entries go first, then the ones closest to expiring. Returns the number of removed
    /// entries.
    async fn prune(&self, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let mut entries = self.entries().await?;
        if entries.len() < self.threshold {
            return Ok(0);
        }
        let mut removed = 0;
        let mut kept: Vec<(PathBuf, Option<DateTime<Utc>>)> = vec![];
        for (path, entry) in entries.drain(..) {
            match entry {
                Some(entry) if !entry.is_expired(now) => kept.push((path, entry.expires_at)),
                _ => {
                    remove(&path).await?;
                    removed += 1;
                }
            }
        }
        // entries without expiry sort last
        kept.sort_by_key(|(_, expires_at)| (expires_at.is_none(), *expires_at));
        let excess = (kept.len() + 1).saturating_sub(self.threshold);
        for (path, _) in kept.iter().take(excess) {
            remove(path).await?;
            removed += 1;
        }
        tracing::debug!("pruned {removed} cache entries from {}", self.dir.display());
        Ok(removed)
    }

    /// All entry files with their content, `None` for unreadable ones.
    async fn entries(&self) -> Result<Vec<(PathBuf, Option<CacheEntry>)>, CacheError> {
        let mut entries = vec![];
        let mut read_dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(read_dir) => read_dir,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(entries),
            Err(err) => return Err(err.into()),
        };
        while let Some(dir_entry) = read_dir.next_entry().await? {
            let path = dir_entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            let entry = read_entry(&path).await.ok().flatten();
            entries.push((path, entry));
        }
        Ok(entries)
    }

    fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.timeout.is_zero() {
            return None;
        }
        chrono::Duration::from_std(self.timeout)
            .ok()
            .and_then(|timeout| now.checked_add_signed(timeout))
    }

    fn path(&self, key: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        self.dir.join(format!("{digest}.{ENTRY_EXTENSION}"))
    }
}

async fn read_entry(path: &Path) -> Result<Option<CacheEntry>, CacheError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

async fn remove(path: &Path) -> Result<(), CacheError> {
    match tokio::fs::remove_file(path).await {
        Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn at(timestamp: &str) -> DateTime<Utc> {
        timestamp.parse().unwrap()
    }

    fn cache(dir: &TempDir, timeout: u64, threshold: usize) -> FileCache {
        FileCache::new(dir.path(), Duration::from_secs(timeout), threshold)
    }

    async fn count_entries(cache: &FileCache) -> usize {
        cache.entries().await.unwrap().len()
    }

    #[tokio::test]
    async fn test_get_missing() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir, 60, 10);
        assert_eq!(cache.get("/sre.ics").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_get() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir, 60, 10);
        cache.set("/sre.ics", "BEGIN:VCALENDAR").await.unwrap();
        assert_eq!(
            cache.get("/sre.ics").await.unwrap().as_deref(),
            Some("BEGIN:VCALENDAR")
        );
        assert_eq!(cache.get("/css.ics").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expiry() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir, 60, 10);
        let now = at("2023-01-15T12:00:00Z");
        cache.set_at("/sre.ics", "feed", now).await.unwrap();
        let fresh = cache.get_at("/sre.ics", at("2023-01-15T12:00:59Z")).await;
        assert_eq!(fresh.unwrap().as_deref(), Some("feed"));
        let stale = cache.get_at("/sre.ics", at("2023-01-15T12:01:00Z")).await;
        assert_eq!(stale.unwrap(), None);
        assert_eq!(count_entries(&cache).await, 0);
    }

    #[tokio::test]
    async fn test_zero_timeout_never_expires() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir, 0, 10);
        cache
            .set_at("/sre.ics", "feed", at("2023-01-15T12:00:00Z"))
            .await
            .unwrap();
        let later = cache.get_at("/sre.ics", at("2033-01-15T12:00:00Z")).await;
        assert_eq!(later.unwrap().as_deref(), Some("feed"));
    }

    #[tokio::test]
    async fn test_eviction_prefers_expired_then_oldest() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir, 60, 3);
        cache.set_at("/a.ics", "a", at("2023-01-15T12:00:00Z")).await.unwrap();
        cache.set_at("/b.ics", "b", at("2023-01-15T12:00:30Z")).await.unwrap();
        cache.set_at("/c.ics", "c", at("2023-01-15T12:00:40Z")).await.unwrap();
        assert_eq!(count_entries(&cache).await, 3);

        // a is expired by now
        let now = at("2023-01-15T12:01:10Z");
        cache.set_at("/d.ics", "d", now).await.unwrap();
        assert_eq!(count_entries(&cache).await, 3);
        assert_eq!(cache.get_at("/a.ics", now).await.unwrap(), None);
        assert_eq!(cache.get_at("/b.ics", now).await.unwrap().as_deref(), Some("b"));

        // nothing is expired, b expires first
        let now = at("2023-01-15T12:01:20Z");
        cache.set_at("/e.ics", "e", now).await.unwrap();
        assert_eq!(count_entries(&cache).await, 3);
        assert_eq!(cache.get_at("/b.ics", now).await.unwrap(), None);
        assert_eq!(cache.get_at("/c.ics", now).await.unwrap().as_deref(), Some("c"));
        assert_eq!(cache.get_at("/e.ics", now).await.unwrap().as_deref(), Some("e"));
    }

    #[tokio::test]
    async fn test_overwrite_does_not_grow() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir, 60, 10);
        cache.set("/sre.ics", "old").await.unwrap();
        cache.set("/sre.ics", "new").await.unwrap();
        assert_eq!(count_entries(&cache).await, 1);
        assert_eq!(cache.get("/sre.ics").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_zero_threshold_disables() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir, 60, 0);
        cache.set("/sre.ics", "feed").await.unwrap();
        assert_eq!(cache.get("/sre.ics").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_entry_is_an_error() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir, 60, 10);
        tokio::fs::write(cache.path("/sre.ics"), b"not json")
            .await
            .unwrap();
        assert!(matches!(
            cache.get("/sre.ics").await,
            Err(CacheError::Json(_))
        ));
    }
}
