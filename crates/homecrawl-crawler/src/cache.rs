//! Result cache: TTL-bounded storage of completed crawl results.
//!
//! Storage is a pluggable [`KvStore`] (in-memory for tests, JSON files on
//! disk for the CLI). The cache layer owns the envelope format and the TTL
//! policy; expiry is lazy — a stale entry is detected and deleted on read,
//! nothing scans the store in the background.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use homecrawl_core::CrawlResult;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::CacheError;

/// Minimal async key-value storage for serialized cache entries.
#[allow(async_fn_in_trait)]
pub trait KvStore {
    /// Returns the stored bytes for `key`, or `None` on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] when the backing storage fails.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] when the backing storage fails.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError>;

    /// Removes `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] when the backing storage fails.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Removes every stored entry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] when the backing storage fails.
    async fn clear(&self) -> Result<(), CacheError>;
}

/// In-memory store for tests and short-lived runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.entries.write().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// One-file-per-key store under a base directory.
///
/// Writes go through a temp file and an atomic rename so a concurrent reader
/// never observes a half-written entry.
#[derive(Debug)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Creates the store, creating `base_dir` if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", sanitize_key(key)))
    }
}

/// Maps an arbitrary key onto a safe filename stem. Area ids are typically
/// already clean; this guards against separators and path traversal.
fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_owned()
    } else {
        cleaned
    }
}

impl KvStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut dir = tokio::fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                tokio::fs::remove_file(entry.path()).await?;
            }
        }
        Ok(())
    }
}

/// Stored envelope: the result plus the instant it was cached.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    stored_at: DateTime<Utc>,
    result: CrawlResult,
}

/// TTL cache of crawl results keyed by area id.
#[derive(Debug)]
pub struct ResultCache<S> {
    store: S,
    ttl_hours: u32,
}

impl<S: KvStore> ResultCache<S> {
    pub fn new(store: S, ttl_hours: u32) -> Self {
        Self { store, ttl_hours }
    }

    /// Returns a fresh cached result for `area_id`, or `None` when absent,
    /// expired, or unreadable. Stale and corrupt entries are deleted on the
    /// way out so the next write starts clean.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] when the backing storage fails; misses of
    /// any other kind are `Ok(None)`.
    pub async fn get(&self, area_id: &str) -> Result<Option<CrawlResult>, CacheError> {
        let Some(bytes) = self.store.get(area_id).await? else {
            return Ok(None);
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(area_id, error = %e, "discarding corrupt cache entry");
                self.store.delete(area_id).await?;
                return Ok(None);
            }
        };

        let age = Utc::now().signed_duration_since(entry.stored_at);
        if age.num_hours() >= i64::from(self.ttl_hours) {
            tracing::debug!(area_id, age_hours = age.num_hours(), "cache entry expired");
            self.store.delete(area_id).await?;
            return Ok(None);
        }

        Ok(Some(entry.result))
    }

    /// Stores `result` unconditionally, stamping the current time.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Serialize`] or [`CacheError::Io`].
    pub async fn put(&self, result: &CrawlResult) -> Result<(), CacheError> {
        let entry = CacheEntry {
            stored_at: Utc::now(),
            result: result.clone(),
        };
        let bytes = serde_json::to_vec(&entry).map_err(CacheError::Serialize)?;
        self.store.set(&result.area_id, bytes).await
    }

    /// Removes the entry for `area_id`, fresh or stale.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] when the backing storage fails.
    pub async fn evict(&self, area_id: &str) -> Result<(), CacheError> {
        self.store.delete(area_id).await
    }

    /// Removes every cached result.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] when the backing storage fails.
    pub async fn evict_all(&self) -> Result<(), CacheError> {
        self.store.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result(area_id: &str) -> CrawlResult {
        CrawlResult {
            area_id: area_id.to_owned(),
            listings: Vec::new(),
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn sanitize_key_strips_path_separators() {
        assert_eq!(sanitize_key("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_key("district-3"), "district-3");
        assert_eq!(sanitize_key(""), "_");
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::new();
        store.set("k", b"v".to_vec()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn ttl_wires_straight_from_config() {
        // The TTL flows from `CrawlConfig.cache_ttl_hours` without any cast;
        // this test stops compiling if the two types ever diverge.
        let config = homecrawl_core::CrawlConfig {
            provider_base_url: "http://localhost:1".to_owned(),
            request_timeout_secs: 1,
            user_agent: "test".to_owned(),
            max_retries: 0,
            retry_backoff_base_secs: 0,
            tile_side_km: 1.0,
            cache_ttl_hours: 24,
            cache_dir: std::path::PathBuf::from("./data"),
            log_level: "info".to_owned(),
        };
        let cache = ResultCache::new(MemoryStore::new(), config.cache_ttl_hours);
        cache.put(&sample_result("cfg")).await.unwrap();
        assert!(cache.get("cfg").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn cache_hit_within_ttl() {
        let cache = ResultCache::new(MemoryStore::new(), 24);
        cache.put(&sample_result("tehran-3")).await.unwrap();
        let hit = cache.get("tehran-3").await.unwrap();
        assert_eq!(hit.map(|r| r.area_id), Some("tehran-3".to_owned()));
    }

    #[tokio::test]
    async fn zero_ttl_expires_immediately() {
        let store = MemoryStore::new();
        let cache = ResultCache::new(store, 0);
        cache.put(&sample_result("a")).await.unwrap();
        assert!(cache.get("a").await.unwrap().is_none());
        // The stale entry was deleted on the miss.
        assert!(cache.store.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_entry_is_deleted_and_reported_as_miss() {
        let store = MemoryStore::new();
        store.set("bad", b"not json".to_vec()).await.unwrap();
        let cache = ResultCache::new(store, 24);
        assert!(cache.get("bad").await.unwrap().is_none());
        assert!(cache.store.get("bad").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_previous_entry() {
        let cache = ResultCache::new(MemoryStore::new(), 24);
        let mut result = sample_result("x");
        cache.put(&result).await.unwrap();
        result.completed_at = Utc::now();
        cache.put(&result).await.unwrap();
        assert!(cache.get("x").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn evict_and_evict_all() {
        let cache = ResultCache::new(MemoryStore::new(), 24);
        cache.put(&sample_result("a")).await.unwrap();
        cache.put(&sample_result("b")).await.unwrap();
        cache.evict("a").await.unwrap();
        assert!(cache.get("a").await.unwrap().is_none());
        assert!(cache.get("b").await.unwrap().is_some());
        cache.evict_all().await.unwrap();
        assert!(cache.get("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("homecrawl-test-{}", std::process::id()));
        let store = FileStore::new(&dir).unwrap();
        store.set("district-3", b"{}".to_vec()).await.unwrap();
        assert_eq!(store.get("district-3").await.unwrap(), Some(b"{}".to_vec()));
        store.clear().await.unwrap();
        assert_eq!(store.get("district-3").await.unwrap(), None);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
