//! Process-lifetime TTL cache for upstream fetches.

use parking_lot::RwLock;
use serde::Serialize;
use sha2::Digest as _;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    expires_at: Instant,
    value: V,
}

/// Memoizes producer results by fingerprint until their TTL elapses.
///
/// Cloning is cheap; clones share the same entries. There is no single-flight deduplication:
/// concurrent misses on the same key each run their producer, and the last one to finish wins.
#[derive(Clone)]
pub struct TtlCache<V> {
    inner: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<V: Clone> TtlCache<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh value for `key`, if any. Expired entries are evicted on lookup.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let map = self.inner.read();
            let entry = map.get(key)?;
            if entry.expires_at > now {
                return Some(entry.value.clone());
            }
        }
        let mut map = self.inner.write();
        if map.get(key).is_some_and(|e| e.expires_at <= now) {
            map.remove(key);
        }
        None
    }

    /// Store `value` until `now + ttl`. A zero TTL stores nothing.
    pub fn put(&self, key: String, value: V, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let expires_at = Instant::now() + ttl;
        self.inner
            .write()
            .insert(key, CacheEntry { expires_at, value });
    }

    /// Return the cached value for `key`, or run `producer` and cache its success.
    ///
    /// Errors are returned as-is and never cached.
    ///
    /// # Errors
    ///
    /// Returns the producer's error on a miss.
    pub async fn with_cache<F, Fut, E>(&self, key: &str, ttl: Duration, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(key) {
            debug!(cache_key = %key, "cache hit");
            return Ok(hit);
        }
        debug!(cache_key = %key, "cache miss");
        let value = producer().await?;
        self.put(key.to_string(), value.clone(), ttl);
        Ok(value)
    }

    pub fn invalidate(&self, key: &str) {
        self.inner.write().remove(key);
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Number of stored entries, expired ones included until they are purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut map = self.inner.write();
        let before = map.len();
        map.retain(|_, e| e.expires_at > now);
        before - map.len()
    }
}

/// Deterministic cache key for `params` under `namespace`.
///
/// Two calls produce the same key exactly when `params` serialize to the same JSON.
#[must_use]
pub fn fingerprint<P: Serialize + ?Sized>(namespace: &str, params: &P) -> String {
    let s = serde_json::to_string(params).expect("cache fingerprint params serialize as json");
    format!(
        "{namespace}:{}",
        hex::encode(sha2::Sha256::digest(s.as_bytes()))
    )
}
