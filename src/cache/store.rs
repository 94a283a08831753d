//! In-process query cache.
//!
//! Values are stored as JSON so one store can hold every read model. The
//! store is bounded by an LRU; keys are plain strings so invalidation can
//! sweep a whole family by prefix.

use std::future::Future;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use lru::LruCache;
use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::config::CacheConfig;

type Entries = LruCache<String, Value>;

pub struct QueryCache {
    enabled: bool,
    entries: RwLock<Entries>,
}

impl QueryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            enabled: config.enabled,
            entries: RwLock::new(LruCache::new(config.max_entries_non_zero())),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.enabled {
            return None;
        }

        let cached = self.write("get").get(key).cloned();
        let Some(value) = cached else {
            counter!("inkpad_cache_miss_total").increment(1);
            return None;
        };

        match serde_json::from_value(value) {
            Ok(decoded) => {
                counter!("inkpad_cache_hit_total").increment(1);
                Some(decoded)
            }
            Err(err) => {
                warn!(
                    target = "inkpad::cache",
                    key,
                    error = %err,
                    "Dropping cache entry with unexpected shape"
                );
                self.write("get.drop").pop(key);
                counter!("inkpad_cache_miss_total").increment(1);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        if !self.enabled {
            return;
        }

        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    target = "inkpad::cache",
                    key,
                    error = %err,
                    "Skipping cache write for unserializable value"
                );
                return;
            }
        };

        let displaced = self.write("set").push(key.to_string(), value);
        if let Some((displaced_key, _)) = displaced
            && displaced_key != key
        {
            counter!("inkpad_cache_evict_total").increment(1);
        }
    }

    /// Returns the cached value for `key`, or awaits `compute` and caches
    /// its successful result. Concurrent misses may compute twice; the last
    /// write wins. Errors are returned as-is and never cached.
    pub async fn get_or_set<T, E, F, Fut>(&self, key: &str, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let value = compute().await?;
        self.set(key, &value);
        Ok(value)
    }

    pub fn delete(&self, key: &str) -> bool {
        let removed = self.write("delete").pop(key).is_some();
        if removed {
            counter!("inkpad_cache_invalidate_total").increment(1);
        }
        removed
    }

    /// Removes every key starting with `prefix` and returns how many went.
    pub fn delete_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.write("delete_prefix");
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &doomed {
            entries.pop(key);
        }
        drop(entries);

        if !doomed.is_empty() {
            counter!("inkpad_cache_invalidate_total").increment(doomed.len() as u64);
        }
        debug!(
            target = "inkpad::cache",
            prefix,
            removed = doomed.len(),
            "Swept cache prefix"
        );
        doomed.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read("contains").contains(key)
    }

    pub fn len(&self) -> usize {
        self.read("len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock leaves the LRU structurally intact, so
    // poisoning is logged and the guard reused.
    fn read(&self, op: &'static str) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(|poisoned| {
            warn!(target = "inkpad::cache", op, "Recovered from poisoned cache lock");
            poisoned.into_inner()
        })
    }

    fn write(&self, op: &'static str) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(|poisoned| {
            warn!(target = "inkpad::cache", op, "Recovered from poisoned cache lock");
            poisoned.into_inner()
        })
    }
}
