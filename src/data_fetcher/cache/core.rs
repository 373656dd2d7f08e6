use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use super::clock::{Clock, SystemClock};
use super::durable_tier::DurableTier;
use super::memory_tier::MemoryTier;
use super::types::{CacheEntry, CacheStats, CacheTier, DataClass};
use crate::constants::capacity;

/// Two-tier cache: an in-process map in front of an optional file-backed store.
///
/// Reads check memory first, then the durable tier; a live durable hit is promoted
/// into memory. Durable writes run in the background and a failed write only
/// leaves the entry memory-resident.
#[derive(Debug)]
pub struct TieredCache {
    memory: MemoryTier,
    durable: Option<DurableTier>,
    clock: Arc<dyn Clock>,
    pending_writes: Mutex<JoinSet<()>>,
    hits: AtomicU64,
    misses: AtomicU64,
    promotions: AtomicU64,
}

impl TieredCache {
    pub fn new(memory_capacity: usize, durable_dir: Option<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            memory: MemoryTier::new(memory_capacity),
            durable: durable_dir.map(DurableTier::new),
            clock,
            pending_writes: Mutex::new(JoinSet::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            promotions: AtomicU64::new(0),
        }
    }

    /// Memory-only cache on the wall clock.
    pub fn in_memory() -> Self {
        Self::new(capacity::MEMORY_TIER_ENTRIES, None, Arc::new(SystemClock))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn has_durable_tier(&self) -> bool {
        self.durable.is_some()
    }

    /// Returns a copy of the cached value, or `None` if absent or expired.
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Option<Value> {
        let now = self.now();
        if let Some(entry) = self.memory.get(key, now) {
            debug!("Cache hit (memory): key={}", key);
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(entry.value);
        }

        if let Some(durable) = &self.durable
            && let Some(entry) = durable.load(key, now).await
        {
            debug!(
                "Cache hit (durable), promoting: key={}, remaining={:?}",
                key,
                entry.time_until_expiry(now)
            );
            self.hits.fetch_add(1, Ordering::Relaxed);
            self.promotions.fetch_add(1, Ordering::Relaxed);
            let value = entry.value.clone();
            self.memory.insert(entry, now);
            return Some(value);
        }

        debug!("Cache miss: key={}", key);
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Typed read. A value that no longer deserializes is treated as a miss.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Cached value for key={} has unexpected shape: {}", key, e);
                None
            }
        }
    }

    /// Stores a value with the TTL and tier of its data class.
    pub fn set(&self, key: &str, value: Value, class: DataClass) {
        self.set_with(key, value, class.ttl(), class.tier());
    }

    pub fn set_as<T: Serialize>(&self, key: &str, value: &T, class: DataClass) {
        match serde_json::to_value(value) {
            Ok(value) => self.set(key, value, class),
            Err(e) => warn!("Could not serialize value for key={}: {}", key, e),
        }
    }

    #[instrument(skip(self, value))]
    pub fn set_with(&self, key: &str, value: Value, ttl: Duration, tier: CacheTier) {
        let now = self.now();
        let entry = CacheEntry::new(key, value, ttl, tier, now);

        if tier == CacheTier::Durable
            && let Some(durable) = &self.durable
        {
            self.persist_in_background(durable.clone(), entry.clone());
        }

        self.memory.insert(entry, now);
        debug!("Cached key={} ttl={:?} tier={:?}", key, ttl, tier);
    }

    fn persist_in_background(&self, durable: DurableTier, entry: CacheEntry) {
        let mut pending = self
            .pending_writes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        while pending.try_join_next().is_some() {}
        pending.spawn(async move {
            if let Err(e) = durable.store(&entry).await {
                warn!(
                    "Durable cache write failed for key={}, keeping memory copy only: {}",
                    entry.key, e
                );
            }
        });
    }

    /// Waits for background durable writes issued so far.
    pub async fn flush(&self) {
        let mut pending = {
            let mut guard = self
                .pending_writes
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::take(&mut *guard)
        };
        while pending.join_next().await.is_some() {}
    }

    /// Evicts expired entries from both tiers and returns the number removed.
    #[instrument(skip(self))]
    pub async fn invalidate_expired(&self) -> usize {
        let now = self.now();
        let mut removed = self.memory.purge_expired(now);
        if let Some(durable) = &self.durable {
            match durable.sweep_expired(now).await {
                Ok(count) => removed += count,
                Err(e) => warn!("Durable cache sweep failed: {}", e),
            }
        }
        if removed > 0 {
            info!("Invalidated {} expired cache entries", removed);
        }
        removed
    }

    pub async fn remove(&self, key: &str) {
        self.memory.remove(key);
        if let Some(durable) = &self.durable
            && let Err(e) = durable.delete(key).await
        {
            warn!("Failed to delete durable cache entry key={}: {}", key, e);
        }
    }

    pub async fn clear(&self) {
        self.flush().await;
        self.memory.clear();
        if let Some(durable) = &self.durable {
            match durable.clear().await {
                Ok(count) => info!("Cleared {} durable cache files", count),
                Err(e) => warn!("Failed to clear durable cache: {}", e),
            }
        }
        info!("All caches cleared");
    }

    pub async fn stats(&self) -> CacheStats {
        let durable_entries = match &self.durable {
            Some(durable) => durable.entry_count().await,
            None => 0,
        };
        CacheStats {
            memory: self.memory.info(),
            durable_entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
        }
    }
}

impl Default for TieredCache {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_fetcher::cache::clock::ManualClock;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_memory_only_set_get() {
        let cache = TieredCache::in_memory();
        cache.set("k", json!({"a": 1}), DataClass::MatchDetail);
        assert_eq!(cache.get("k").await, Some(json!({"a": 1})));
        assert_eq!(cache.get("missing").await, None);

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.durable_entries, 0);
    }

    #[tokio::test]
    async fn test_expiry_under_manual_clock() {
        let clock = Arc::new(ManualClock::starting_now());
        let cache = TieredCache::new(16, None, clock.clone());
        cache.set_with("k", json!(1), Duration::from_secs(30), CacheTier::Memory);

        clock.advance(Duration::from_secs(29));
        assert_eq!(cache.get("k").await, Some(json!(1)));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_memory_class_never_touches_disk() {
        let dir = tempdir().unwrap();
        let cache = TieredCache::new(16, Some(dir.path().to_path_buf()), Arc::new(SystemClock));
        cache.set("live", json!(1), DataClass::LiveMatch);
        cache.flush().await;
        assert_eq!(cache.stats().await.durable_entries, 0);
    }

    #[tokio::test]
    async fn test_typed_roundtrip() {
        let cache = TieredCache::in_memory();
        cache.set_as("ids", &vec![1_i64, 2, 3], DataClass::TeamMetadata);
        let ids: Option<Vec<i64>> = cache.get_as("ids").await;
        assert_eq!(ids, Some(vec![1, 2, 3]));
        let wrong: Option<String> = cache.get_as("ids").await;
        assert_eq!(wrong, None);
    }
}
