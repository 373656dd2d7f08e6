use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, trace};

use super::types::{CacheEntry, CacheInfo};

/// In-process tier. Sharded map so different keys never contend; writes to the same
/// key replace the entry (last writer wins, TTL refreshed).
#[derive(Debug)]
pub struct MemoryTier {
    entries: DashMap<String, CacheEntry>,
    capacity: usize,
}

impl MemoryTier {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Returns a copy of a live entry. Expired entries are evicted on the way out.
    pub fn get(&self, key: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            trace!("Evicting expired memory entry: key={}", key);
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }
        None
    }

    pub fn insert(&self, entry: CacheEntry, now: DateTime<Utc>) {
        if !self.entries.contains_key(&entry.key) && self.entries.len() >= self.capacity {
            self.make_room(now);
        }
        self.entries.insert(entry.key.clone(), entry);
    }

    pub fn remove(&self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key).map(|(_, entry)| entry)
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn info(&self) -> CacheInfo {
        CacheInfo {
            size: self.entries.len(),
            capacity: self.capacity,
        }
    }

    // Expired entries go first; if none, the entry closest to expiry.
    fn make_room(&self, now: DateTime<Utc>) {
        if self.purge_expired(now) > 0 {
            return;
        }
        let victim = self
            .entries
            .iter()
            .min_by_key(|entry| entry.expires_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = victim {
            debug!("Memory tier full, evicting earliest-expiring key={}", key);
            self.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_fetcher::cache::types::CacheTier;
    use chrono::TimeZone;
    use serde_json::json;
    use std::time::Duration;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 8, 12, 0, 0).unwrap()
    }

    fn entry(key: &str, ttl_secs: u64, now: DateTime<Utc>) -> CacheEntry {
        CacheEntry::new(key, json!(key), Duration::from_secs(ttl_secs), CacheTier::Memory, now)
    }

    #[test]
    fn test_get_returns_live_entry_and_evicts_expired() {
        let tier = MemoryTier::new(10);
        tier.insert(entry("a", 5, t0()), t0());

        assert!(tier.get("a", t0()).is_some());
        assert!(tier.get("a", t0() + chrono::TimeDelta::seconds(5)).is_none());
        assert_eq!(tier.info().size, 0);
    }

    #[test]
    fn test_same_key_last_writer_wins() {
        let tier = MemoryTier::new(10);
        tier.insert(entry("a", 5, t0()), t0());
        let mut newer = entry("a", 60, t0());
        newer.value = json!("second");
        tier.insert(newer, t0());

        let got = tier.get("a", t0() + chrono::TimeDelta::seconds(30)).unwrap();
        assert_eq!(got.value, json!("second"));
        assert_eq!(tier.info().size, 1);
    }

    #[test]
    fn test_capacity_evicts_expired_before_live() {
        let tier = MemoryTier::new(2);
        tier.insert(entry("short", 1, t0()), t0());
        tier.insert(entry("long", 100, t0()), t0());

        let later = t0() + chrono::TimeDelta::seconds(10);
        tier.insert(entry("new", 100, later), later);

        assert!(tier.get("long", later).is_some());
        assert!(tier.get("new", later).is_some());
        assert_eq!(tier.info().size, 2);
    }

    #[test]
    fn test_capacity_evicts_earliest_expiring_when_all_live() {
        let tier = MemoryTier::new(2);
        tier.insert(entry("soon", 10, t0()), t0());
        tier.insert(entry("late", 100, t0()), t0());
        tier.insert(entry("new", 50, t0()), t0());

        assert!(tier.get("soon", t0()).is_none());
        assert!(tier.get("late", t0()).is_some());
        assert!(tier.get("new", t0()).is_some());
    }

    #[test]
    fn test_purge_expired_counts_removed() {
        let tier = MemoryTier::new(10);
        tier.insert(entry("a", 1, t0()), t0());
        tier.insert(entry("b", 1, t0()), t0());
        tier.insert(entry("c", 100, t0()), t0());

        assert_eq!(tier.purge_expired(t0() + chrono::TimeDelta::seconds(2)), 2);
        assert_eq!(tier.info().size, 1);
    }
}
