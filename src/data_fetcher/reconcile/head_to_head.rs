//! Last-known-good head-to-head answers per team pair

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use tracing::debug;

use crate::data_fetcher::models::HeadToHeadCacheEntry;

/// Remembers the most recent non-empty head-to-head listing for each pair.
///
/// Entries never expire on their own; they are replaced by the next non-empty
/// answer or evicted when the pair falls out of the LRU.
#[derive(Debug)]
pub struct HeadToHeadStore {
    entries: Mutex<LruCache<String, HeadToHeadCacheEntry>>,
}

impl HeadToHeadStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// A copy of the last-known-good entry.
    pub fn get(&self, pair_key: &str) -> Option<HeadToHeadCacheEntry> {
        self.lock().get(pair_key).cloned()
    }

    /// Stores `matches` as the new last-known-good answer. Empty listings are ignored.
    pub fn record(
        &self,
        pair_key: &str,
        league: &str,
        matches: &[Value],
        at: DateTime<Utc>,
    ) -> bool {
        if matches.is_empty() {
            return false;
        }
        debug!("Recording {} head-to-head matches for {}", matches.len(), pair_key);
        self.lock().put(
            pair_key.to_string(),
            HeadToHeadCacheEntry {
                team_pair_key: pair_key.to_string(),
                league: league.to_string(),
                matches: matches.to_vec(),
                last_good_at: at,
            },
        );
        true
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, HeadToHeadCacheEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for HeadToHeadStore {
    fn default() -> Self {
        Self::new(crate::constants::capacity::HEAD_TO_HEAD_PAIRS)
    }
}
