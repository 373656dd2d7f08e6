//! Cache data structures with TTL support

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::constants::cache_ttl;

/// Where an entry lives. Durable entries are also held in memory while warm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheTier {
    Memory,
    Durable,
}

/// Kind of data being cached. Callers pick the class and the class picks TTL and tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataClass {
    /// Match listings for a date, may contain in-progress games
    LiveMatch,
    /// Match detail and box scores
    MatchDetail,
    Statistics,
    HeadToHead,
    /// Team search results; survive restarts
    TeamMetadata,
    /// Bulk team catalog; survives restarts
    Catalog,
    /// Last reconciled statistics pair for a match
    Reconciled,
}

impl DataClass {
    pub fn ttl(self) -> Duration {
        let seconds = match self {
            DataClass::LiveMatch => cache_ttl::LIVE_MATCH_SECONDS,
            DataClass::MatchDetail => cache_ttl::MATCH_DETAIL_SECONDS,
            DataClass::Statistics => cache_ttl::STATISTICS_SECONDS,
            DataClass::HeadToHead => cache_ttl::HEAD_TO_HEAD_SECONDS,
            DataClass::TeamMetadata => cache_ttl::TEAM_METADATA_SECONDS,
            DataClass::Catalog => cache_ttl::CATALOG_SECONDS,
            DataClass::Reconciled => cache_ttl::RECONCILED_RECORD_SECONDS,
        };
        Duration::from_secs(seconds)
    }

    pub fn tier(self) -> CacheTier {
        match self {
            DataClass::TeamMetadata | DataClass::Catalog | DataClass::Reconciled => {
                CacheTier::Durable
            }
            _ => CacheTier::Memory,
        }
    }
}

/// A cached value with an absolute expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub value: Value,
    pub expires_at: DateTime<Utc>,
    pub tier: CacheTier,
}

impl CacheEntry {
    pub fn new(
        key: impl Into<String>,
        value: Value,
        ttl: Duration,
        tier: CacheTier,
        now: DateTime<Utc>,
    ) -> Self {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        Self {
            key: key.into(),
            value,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            tier,
        }
    }

    /// An entry is expired at and after its expiry instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Cache size information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    pub size: usize,
    pub capacity: usize,
}

impl CacheInfo {
    pub fn usage_percentage(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            (self.size as f64 / self.capacity as f64) * 100.0
        }
    }
}

/// Snapshot of both tiers and the read counters
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub memory: CacheInfo,
    pub durable_entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Hits served from the durable tier and promoted into memory
    pub promotions: u64,
}
