//! File-backed cache tier. One JSON record per key, surviving restarts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, instrument, warn};

use super::types::{CacheEntry, CacheTier};
use crate::error::AppError;

/// On-disk shape of a durable entry.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DurableRecord {
    expires_at: DateTime<Utc>,
    value: Value,
}

#[derive(Debug, Clone)]
pub struct DurableTier {
    dir: PathBuf,
}

impl DurableTier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_stem: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_stem}.json"))
    }

    /// Reads a live record. Expired or unreadable records are removed and reported absent.
    #[instrument(skip(self, now))]
    pub async fn load(&self, key: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        let path = self.path_for(key);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read durable cache file {}: {}", path.display(), e);
                return None;
            }
        };

        let record: DurableRecord = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    "Discarding corrupt durable cache file {}: {}",
                    path.display(),
                    e
                );
                let _ = fs::remove_file(&path).await;
                return None;
            }
        };

        if now >= record.expires_at {
            debug!("Removing expired durable cache file {}", path.display());
            let _ = fs::remove_file(&path).await;
            return None;
        }

        Some(CacheEntry {
            key: key.to_string(),
            value: record.value,
            expires_at: record.expires_at,
            tier: CacheTier::Durable,
        })
    }

    /// Writes a record atomically (temp file then rename).
    #[instrument(skip(self, entry), fields(key = %entry.key))]
    pub async fn store(&self, entry: &CacheEntry) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir).await?;
        let record = DurableRecord {
            expires_at: entry.expires_at,
            value: entry.value.clone(),
        };
        let body = serde_json::to_vec(&record)?;

        let path = self.path_for(&entry.key);
        let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));
        fs::write(&tmp, body).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!("Stored durable cache file {}", path.display());
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<(), AppError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes expired and corrupt records; returns how many files were deleted.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let mut removed = 0;
        for path in self.record_paths().await? {
            let live = match fs::read_to_string(&path).await {
                Ok(content) => serde_json::from_str::<DurableRecord>(&content)
                    .map(|record| now < record.expires_at)
                    .unwrap_or(false),
                Err(_) => continue,
            };
            if !live && fs::remove_file(&path).await.is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub async fn clear(&self) -> Result<usize, AppError> {
        let mut removed = 0;
        for path in self.record_paths().await? {
            if fs::remove_file(&path).await.is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub async fn entry_count(&self) -> usize {
        self.record_paths().await.map(|paths| paths.len()).unwrap_or(0)
    }

    async fn record_paths(&self) -> Result<Vec<PathBuf>, AppError> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut paths = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use serde_json::json;
    use std::time::Duration;
    use tempfile::tempdir;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 8, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let dir = tempdir().unwrap();
        let tier = DurableTier::new(dir.path());
        let entry = CacheEntry::new(
            "teams_all",
            json!([{"id": 1}]),
            Duration::from_secs(60),
            CacheTier::Durable,
            t0(),
        );
        tier.store(&entry).await.unwrap();

        let loaded = tier.load("teams_all", t0()).await.unwrap();
        assert_eq!(loaded.value, json!([{"id": 1}]));
        assert_eq!(loaded.expires_at, entry.expires_at);
        assert_eq!(tier.entry_count().await, 1);
    }

    #[tokio::test]
    async fn test_record_uses_expires_at_and_value_fields() {
        let dir = tempdir().unwrap();
        let tier = DurableTier::new(dir.path());
        let entry = CacheEntry::new("k", json!(7), Duration::from_secs(60), CacheTier::Durable, t0());
        tier.store(&entry).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("k.json")).unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["value"], json!(7));
        assert!(parsed.get("expiresAt").is_some());
    }

    #[tokio::test]
    async fn test_expired_record_is_removed_on_load() {
        let dir = tempdir().unwrap();
        let tier = DurableTier::new(dir.path());
        let entry = CacheEntry::new("k", json!(1), Duration::from_secs(10), CacheTier::Durable, t0());
        tier.store(&entry).await.unwrap();

        assert!(tier.load("k", t0() + TimeDelta::seconds(10)).await.is_none());
        assert_eq!(tier.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_discarded() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let tier = DurableTier::new(dir.path());

        assert!(tier.load("bad", t0()).await.is_none());
        assert!(!dir.path().join("bad.json").exists());
    }

    #[tokio::test]
    async fn test_sweep_expired_keeps_live_records() {
        let dir = tempdir().unwrap();
        let tier = DurableTier::new(dir.path());
        for (key, ttl) in [("a", 5), ("b", 5), ("c", 500)] {
            let entry =
                CacheEntry::new(key, json!(key), Duration::from_secs(ttl), CacheTier::Durable, t0());
            tier.store(&entry).await.unwrap();
        }

        let removed = tier.sweep_expired(t0() + TimeDelta::seconds(60)).await.unwrap();
        assert_eq!(removed, 2);
        assert!(tier.load("c", t0() + TimeDelta::seconds(60)).await.is_some());
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let tier = DurableTier::new(dir.path().join("not-created"));
        assert_eq!(tier.entry_count().await, 0);
        assert!(tier.load("x", t0()).await.is_none());
        assert_eq!(tier.clear().await.unwrap(), 0);
    }
}
