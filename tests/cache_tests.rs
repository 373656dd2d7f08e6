use serde_json::json;
use statline::data_fetcher::cache::{CacheTier, Clock, DataClass, ManualClock, TieredCache};
use statline::testing_utils::TestStack;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::task::JoinSet;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// An entry is served until exactly its TTL and never after
#[tokio::test]
async fn test_entry_lives_for_its_ttl() {
    let clock = Arc::new(ManualClock::starting_now());
    let cache = TieredCache::new(10, None, clock.clone());
    assert!(!cache.has_durable_tier());

    cache.set_with("k", json!({"v": 1}), Duration::from_secs(30), CacheTier::Memory);
    clock.advance(Duration::from_secs(29));
    assert_eq!(cache.get("k").await, Some(json!({"v": 1})));

    clock.advance(Duration::from_secs(1));
    assert_eq!(cache.get("k").await, None);
}

/// Durable entries survive a new cache instance over the same directory
#[tokio::test]
async fn test_durable_entry_survives_restart() {
    let dir = tempdir().unwrap();
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::starting_now());

    let first = TestStack::durable_cache(dir.path(), Arc::clone(&clock));
    first.set("teams_all", json!([{"id": 6, "name": "Dallas Cowboys"}]), DataClass::Catalog);
    first.set("matches?date=2024-09-08", json!([{"id": 1}]), DataClass::LiveMatch);
    first.flush().await;
    drop(first);

    let second = TestStack::durable_cache(dir.path(), Arc::clone(&clock));
    assert!(second.has_durable_tier());
    assert_eq!(second.get("teams_all").await.unwrap()[0]["id"], 6);
    assert_eq!(second.get("matches?date=2024-09-08").await, None);

    let stats = second.stats().await;
    assert_eq!(stats.promotions, 1);
    assert_eq!(stats.memory.size, 1);
}

/// A durable hit is promoted, so the next read comes from memory
#[tokio::test]
async fn test_promotion_happens_once() {
    let dir = tempdir().unwrap();
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::starting_now());

    let writer = TestStack::durable_cache(dir.path(), Arc::clone(&clock));
    writer.set("team:6", json!({"id": 6}), DataClass::TeamMetadata);
    writer.flush().await;

    let reader = TestStack::durable_cache(dir.path(), clock);
    reader.get("team:6").await.unwrap();
    reader.get("team:6").await.unwrap();

    let stats = reader.stats().await;
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.promotions, 1);
}

/// Expired durable entries are neither served nor kept on disk after a sweep
#[tokio::test]
async fn test_expired_durable_entry_is_swept() {
    let dir = tempdir().unwrap();
    let clock = Arc::new(ManualClock::starting_now());
    let cache = TestStack::durable_cache(dir.path(), clock.clone());

    cache.set_with("short", json!(1), Duration::from_secs(5), CacheTier::Durable);
    cache.set("long", json!(2), DataClass::Reconciled);
    cache.flush().await;
    assert_eq!(cache.stats().await.durable_entries, 2);

    clock.advance(Duration::from_secs(6));
    assert_eq!(cache.get("short").await, None);
    assert!(cache.invalidate_expired().await >= 1);
    assert_eq!(cache.stats().await.durable_entries, 1);
    assert_eq!(cache.get("long").await, Some(json!(2)));
}

#[tokio::test]
async fn test_clear_empties_both_tiers() {
    let dir = tempdir().unwrap();
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::starting_now());
    let cache = TestStack::durable_cache(dir.path(), clock);

    cache.set("a", json!(1), DataClass::Catalog);
    cache.set("b", json!(2), DataClass::Statistics);
    cache.clear().await;

    assert_eq!(cache.get("a").await, None);
    assert_eq!(cache.get("b").await, None);
    let stats = cache.stats().await;
    assert_eq!(stats.memory.size, 0);
    assert_eq!(stats.durable_entries, 0);
}

/// An unwritable durable directory leaves entries memory-resident and never fails a read
#[tokio::test]
async fn test_failed_durable_write_keeps_memory_copy() {
    let dir = tempdir().unwrap();
    let blocked = dir.path().join("not-a-dir");
    std::fs::write(&blocked, "occupied").unwrap();
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::starting_now());
    let cache = TestStack::durable_cache(&blocked, clock);

    cache.set("teams_all", json!([{"id": 6}]), DataClass::Catalog);
    cache.flush().await;

    assert_eq!(cache.get("teams_all").await, Some(json!([{"id": 6}])));
    let stats = cache.stats().await;
    assert_eq!(stats.memory.size, 1);
    assert_eq!(stats.durable_entries, 0);
    assert!(blocked.is_file());
}

/// Requests succeed and are cached even when the durable tier cannot be written
#[tokio::test]
async fn test_request_survives_durable_write_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/teams"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": 6, "name": "Dallas Cowboys"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let blocked = dir.path().join("cache-file");
    std::fs::write(&blocked, "").unwrap();
    let cache = TestStack::durable_cache(&blocked, Arc::new(ManualClock::starting_now()));
    let client = TestStack::client_with_cache(&server.uri(), Arc::clone(&cache), 2).unwrap();

    let first = client.search_teams_by_name("Cowboys", "NFL").await.unwrap();
    cache.flush().await;
    let second = client.search_teams_by_name("Cowboys", "NFL").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first[0].id, 6);
}

/// Concurrent writers on distinct keys lose nothing; on a shared key the last write wins
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_memory_access() {
    let cache = Arc::new(TieredCache::new(
        1_000,
        None,
        Arc::new(ManualClock::starting_now()),
    ));

    let mut tasks = JoinSet::new();
    for i in 0..64u64 {
        let cache = Arc::clone(&cache);
        tasks.spawn(async move {
            let own = format!("team:{i}");
            cache.set(&own, json!(i), DataClass::TeamMetadata);
            cache.set("shared", json!(i), DataClass::MatchDetail);
            assert_eq!(cache.get(&own).await, Some(json!(i)));
            let shared = cache.get("shared").await.and_then(|v| v.as_u64());
            assert!(shared.is_some_and(|v| v < 64));
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap();
    }

    for i in 0..64u64 {
        assert_eq!(cache.get(&format!("team:{i}")).await, Some(json!(i)));
    }
    assert_eq!(cache.stats().await.memory.size, 65);

    cache.set("shared", json!("final"), DataClass::MatchDetail);
    assert_eq!(cache.get("shared").await, Some(json!("final")));
}
