use serde_json::json;
use statline::data_fetcher::cache::{DataClass, ManualClock};
use statline::error::{AppError, ErrorKind};
use statline::testing_utils::TestStack;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn params(name: &str) -> Vec<(&'static str, String)> {
    vec![("name", name.to_string()), ("league", "NFL".to_string())]
}

/// Throttling on every attempt stops at the ceiling and reports how many were made
#[tokio::test]
async fn test_rate_limit_exhausts_ceiling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/teams"))
        .respond_with(ResponseTemplate::new(429))
        .expect(4)
        .mount(&server)
        .await;

    let client = TestStack::client(&server.uri(), Arc::new(ManualClock::starting_now()), 4).unwrap();
    let result = client.call("/teams", &params("Cowboys"), DataClass::TeamMetadata).await;

    match result {
        Err(AppError::ApiRateLimit { attempts, .. }) => assert_eq!(attempts, 4),
        other => panic!("expected rate limit error, got {other:?}"),
    }
    let snapshot = client.metrics().snapshot();
    assert_eq!(snapshot.retries, 3);
    assert_eq!(snapshot.failures, 1);
}

/// Retry-After is honoured within the cap and the next attempt succeeds
#[tokio::test]
async fn test_rate_limit_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/teams"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 6, "name": "Dallas Cowboys"}])))
        .mount(&server)
        .await;

    let client = TestStack::client(&server.uri(), Arc::new(ManualClock::starting_now()), 4).unwrap();
    let value = client
        .call("/teams", &params("Cowboys"), DataClass::TeamMetadata)
        .await
        .unwrap();

    assert_eq!(value[0]["id"], 6);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

/// A malformed request is reported at once, without retries
#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/teams"))
        .respond_with(ResponseTemplate::new(400).set_body_string("unknown parameter"))
        .expect(1)
        .mount(&server)
        .await;

    let client = TestStack::client(&server.uri(), Arc::new(ManualClock::starting_now()), 4).unwrap();
    let error = client
        .call("/teams", &params("Cowboys"), DataClass::TeamMetadata)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Validation);
    assert_eq!(error.status(), Some(400));
}

#[tokio::test]
async fn test_not_found_is_validation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/matches/404"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = TestStack::client(&server.uri(), Arc::new(ManualClock::starting_now()), 4).unwrap();
    let error = client.match_detail(404).await.unwrap_err();
    assert!(error.is_not_found());
    assert!(error.is_validation());
}

/// A transient 5xx is retried and the recovered payload is returned
#[tokio::test]
async fn test_server_error_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/statistics/77"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/statistics/77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"homeTeam": {}})))
        .mount(&server)
        .await;

    let client = TestStack::client(&server.uri(), Arc::new(ManualClock::starting_now()), 4).unwrap();
    let value = client.match_statistics(77).await.unwrap();
    assert!(value.get("homeTeam").is_some());
    assert_eq!(client.metrics().snapshot().retries, 1);
}

/// A live cached payload means no network request at all
#[tokio::test]
async fn test_cache_hit_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/teams"))
        .and(query_param("name", "Cowboys"))
        .and(header("x-rapidapi-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 6, "name": "Dallas Cowboys"}])))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::starting_now());
    let client = TestStack::client(&server.uri(), Arc::clone(&clock), 4).unwrap();

    let first = client.search_teams_by_name("Cowboys", "NFL").await.unwrap();
    clock.advance(Duration::from_secs(60));
    let second = client.search_teams_by_name("Cowboys", "NFL").await.unwrap();

    assert_eq!(first, second);
    let snapshot = client.metrics().snapshot();
    assert_eq!(snapshot.cache_hits, 1);
    assert_eq!(snapshot.cache_misses, 1);
}

/// Once the TTL has passed the payload is fetched again
#[tokio::test]
async fn test_expired_entry_is_refetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/matches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "date": "2024-09-08"}])))
        .expect(2)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::starting_now());
    let client = TestStack::client(&server.uri(), Arc::clone(&clock), 4).unwrap();
    let query = statline::data_fetcher::MatchQuery::on_date("2024-09-08", "NFL");

    client.search_matches(&query).await.unwrap();
    clock.advance(DataClass::LiveMatch.ttl() + Duration::from_secs(1));
    let matches = client.search_matches(&query).await.unwrap();
    assert_eq!(matches[0].match_id, 1);
}
