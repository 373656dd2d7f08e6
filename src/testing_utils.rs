use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::data_fetcher::api::{RequestClient, RetryPolicy, create_http_client};
use crate::data_fetcher::cache::{Clock, ManualClock, TieredCache};
use crate::data_fetcher::StatsService;
use crate::data_fetcher::models::TeamId;
use crate::data_fetcher::reconcile::HeadToHeadStore;
use crate::data_fetcher::resolver::{FallbackTable, TeamCatalog};
use crate::error::AppError;

/// Test utilities for creating mock upstream payloads
pub struct TestDataBuilder;

impl TestDataBuilder {
    /// A team record as returned by `/teams`
    pub fn create_team(id: TeamId, name: &str, abbreviation: &str, league: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "displayName": name,
            "abbreviation": abbreviation,
            "league": league,
        })
    }

    /// A match object as listed by `/matches` and `/head-2-head`
    pub fn create_match(id: i64, date: &str, home_id: TeamId, away_id: TeamId) -> Value {
        json!({
            "id": id,
            "date": date,
            "league": {"name": "NFL"},
            "homeTeam": {"id": home_id},
            "awayTeam": {"id": away_id},
        })
    }

    /// One `{displayName, value}` statistic line
    pub fn create_stat(name: &str, value: impl Into<Value>) -> Value {
        json!({"displayName": name, "value": value.into()})
    }

    /// A player line with its statistics
    pub fn create_player(name: &str, stats: Vec<Value>) -> Value {
        json!({"name": name, "statistics": stats})
    }

    /// A minimal `/matches/{id}` detail with scores and both teams
    pub fn create_match_detail(
        id: i64,
        home: (TeamId, &str),
        away: (TeamId, &str),
        home_score: u32,
        away_score: u32,
    ) -> Value {
        json!({
            "id": id,
            "homeTeam": {"id": home.0, "abbreviation": home.1},
            "awayTeam": {"id": away.0, "abbreviation": away.1},
            "homeScore": home_score,
            "awayScore": away_score,
        })
    }

    /// Adds an `overallStatistics` block to a detail payload
    pub fn with_overall_statistics(
        mut detail: Value,
        home_stats: Vec<Value>,
        away_stats: Vec<Value>,
    ) -> Value {
        let home = Self::team_ref(&detail, "homeTeam");
        let away = Self::team_ref(&detail, "awayTeam");
        detail["overallStatistics"] = json!([
            {"team": home, "data": home_stats},
            {"team": away, "data": away_stats},
        ]);
        detail
    }

    /// Adds a `topPerformers` block to a detail payload
    pub fn with_top_performers(
        mut detail: Value,
        home_players: Vec<Value>,
        away_players: Vec<Value>,
    ) -> Value {
        detail["topPerformers"] = json!({"home": home_players, "away": away_players});
        detail
    }

    /// A `/statistics/{id}` payload with named category lines per side
    pub fn create_statistics(home_stats: Vec<Value>, away_stats: Vec<Value>) -> Value {
        json!({
            "homeTeam": {"statistics": home_stats},
            "awayTeam": {"statistics": away_stats},
        })
    }

    /// A `/box-score/{id}` payload with player lines per side
    pub fn create_box_score(home_players: Vec<Value>, away_players: Vec<Value>) -> Value {
        json!({"homeTeam": home_players, "awayTeam": away_players})
    }

    fn team_ref(detail: &Value, side: &str) -> Value {
        detail
            .get(side)
            .and_then(|team| team.get("abbreviation"))
            .map(|abbreviation| json!({"abbreviation": abbreviation}))
            .unwrap_or(Value::Null)
    }
}

/// Builds client and service stacks against a mock upstream
pub struct TestStack;

impl TestStack {
    /// Request client with immediate retries and a memory-only cache driven by `clock`.
    pub fn client(
        base_url: &str,
        clock: Arc<ManualClock>,
        max_attempts: u32,
    ) -> Result<RequestClient, AppError> {
        let cache = Arc::new(TieredCache::new(100, None, clock));
        Self::client_with_cache(base_url, cache, max_attempts)
    }

    /// Request client over an existing cache.
    pub fn client_with_cache(
        base_url: &str,
        cache: Arc<TieredCache>,
        max_attempts: u32,
    ) -> Result<RequestClient, AppError> {
        Ok(RequestClient::new(
            create_http_client("test-key", 5)?,
            base_url,
            cache,
            RetryPolicy::immediate(max_attempts),
        ))
    }

    /// Cache with a durable tier under `dir`.
    pub fn durable_cache(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Arc<TieredCache> {
        Arc::new(TieredCache::new(100, Some(dir.into()), clock))
    }

    /// Full service for league `NFL` with no head-to-head retry pause.
    pub fn service(
        base_url: &str,
        clock: Arc<ManualClock>,
        fallback: &BTreeMap<String, i64>,
    ) -> Result<StatsService, AppError> {
        Self::service_with(
            base_url,
            clock,
            fallback,
            Arc::new(TeamCatalog::new()),
            Arc::new(HeadToHeadStore::default()),
        )
    }

    /// Like [`TestStack::service`], over a caller-provided catalog and head-to-head store.
    pub fn service_with(
        base_url: &str,
        clock: Arc<ManualClock>,
        fallback: &BTreeMap<String, i64>,
        catalog: Arc<TeamCatalog>,
        head_to_head: Arc<HeadToHeadStore>,
    ) -> Result<StatsService, AppError> {
        let client = Self::client(base_url, clock, 2)?;
        Ok(StatsService::new(
            client,
            catalog,
            head_to_head,
            FallbackTable::new(fallback),
            "NFL",
            Duration::ZERO,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_fetcher::models::{MatchRef, TeamSummary};

    #[test]
    fn test_builders_produce_parseable_payloads() {
        let team = TestDataBuilder::create_team(6, "Dallas Cowboys", "DAL", "NFL");
        let parsed = TeamSummary::list_from_value(&json!([team]));
        assert_eq!(parsed[0].id, 6);
        assert!(parsed[0].in_league("nfl"));

        let game = TestDataBuilder::create_match(9, "2024-09-08", 6, 21);
        let parsed = MatchRef::from_value(&game).unwrap();
        assert_eq!(parsed.home_team_id, Some(6));
        assert_eq!(parsed.away_team_id, Some(21));
    }

    #[test]
    fn test_overall_statistics_reference_each_team() {
        let detail = TestDataBuilder::create_match_detail(1, (6, "DAL"), (21, "PHI"), 24, 17);
        let detail = TestDataBuilder::with_overall_statistics(
            detail,
            vec![TestDataBuilder::create_stat("Total Yards", "350")],
            vec![],
        );
        assert_eq!(detail["overallStatistics"][0]["team"]["abbreviation"], "DAL");
        assert_eq!(detail["overallStatistics"][1]["team"]["abbreviation"], "PHI");
    }
}
