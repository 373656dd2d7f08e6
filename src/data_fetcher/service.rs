//! Entry points used by the CLI and by embedding code

use chrono::{NaiveDate, TimeDelta};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::api::{MatchQuery, RequestClient};
use super::cache::{CacheStats, DataClass, SystemClock, TieredCache};
use super::models::{MatchRef, TeamId, TeamIdentity};
use super::reconcile::{HeadToHeadReport, HeadToHeadStore, Reconciled, ReconciliationEngine};
use super::resolver::{FallbackTable, TeamCatalog, TeamResolver};
use crate::config::Config;
use crate::constants::{capacity, search};
use crate::constants::search::TEAM_STATS_LOOKBACK_DAYS;
use crate::error::AppError;
use crate::performance::MetricsSnapshot;

/// Cache and request counters, as printed by `cache-stats`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub cache: CacheStats,
    pub requests: MetricsSnapshot,
    pub cache_hit_rate: f64,
    pub catalog_teams: usize,
    pub head_to_head_pairs: usize,
}

/// Season statistics of one team as returned upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamStatisticsReport {
    pub team_id: TeamId,
    /// `None` when the caller passed a numeric id.
    pub team: Option<TeamIdentity>,
    pub from_date: String,
    pub statistics: Value,
}

/// Owns one cache, one request client, one resolver and one engine, all
/// sharing the same handles.
#[derive(Debug)]
pub struct StatsService {
    client: RequestClient,
    resolver: Arc<TeamResolver>,
    engine: ReconciliationEngine,
    league: String,
}

impl StatsService {
    /// Wires the resolver and engine over shared handles. The catalog and the
    /// last-known-good head-to-head store are owned by the caller.
    pub fn new(
        client: RequestClient,
        catalog: Arc<TeamCatalog>,
        head_to_head: Arc<HeadToHeadStore>,
        fallback: FallbackTable,
        league: impl Into<String>,
        head_to_head_retry_delay: Duration,
    ) -> Self {
        let resolver = Arc::new(TeamResolver::new(client.clone(), catalog, fallback));
        let engine = ReconciliationEngine::new(
            client.clone(),
            Arc::clone(&resolver),
            head_to_head,
            head_to_head_retry_delay,
        );
        Self {
            client,
            resolver,
            engine,
            league: league.into(),
        }
    }

    /// Builds the full stack from configuration, with the durable tier under
    /// the configured cache directory.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let cache = Arc::new(TieredCache::new(
            capacity::MEMORY_TIER_ENTRIES,
            Some(config.resolved_cache_dir()),
            Arc::new(SystemClock),
        ));
        let client = RequestClient::from_config(config, cache)?;
        Ok(Self::new(
            client,
            Arc::new(TeamCatalog::new()),
            Arc::new(HeadToHeadStore::default()),
            FallbackTable::new(&config.fallback_team_ids),
            config.league.clone(),
            Duration::from_millis(config.head_to_head_retry_delay_ms),
        ))
    }

    pub fn default_league(&self) -> &str {
        &self.league
    }

    pub fn cache(&self) -> &Arc<TieredCache> {
        self.client.cache()
    }

    pub fn resolver(&self) -> &Arc<TeamResolver> {
        &self.resolver
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    fn league_or_default<'a>(&'a self, league: Option<&'a str>) -> &'a str {
        league
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(self.league.as_str())
    }

    /// Resolves a team name, falling back to the static table.
    pub async fn resolve_team(
        &self,
        name: &str,
        league: Option<&str>,
    ) -> Result<TeamIdentity, AppError> {
        let league = self.league_or_default(league);
        self.resolver.resolve_or_fallback(name, league).await
    }

    pub async fn get_match_statistics(&self, match_id: i64) -> Reconciled {
        self.engine.get_team_statistics(match_id).await
    }

    pub async fn get_head_to_head(
        &self,
        team_a: &str,
        team_b: &str,
        league: Option<&str>,
    ) -> Result<HeadToHeadReport, AppError> {
        let league = self.league_or_default(league);
        self.engine.get_head_to_head(team_a, team_b, league).await
    }

    /// Startup warm-up: sweeps expired cache entries and loads the team
    /// catalog. Returns the number of catalog teams; never fails.
    #[instrument(skip(self))]
    pub async fn warm_cache(&self, league: Option<&str>) -> usize {
        let league = self.league_or_default(league);
        let swept = self.cache().invalidate_expired().await;
        debug!("Warm-up swept {} expired entries", swept);
        let teams = self.resolver.catalog().warm(&self.client, league).await;
        info!("Cache warm-up complete: {} teams in catalog", teams);
        teams
    }

    /// Season statistics for a team name or a numeric team id.
    ///
    /// A purely numeric `team` is used as the upstream id without resolution.
    /// `from_date` (`YYYY-MM-DD`) defaults to 30 days before today.
    #[instrument(skip(self))]
    pub async fn team_statistics(
        &self,
        team: &str,
        league: Option<&str>,
        from_date: Option<&str>,
    ) -> Result<TeamStatisticsReport, AppError> {
        let league = self.league_or_default(league);
        let from_date = match from_date {
            Some(date) => parse_day(date)?,
            None => {
                self.cache().now().date_naive() - TimeDelta::days(TEAM_STATS_LOOKBACK_DAYS)
            }
        };

        let (team_id, identity) = match team.trim().parse::<TeamId>() {
            Ok(id) => (id, None),
            Err(_) => {
                let identity = self.resolver.resolve_or_fallback(team, league).await?;
                (identity.resolved_id, Some(identity))
            }
        };

        let from_date = from_date.to_string();
        let statistics = self.client.team_statistics(team_id, &from_date).await?;
        debug!("Team {} statistics since {} fetched", team_id, from_date);
        Ok(TeamStatisticsReport {
            team_id,
            team: identity,
            from_date,
            statistics,
        })
    }

    /// Finds the match between two teams on `date` (`YYYY-MM-DD`), trying the
    /// home/away order given and then the swapped order.
    #[instrument(skip(self))]
    pub async fn find_match(
        &self,
        date: &str,
        league: Option<&str>,
        home: &str,
        away: &str,
    ) -> Result<Option<MatchRef>, AppError> {
        let league = self.league_or_default(league);
        let day = parse_day(date)?;
        let (home, away) = futures::future::join(
            self.resolver.resolve_or_fallback(home, league),
            self.resolver.resolve_or_fallback(away, league),
        )
        .await;
        let (home_id, away_id) = (home?.resolved_id, away?.resolved_id);

        let key = format!("match_ref:{day}:{}:{home_id}:{away_id}", league.to_uppercase());
        if let Some(found) = self.cache().get_as::<MatchRef>(&key).await {
            debug!("Match lookup cache hit: {}", found.match_id);
            return Ok(Some(found));
        }

        for (first, second) in [(home_id, away_id), (away_id, home_id)] {
            let query = MatchQuery {
                home_team_id: Some(first),
                away_team_id: Some(second),
                ..MatchQuery::on_date(day.to_string(), league)
            };
            let found = self
                .client
                .search_matches(&query)
                .await?
                .into_iter()
                .find(|m| is_pairing(m, first, second));
            if let Some(found) = found {
                info!("Found match {} for {} vs {} on {}", found.match_id, home_id, away_id, day);
                self.cache().set_as(&key, &found, DataClass::MatchDetail);
                return Ok(Some(found));
            }
            debug!("No match with home={} away={} on {}", first, second, day);
        }
        Ok(None)
    }

    /// Walks back one day at a time over the last `days_back` days, today
    /// included, and returns the matches of the first day on which the team
    /// played. Days whose search fails are skipped.
    #[instrument(skip(self))]
    pub async fn recent_matches(
        &self,
        team: &str,
        league: Option<&str>,
        days_back: u32,
    ) -> Result<Vec<MatchRef>, AppError> {
        let league = self.league_or_default(league);
        let team_id = self.resolver.resolve_or_fallback(team, league).await?.resolved_id;
        let today = self.cache().now().date_naive();

        for offset in 0..days_back.min(search::MAX_DAYS_BACK) {
            let day = today - TimeDelta::days(i64::from(offset));
            let query = MatchQuery::on_date(day.to_string(), league);
            let matches = match self.client.search_matches(&query).await {
                Ok(matches) => matches,
                Err(e) if e.is_validation() => {
                    debug!("Match search for {} rejected: {}", day, e);
                    continue;
                }
                Err(e) => {
                    warn!("Match search for {} failed, skipping the day: {}", day, e);
                    continue;
                }
            };
            let mut played: Vec<MatchRef> =
                matches.into_iter().filter(|m| m.involves(team_id)).collect();
            if !played.is_empty() {
                played.sort_by_key(|m| std::cmp::Reverse(m.parsed_date()));
                info!("Team {} last played on {} ({} match(es))", team_id, day, played.len());
                return Ok(played);
            }
        }
        warn!("No matches for team {} in the last {} days", team_id, days_back);
        Ok(Vec::new())
    }

    pub async fn stats(&self) -> ServiceStats {
        let requests = self.client.metrics().snapshot();
        ServiceStats {
            cache: self.cache().stats().await,
            cache_hit_rate: requests.cache_hit_rate(),
            requests,
            catalog_teams: self.resolver.catalog().len(),
            head_to_head_pairs: self.engine.head_to_head_store().len(),
        }
    }

    /// Empties both cache tiers and every in-process memo.
    pub async fn clear_cache(&self) {
        self.cache().clear().await;
        self.resolver.forget_all();
        self.engine.head_to_head_store().clear();
    }

    /// Waits for pending durable cache writes.
    pub async fn shutdown(&self) {
        self.cache().flush().await;
    }
}

fn parse_day(date: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::invalid_input(format!("date '{date}' is not YYYY-MM-DD")))
}

/// Upstream filters are advisory; the listed teams must actually be the pair.
fn is_pairing(found: &MatchRef, home: TeamId, away: TeamId) -> bool {
    match (found.home_team_id, found.away_team_id) {
        (Some(h), Some(a)) => h == home && a == away,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_ref(home: Option<TeamId>, away: Option<TeamId>) -> MatchRef {
        MatchRef {
            match_id: 1,
            league: None,
            date: None,
            home_team_id: home,
            away_team_id: away,
        }
    }

    #[test]
    fn test_parse_day() {
        assert_eq!(
            parse_day(" 2024-09-08 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 9, 8).unwrap()
        );
        assert!(parse_day("09/08/2024").unwrap_err().is_validation());
    }

    #[test]
    fn test_is_pairing() {
        assert!(is_pairing(&match_ref(Some(1), Some(2)), 1, 2));
        assert!(!is_pairing(&match_ref(Some(2), Some(1)), 1, 2));
        assert!(is_pairing(&match_ref(None, None), 1, 2));
    }
}
