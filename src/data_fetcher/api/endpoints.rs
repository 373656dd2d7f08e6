//! Typed wrappers over the upstream endpoints

use serde_json::Value;
use tracing::debug;

use super::request_client::RequestClient;
use super::urls::{
    HEAD_TO_HEAD_PATH, MATCHES_PATH, TEAMS_PATH, box_score_path, match_detail_path,
    statistics_path, team_statistics_path,
};
use crate::constants::search::TEAM_STATS_TIMEZONE;
use crate::data_fetcher::cache::DataClass;
use crate::data_fetcher::models::{MatchRef, TeamId, TeamSummary, records};
use crate::error::AppError;

/// Filters for the match search endpoint. Unset filters are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchQuery {
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    pub league: Option<String>,
    pub season: Option<i32>,
    pub home_team_id: Option<TeamId>,
    pub away_team_id: Option<TeamId>,
    pub home_abbreviation: Option<String>,
    pub away_abbreviation: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl MatchQuery {
    pub fn on_date(date: impl Into<String>, league: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            league: Some(league.into()),
            ..Self::default()
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let mut push = |name: &'static str, value: Option<String>| {
            if let Some(value) = value {
                params.push((name, value));
            }
        };
        push("date", self.date.clone());
        push("league", self.league.clone());
        push("season", self.season.map(|s| s.to_string()));
        push("homeTeamId", self.home_team_id.map(|id| id.to_string()));
        push("awayTeamId", self.away_team_id.map(|id| id.to_string()));
        push("homeTeamAbbreviation", self.home_abbreviation.clone());
        push("awayTeamAbbreviation", self.away_abbreviation.clone());
        push("limit", self.limit.map(|l| l.to_string()));
        push("offset", self.offset.map(|o| o.to_string()));
        params
    }
}

impl RequestClient {
    /// `GET /teams?name=&league=`
    pub async fn search_teams_by_name(
        &self,
        name: &str,
        league: &str,
    ) -> Result<Vec<TeamSummary>, AppError> {
        let params = [("name", name.to_string()), ("league", league.to_string())];
        let value = self.call(TEAMS_PATH, &params, DataClass::TeamMetadata).await?;
        Ok(TeamSummary::list_from_value(&value))
    }

    /// `GET /teams?abbreviation=&league=`
    pub async fn search_teams_by_abbreviation(
        &self,
        abbreviation: &str,
        league: &str,
    ) -> Result<Vec<TeamSummary>, AppError> {
        let params = [
            ("abbreviation", abbreviation.to_string()),
            ("league", league.to_string()),
        ];
        let value = self.call(TEAMS_PATH, &params, DataClass::TeamMetadata).await?;
        Ok(TeamSummary::list_from_value(&value))
    }

    /// `GET /teams?league=`
    pub async fn list_league_teams(&self, league: &str) -> Result<Vec<TeamSummary>, AppError> {
        let params = [("league", league.to_string())];
        let value = self.call(TEAMS_PATH, &params, DataClass::TeamMetadata).await?;
        Ok(TeamSummary::list_from_value(&value))
    }

    /// `GET /teams?limit=&offset=`
    pub async fn list_teams_page(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TeamSummary>, AppError> {
        let params = [("limit", limit.to_string()), ("offset", offset.to_string())];
        let value = self.call(TEAMS_PATH, &params, DataClass::TeamMetadata).await?;
        Ok(TeamSummary::list_from_value(&value))
    }

    /// `GET /matches` with the given filters.
    pub async fn search_matches(&self, query: &MatchQuery) -> Result<Vec<MatchRef>, AppError> {
        let params = query.params();
        let value = self.call(MATCHES_PATH, &params, DataClass::LiveMatch).await?;
        let matches = MatchRef::list_from_value(&value);
        debug!("Match search {:?} returned {} matches", query, matches.len());
        Ok(matches)
    }

    /// `GET /matches/{id}`, unwrapped to the single match object.
    pub async fn match_detail(&self, match_id: i64) -> Result<Value, AppError> {
        let path = match_detail_path(match_id);
        let value = self.call(&path, &[], DataClass::MatchDetail).await?;
        detail_object(first_object(value), &path)
    }

    /// `GET /statistics/{id}`
    pub async fn match_statistics(&self, match_id: i64) -> Result<Value, AppError> {
        self.call(&statistics_path(match_id), &[], DataClass::Statistics)
            .await
    }

    /// `GET /teams/statistics/{id}?fromDate=&timezone=`
    pub async fn team_statistics(&self, team_id: TeamId, from_date: &str) -> Result<Value, AppError> {
        let params = [
            ("fromDate", from_date.to_string()),
            ("timezone", TEAM_STATS_TIMEZONE.to_string()),
        ];
        self.call(&team_statistics_path(team_id), &params, DataClass::Statistics)
            .await
    }

    /// `GET /box-score/{id}`
    pub async fn box_score(&self, match_id: i64) -> Result<Value, AppError> {
        self.call(&box_score_path(match_id), &[], DataClass::MatchDetail)
            .await
    }

    /// `GET /head-2-head?teamIdOne=&teamIdTwo=`, as a list of match objects.
    pub async fn head_to_head(&self, team_one: TeamId, team_two: TeamId) -> Result<Vec<Value>, AppError> {
        let params = [
            ("teamIdOne", team_one.to_string()),
            ("teamIdTwo", team_two.to_string()),
        ];
        let value = self
            .call(HEAD_TO_HEAD_PATH, &params, DataClass::HeadToHead)
            .await?;
        Ok(records(&value).to_vec())
    }
}

/// Detail responses come as an object, a one-element array, or a `data` wrapper.
fn first_object(value: Value) -> Value {
    match value {
        Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        Value::Object(mut map) if map.len() == 1 && map.contains_key("data") => {
            match map.remove("data") {
                Some(Value::Array(mut items)) if !items.is_empty() => items.swap_remove(0),
                Some(Value::Object(inner)) => Value::Object(inner),
                _ => Value::Null,
            }
        }
        other => other,
    }
}

fn detail_object(value: Value, path: &str) -> Result<Value, AppError> {
    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Err(AppError::api_no_data("match detail is empty", path)),
        Value::Array(items) if items.is_empty() => {
            Err(AppError::api_no_data("match detail is empty", path))
        }
        other => Err(AppError::api_unexpected_structure(
            format!("expected a match object, got {}", kind_of(&other)),
            path,
        )),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
