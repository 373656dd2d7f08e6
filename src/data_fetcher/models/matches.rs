use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::team::{TeamId, league_name, records};

/// Reference to one match, as produced by match search and head-to-head listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRef {
    pub match_id: i64,
    pub league: Option<String>,
    /// Raw date string as reported upstream
    pub date: Option<String>,
    pub home_team_id: Option<TeamId>,
    pub away_team_id: Option<TeamId>,
}

impl MatchRef {
    /// Reads a match object. Returns `None` when it has no usable id.
    pub fn from_value(value: &Value) -> Option<Self> {
        let match_id = value.get("id").and_then(as_id)?;
        Some(Self {
            match_id,
            league: value.get("league").and_then(league_name),
            date: value
                .get("date")
                .or_else(|| value.get("startTime"))
                .and_then(Value::as_str)
                .map(str::to_string),
            home_team_id: side_id(value, "homeTeam", "homeTeamId"),
            away_team_id: side_id(value, "awayTeam", "awayTeamId"),
        })
    }

    /// All parseable matches of a list payload (bare array or `data` wrapper).
    pub fn list_from_value(value: &Value) -> Vec<Self> {
        records(value).iter().filter_map(Self::from_value).collect()
    }

    /// Kick-off as a timestamp; RFC 3339 or plain `YYYY-MM-DD`.
    pub fn parsed_date(&self) -> Option<DateTime<Utc>> {
        let raw = self.date.as_deref()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        let day = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.home_team_id == Some(team_id) || self.away_team_id == Some(team_id)
    }

    /// Most recent match by date; undated matches sort before every dated one.
    pub fn latest(matches: &[MatchRef]) -> Option<&MatchRef> {
        matches
            .iter()
            .max_by_key(|m| m.parsed_date().unwrap_or(DateTime::<Utc>::MIN_UTC))
    }
}

fn side_id(value: &Value, nested: &str, flat: &str) -> Option<TeamId> {
    value
        .get(nested)
        .and_then(|team| team.get("id"))
        .and_then(as_id)
        .or_else(|| value.get(flat).and_then(as_id))
}

/// Numeric id from a number or numeric string.
pub(crate) fn as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
