use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable upstream team identifier.
pub type TeamId = i64;

/// A team record as returned by the team search and listing endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: TeamId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default, deserialize_with = "deserialize_league")]
    pub league: Option<String>,
}

impl TeamSummary {
    /// Name shown to users: display name when present, else name.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.name)
    }

    /// Records without a league are accepted for any league.
    pub fn in_league(&self, league: &str) -> bool {
        match &self.league {
            Some(own) => own.eq_ignore_ascii_case(league.trim()),
            None => true,
        }
    }

    /// Case-insensitive equality or substring match, either direction, against the
    /// name, display name or abbreviation.
    pub fn matches_name(&self, candidate: &str) -> bool {
        let candidate = candidate.trim().to_lowercase();
        if candidate.is_empty() {
            return false;
        }
        [
            Some(self.name.as_str()),
            self.display_name.as_deref(),
            self.abbreviation.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(|field| field.trim().to_lowercase())
        .filter(|field| !field.is_empty())
        .any(|field| field == candidate || field.contains(&candidate) || candidate.contains(&field))
    }

    /// Parses a list payload: a bare array or a `{"data": [...]}` wrapper.
    /// Entries that don't parse are skipped.
    pub fn list_from_value(value: &Value) -> Vec<TeamSummary> {
        records(value)
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect()
    }
}

/// The records of a list payload, unwrapping `{"data": [...]}`.
pub fn records(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => items,
            _ => &[],
        },
        _ => &[],
    }
}

/// How a team reference was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Catalog,
    Search,
    Abbreviation,
    Fallback,
}

/// A resolved team reference. Immutable for the lifetime of its cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamIdentity {
    pub input_name: String,
    pub league: String,
    pub resolved_id: TeamId,
    pub display_name: String,
    pub abbreviation: Option<String>,
    pub source: ResolutionSource,
}

impl TeamIdentity {
    pub fn from_summary(
        input_name: &str,
        league: &str,
        team: &TeamSummary,
        source: ResolutionSource,
    ) -> Self {
        Self {
            input_name: input_name.to_string(),
            league: league.to_string(),
            resolved_id: team.id,
            display_name: team.label().to_string(),
            abbreviation: team.abbreviation.clone(),
            source,
        }
    }
}

/// Accepts `123` or `"123"`.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<TeamId, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| de::Error::custom(format!("id {n} is not an integer"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("id '{s}' is not numeric"))),
        other => Err(de::Error::custom(format!("unexpected id value {other}"))),
    }
}

/// Accepts `"NFL"`, `{"name": "NFL"}`, `{"abbreviation": "NFL"}` or null.
fn deserialize_league<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(league_name(&Value::deserialize(deserializer)?))
}

pub(crate) fn league_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(map) => ["name", "abbreviation", "code"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_string_and_numeric_ids() {
        let teams = TeamSummary::list_from_value(&json!({"data": [
            {"id": 4388, "name": "Dallas Cowboys", "abbreviation": "DAL", "league": "NFL"},
            {"id": "4387", "name": "Chicago Bears", "league": {"name": "NFL"}},
            {"id": "abc", "name": "Broken"}
        ]}));
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].id, 4388);
        assert_eq!(teams[1].id, 4387);
        assert_eq!(teams[1].league.as_deref(), Some("NFL"));
    }

    #[test]
    fn test_matches_name_bidirectional_substring() {
        let team = TeamSummary {
            id: 1,
            name: "Dallas Cowboys".to_string(),
            display_name: None,
            abbreviation: Some("DAL".to_string()),
            league: Some("NFL".to_string()),
        };
        assert!(team.matches_name("cowboys"));
        assert!(team.matches_name("The Dallas Cowboys of Texas"));
        assert!(team.matches_name("dal"));
        assert!(!team.matches_name("Eagles"));
        assert!(!team.matches_name("  "));
    }

    #[test]
    fn test_in_league() {
        let mut team = TeamSummary {
            id: 1,
            name: "X".to_string(),
            display_name: None,
            abbreviation: None,
            league: Some("NFL".to_string()),
        };
        assert!(team.in_league("nfl"));
        assert!(!team.in_league("NCAA"));
        team.league = None;
        assert!(team.in_league("NCAA"));
    }

    #[test]
    fn test_label_prefers_display_name() {
        let team = TeamSummary {
            id: 1,
            name: "Cowboys".to_string(),
            display_name: Some("Dallas Cowboys".to_string()),
            abbreviation: None,
            league: None,
        };
        assert_eq!(team.label(), "Dallas Cowboys");
    }
}
