use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::team::TeamId;

/// Last non-empty head-to-head answer for a team pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadToHeadCacheEntry {
    pub team_pair_key: String,
    pub league: String,
    pub matches: Vec<Value>,
    pub last_good_at: DateTime<Utc>,
}

/// Order-independent key for a pair of teams in a league.
pub fn team_pair_key(league: &str, a: TeamId, b: TeamId) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("h2h:{}:{low}:{high}", league.trim().to_uppercase())
}

/// Outcome of a head-to-head lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadToHeadStatus {
    /// Upstream returned matches on this call
    Fresh,
    /// Upstream returned nothing (or failed); the last-known-good answer was served
    ReusedStale,
    /// Upstream returned nothing on the first call and on the retry
    EmptyTwice,
    /// A hard error, with no last-known-good answer to fall back on
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_order_independent() {
        assert_eq!(team_pair_key("nfl", 7, 3), team_pair_key("NFL", 3, 7));
        assert_eq!(team_pair_key("NFL", 3, 7), "h2h:NFL:3:7");
        assert_ne!(team_pair_key("NFL", 3, 7), team_pair_key("NCAA", 3, 7));
    }
}
