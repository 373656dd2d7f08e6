//! The four statistics sources, in preference order
//!
//! Every source reads whatever payloads were fetched and reports the fields it
//! could find for each side. None of them decides what wins; that is left to
//! [`StatRecord::merge_partial`](crate::data_fetcher::models::StatRecord::merge_partial).

use serde_json::Value;
use std::fmt::Debug;

use super::payload::{
    completion_pct, first, first_number, named_entries, number, ratio, scores, side,
};
use crate::data_fetcher::models::matches::as_id;
use crate::data_fetcher::models::{PartialStats, StatField};

/// Payloads available to the sources for one match. Any of them may be missing.
#[derive(Debug, Clone, Default)]
pub struct SourceInputs {
    /// `/matches/{id}`
    pub detail: Option<Value>,
    /// `/statistics/{id}`
    pub statistics: Option<Value>,
    /// `/box-score/{id}`
    pub box_score: Option<Value>,
}

/// Home and away contributions.
pub type SidePair = (PartialStats, PartialStats);

pub trait StatSource: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// `None` when the source found nothing for either side.
    fn extract(&self, inputs: &SourceInputs) -> Option<SidePair>;
}

/// Summary, category sums, box score, top performers.
pub fn default_sources() -> Vec<Box<dyn StatSource>> {
    vec![
        Box::new(SummarySource),
        Box::new(CategorySource),
        Box::new(BoxScoreSource),
        Box::new(TopPerformersSource),
    ]
}

fn non_empty(pair: SidePair) -> Option<SidePair> {
    (!pair.0.is_empty() || !pair.1.is_empty()).then_some(pair)
}

/// Scores and the per-team `overallStatistics` block of the match detail,
/// falling back to a `statistics` object on the team itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummarySource;

impl StatSource for SummarySource {
    fn name(&self) -> &'static str {
        "summary"
    }

    fn extract(&self, inputs: &SourceInputs) -> Option<SidePair> {
        let detail = inputs.detail.as_ref()?;
        let (home_score, away_score) = scores(detail);
        let mut pair = (PartialStats::new(), PartialStats::new());
        pair.0.set_opt(StatField::Points, home_score);
        pair.1.set_opt(StatField::Points, away_score);

        for (home, partial) in [(true, &mut pair.0), (false, &mut pair.1)] {
            let team = side(detail, home);
            let overall = team.and_then(|team| overall_entry(detail, team));
            match overall {
                Some(entry) => summary_entries(entry, partial),
                None => {
                    let totals = team.and_then(|t| first(t, &["statistics", "stats", "totals"]));
                    if let Some(totals) = totals {
                        team_totals(totals, partial);
                    }
                }
            }
        }
        non_empty(pair)
    }
}

/// The `overallStatistics` entry whose team matches `team` by id, abbreviation or name.
fn overall_entry<'a>(detail: &'a Value, team: &Value) -> Option<&'a Value> {
    let entries = detail.get("overallStatistics")?.as_array()?;
    let id = team.get("id").and_then(as_id);
    let abbreviation = team.get("abbreviation").and_then(Value::as_str);
    let name = first(team, &["displayName", "name"]).and_then(Value::as_str);

    entries.iter().find(|entry| {
        let Some(other) = entry.get("team") else {
            return false;
        };
        let same_id = id.is_some() && other.get("id").and_then(as_id) == id;
        let same = |key: &str, own: Option<&str>| {
            own.zip(other.get(key).and_then(Value::as_str))
                .is_some_and(|(a, b)| a.eq_ignore_ascii_case(b))
        };
        same_id
            || same("abbreviation", abbreviation)
            || same("displayName", name)
            || same("name", name)
    })
}

fn summary_entries(entry: &Value, partial: &mut PartialStats) {
    for (name, value) in named_entries(entry) {
        if name.contains("total yards") {
            partial.set_opt(StatField::Yards, number(value));
        } else if name.contains("comp") && name.contains("att") {
            if let Some((made, attempted)) = ratio(value) {
                partial.set(StatField::Attempts, attempted);
                partial.set_opt(StatField::CompletionPct, completion_pct(made, attempted));
            }
        } else if name.contains("sack") {
            partial.set_opt(StatField::Sacks, number(value));
        } else if name.contains("touchdown") {
            if let Some(tds) = number(value) {
                partial.add(StatField::Touchdowns, tds);
            }
        }
    }
}

fn team_totals(totals: &Value, partial: &mut PartialStats) {
    partial.set_opt(StatField::Yards, first_number(totals, &["yards", "totalYards"]));
    partial.set_opt(
        StatField::CompletionPct,
        first_number(totals, &["completionPct", "completion_pct"]),
    );
    partial.set_opt(StatField::Touchdowns, first_number(totals, &["touchdowns", "tds"]));
    partial.set_opt(StatField::Attempts, first_number(totals, &["attempts"]));
    partial.set_opt(StatField::Sacks, first_number(totals, &["sacks"]));
}

/// Per-category team statistics: `/statistics/{id}`, else the detail's
/// `matchStatistics`. Touchdowns are the sum of passing, rushing and
/// defensive/special-teams scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategorySource;

impl StatSource for CategorySource {
    fn name(&self) -> &'static str {
        "category"
    }

    fn extract(&self, inputs: &SourceInputs) -> Option<SidePair> {
        let payload = inputs
            .statistics
            .as_ref()
            .filter(|stats| side(stats, true).is_some() || side(stats, false).is_some())
            .or_else(|| inputs.detail.as_ref().and_then(|d| d.get("matchStatistics")))?;

        let mut pair = (PartialStats::new(), PartialStats::new());
        for (home, partial) in [(true, &mut pair.0), (false, &mut pair.1)] {
            if let Some(node) = side(payload, home) {
                category_node(node, partial);
            }
        }
        non_empty(pair)
    }
}

fn category_node(node: &Value, partial: &mut PartialStats) {
    let entries = named_entries(node);
    if entries.is_empty() {
        nested_categories(node, partial);
        return;
    }

    let mut total_yards = None;
    let mut split_yards = None;
    for (name, value) in entries {
        if is_touchdown_name(&name) {
            if !name.contains("receiving")
                && let Some(tds) = number(value)
            {
                partial.add(StatField::Touchdowns, tds);
            }
        } else if name.contains("total yards") {
            total_yards = number(value);
        } else if (name.contains("passing yards") || name.contains("rushing yards"))
            && !is_rate_name(&name)
        {
            *split_yards.get_or_insert(0.0) += number(value).unwrap_or(0.0);
        } else if name.contains("comp") && name.contains("att") {
            if let Some((made, attempted)) = ratio(value) {
                partial.set(StatField::Attempts, attempted);
                partial.set_opt(StatField::CompletionPct, completion_pct(made, attempted));
            }
        } else if name.contains("completion") {
            partial.set_opt(StatField::CompletionPct, number(value));
        } else if name.contains("sack") {
            partial.set_opt(StatField::Sacks, number(value));
        }
    }
    partial.set_opt(StatField::Yards, total_yards.or(split_yards));
}

/// `{"passing": {...}, "rushing": {...}, "defense": {...}}`
fn nested_categories(node: &Value, partial: &mut PartialStats) {
    let Some(categories) = node.as_object() else {
        return;
    };
    let mut yards = None;
    for (category, stats) in categories {
        let category = category.to_lowercase();
        if !stats.is_object() || category.contains("receiving") {
            continue;
        }
        if let Some(tds) = first_number(stats, &["touchdowns", "tds"]) {
            partial.add(StatField::Touchdowns, tds);
        }
        if category.contains("passing") || category.contains("rushing") {
            if let Some(value) = first_number(stats, &["yards", "netYards"]) {
                *yards.get_or_insert(0.0) += value;
            }
        }
        if category.contains("passing") {
            let made = first_number(stats, &["completions", "completed"]);
            let attempted = first_number(stats, &["attempts", "attempted"]);
            partial.set_opt(StatField::Attempts, attempted);
            partial.set_opt(
                StatField::CompletionPct,
                first_number(stats, &["completionPct", "completion_pct"])
                    .or_else(|| made.zip(attempted).and_then(|(m, a)| completion_pct(m, a))),
            );
            partial.set_opt(StatField::Sacks, first_number(stats, &["sacks", "timesSacked"]));
        }
    }
    partial.set_opt(StatField::Yards, yards);
}

fn is_touchdown_name(name: &str) -> bool {
    name.contains("touchdown") || name == "tds" || name.ends_with(" tds") || name.ends_with(" td")
}

fn is_rate_name(name: &str) -> bool {
    ["per", "avg", "average", "long"].iter().any(|word| name.contains(word))
}

/// Player-level box score: `/box-score/{id}`, else the detail's `boxScores`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxScoreSource;

impl StatSource for BoxScoreSource {
    fn name(&self) -> &'static str {
        "box_score"
    }

    fn extract(&self, inputs: &SourceInputs) -> Option<SidePair> {
        let payload = inputs
            .box_score
            .as_ref()
            .filter(|box_score| side(box_score, true).is_some() || side(box_score, false).is_some())
            .or_else(|| {
                inputs
                    .detail
                    .as_ref()
                    .and_then(|d| first(d, &["boxScores", "boxscores"]))
            })?;
        player_pair(payload)
    }
}

/// Leading players per side from the detail's `topPerformers`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopPerformersSource;

impl StatSource for TopPerformersSource {
    fn name(&self) -> &'static str {
        "top_performers"
    }

    fn extract(&self, inputs: &SourceInputs) -> Option<SidePair> {
        let payload = inputs.detail.as_ref()?.get("topPerformers")?;
        player_pair(payload)
    }
}

fn player_pair(payload: &Value) -> Option<SidePair> {
    let home = side(payload, true).map(player_totals).unwrap_or_default();
    let away = side(payload, false).map(player_totals).unwrap_or_default();
    non_empty((home, away))
}

/// Sums a side's player lines.
///
/// Touchdowns count rushing, receiving and return/defensive scores; a passing
/// touchdown is the same score as its receiving touchdown and is not added.
/// Yards are rushing plus receiving. Completion, attempts and sacks take the
/// largest single-player value (the quarterback's line).
fn player_totals(players: &Value) -> PartialStats {
    let mut partial = PartialStats::new();
    let Some(players) = players.as_array() else {
        return partial;
    };

    for player in players {
        for (name, value) in named_entries(player) {
            if is_touchdown_name(&name) {
                if !name.contains("passing")
                    && let Some(tds) = number(value)
                {
                    partial.add(StatField::Touchdowns, tds);
                }
            } else if (name.contains("rushing yards") || name.contains("receiving yards"))
                && !is_rate_name(&name)
            {
                if let Some(yards) = number(value) {
                    partial.add(StatField::Yards, yards);
                }
            } else if name.contains("comp") && name.contains("att") {
                if let Some((made, attempted)) = ratio(value) {
                    keep_max(&mut partial, StatField::Attempts, Some(attempted));
                    keep_max(&mut partial, StatField::CompletionPct, completion_pct(made, attempted));
                }
            } else if name.contains("completion") {
                keep_max(&mut partial, StatField::CompletionPct, number(value));
            } else if name.contains("passing attempts") || name == "attempts" {
                keep_max(&mut partial, StatField::Attempts, number(value));
            } else if name.contains("sack") {
                keep_max(&mut partial, StatField::Sacks, number(value));
            }
        }
    }
    partial
}

fn keep_max(partial: &mut PartialStats, field: StatField, candidate: Option<f64>) {
    if let Some(candidate) = candidate
        && partial.get(field).is_none_or(|current| candidate > current)
    {
        partial.set(field, candidate);
    }
}
