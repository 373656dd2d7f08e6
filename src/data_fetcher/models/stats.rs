//! Canonical per-team statistics and the field merge rule

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One statistic of a [`StatRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
    Points,
    Yards,
    CompletionPct,
    Touchdowns,
    Attempts,
    Sacks,
}

impl StatField {
    pub const ALL: [StatField; 6] = [
        StatField::Points,
        StatField::Yards,
        StatField::CompletionPct,
        StatField::Touchdowns,
        StatField::Attempts,
        StatField::Sacks,
    ];
}

impl fmt::Display for StatField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatField::Points => "points",
            StatField::Yards => "yards",
            StatField::CompletionPct => "completion_pct",
            StatField::Touchdowns => "touchdowns",
            StatField::Attempts => "attempts",
            StatField::Sacks => "sacks",
        };
        f.write_str(name)
    }
}

/// Decides whether `candidate` replaces `current` for `field`.
///
/// A zero (or negative, or non-finite) candidate never replaces anything. A
/// default current value is always filled. Touchdowns additionally take any
/// strictly greater candidate, since some payload shapes under-report them.
pub fn contribute(field: StatField, current: f64, candidate: f64) -> Option<f64> {
    if !candidate.is_finite() || candidate <= 0.0 {
        return None;
    }
    if current == 0.0 {
        return Some(candidate);
    }
    if field == StatField::Touchdowns && candidate > current {
        return Some(candidate);
    }
    None
}

/// Canonical statistics for one team in one match. Zero means "not yet known".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    pub points: u32,
    pub yards: u32,
    pub completion_pct: f64,
    pub touchdowns: u32,
    pub attempts: u32,
    pub sacks: u32,
}

impl StatRecord {
    pub fn get(&self, field: StatField) -> f64 {
        match field {
            StatField::Points => f64::from(self.points),
            StatField::Yards => f64::from(self.yards),
            StatField::CompletionPct => self.completion_pct,
            StatField::Touchdowns => f64::from(self.touchdowns),
            StatField::Attempts => f64::from(self.attempts),
            StatField::Sacks => f64::from(self.sacks),
        }
    }

    fn set(&mut self, field: StatField, value: f64) {
        let count = value.round().clamp(0.0, f64::from(u32::MAX)) as u32;
        match field {
            StatField::Points => self.points = count,
            StatField::Yards => self.yards = count,
            StatField::CompletionPct => self.completion_pct = (value * 10.0).round() / 10.0,
            StatField::Touchdowns => self.touchdowns = count,
            StatField::Attempts => self.attempts = count,
            StatField::Sacks => self.sacks = count,
        }
    }

    /// Offers one candidate value; returns whether the field changed.
    pub fn offer(&mut self, field: StatField, candidate: f64) -> bool {
        match contribute(field, self.get(field), candidate) {
            Some(value) => {
                let before = self.get(field);
                self.set(field, value);
                self.get(field) != before
            }
            None => false,
        }
    }

    /// Applies every value of a partial contribution. Returns the fields that changed.
    pub fn merge_partial(&mut self, partial: &PartialStats) -> Vec<StatField> {
        partial
            .iter()
            .filter(|(field, value)| self.offer(*field, *value))
            .map(|(field, _)| field)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        StatField::ALL.iter().all(|field| self.get(*field) == 0.0)
    }

    /// True when no field of `self` holds less than the same field of `earlier`.
    pub fn dominates(&self, earlier: &StatRecord) -> bool {
        StatField::ALL
            .iter()
            .all(|field| earlier.get(*field) == 0.0 || self.get(*field) != 0.0)
            && self.touchdowns >= earlier.touchdowns
    }
}

/// Values one source could extract for one team. Absent fields were not found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialStats {
    values: BTreeMap<StatField, f64>,
}

impl PartialStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: StatField, value: f64) {
        if value.is_finite() {
            self.values.insert(field, value);
        }
    }

    pub fn set_opt(&mut self, field: StatField, value: Option<f64>) {
        if let Some(value) = value {
            self.set(field, value);
        }
    }

    /// Adds to a field, starting from zero.
    pub fn add(&mut self, field: StatField, value: f64) {
        if value.is_finite() {
            *self.values.entry(field).or_insert(0.0) += value;
        }
    }

    pub fn get(&self, field: StatField) -> Option<f64> {
        self.values.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatField, f64)> + '_ {
        self.values.iter().map(|(field, value)| (*field, *value))
    }

    pub fn fields(&self) -> Vec<StatField> {
        self.values.keys().copied().collect()
    }
}

/// Every non-zero field of a record, as candidates for another merge.
impl From<StatRecord> for PartialStats {
    fn from(record: StatRecord) -> Self {
        let mut partial = PartialStats::new();
        for field in StatField::ALL {
            let value = record.get(field);
            if value != 0.0 {
                partial.set(field, value);
            }
        }
        partial
    }
}

/// Home and away records for one match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamStatistics {
    pub home: StatRecord,
    pub away: StatRecord,
}

impl TeamStatistics {
    pub fn is_empty(&self) -> bool {
        self.home.is_empty() && self.away.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_candidate_never_replaces() {
        assert_eq!(contribute(StatField::Yards, 350.0, 0.0), None);
        assert_eq!(contribute(StatField::Touchdowns, 2.0, 0.0), None);
        assert_eq!(contribute(StatField::Yards, 0.0, 0.0), None);
        assert_eq!(contribute(StatField::Yards, 0.0, -3.0), None);
        assert_eq!(contribute(StatField::Yards, 0.0, f64::NAN), None);
    }

    #[test]
    fn test_default_is_filled_and_set_values_kept() {
        assert_eq!(contribute(StatField::Yards, 0.0, 350.0), Some(350.0));
        assert_eq!(contribute(StatField::Yards, 350.0, 410.0), None);
        assert_eq!(contribute(StatField::Sacks, 3.0, 1.0), None);
    }

    #[test]
    fn test_touchdowns_take_strictly_greater() {
        assert_eq!(contribute(StatField::Touchdowns, 2.0, 3.0), Some(3.0));
        assert_eq!(contribute(StatField::Touchdowns, 3.0, 3.0), None);
        assert_eq!(contribute(StatField::Touchdowns, 3.0, 2.0), None);
    }

    #[test]
    fn test_touchdown_scenario_two_zero_three() {
        let mut record = StatRecord::default();
        for candidate in [2.0, 0.0, 3.0] {
            let mut partial = PartialStats::new();
            partial.set(StatField::Touchdowns, candidate);
            record.merge_partial(&partial);
        }
        assert_eq!(record.touchdowns, 3);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut partial = PartialStats::new();
        partial.set(StatField::Yards, 387.0);
        partial.set(StatField::CompletionPct, 70.37);
        partial.set(StatField::Touchdowns, 3.0);

        let mut once = StatRecord::default();
        once.merge_partial(&partial);
        let mut twice = once;
        assert!(twice.merge_partial(&partial).is_empty());
        assert_eq!(once, twice);
        assert_eq!(once.completion_pct, 70.4);
    }

    #[test]
    fn test_dominates_ignores_raised_fields() {
        let earlier = StatRecord {
            points: 24,
            yards: 350,
            touchdowns: 2,
            ..StatRecord::default()
        };
        let mut later = earlier;
        later.touchdowns = 3;
        later.sacks = 2;
        assert!(later.dominates(&earlier));

        later.yards = 0;
        assert!(!later.dominates(&earlier));
    }

    #[test]
    fn test_record_as_partial_skips_zeros() {
        let record = StatRecord {
            yards: 350,
            touchdowns: 3,
            ..StatRecord::default()
        };
        let partial = PartialStats::from(record);
        assert_eq!(partial.fields(), vec![StatField::Yards, StatField::Touchdowns]);

        let mut fresh = StatRecord {
            yards: 410,
            touchdowns: 2,
            ..StatRecord::default()
        };
        fresh.merge_partial(&partial);
        assert_eq!(fresh.yards, 410);
        assert_eq!(fresh.touchdowns, 3);
    }

    #[test]
    fn test_partial_add_accumulates() {
        let mut partial = PartialStats::new();
        partial.add(StatField::Touchdowns, 1.0);
        partial.add(StatField::Touchdowns, 2.0);
        assert_eq!(partial.get(StatField::Touchdowns), Some(3.0));
        assert_eq!(partial.fields(), vec![StatField::Touchdowns]);
    }
}
