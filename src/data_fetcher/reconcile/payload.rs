//! Lenient readers for upstream statistics payloads

use serde_json::Value;

/// Number from a JSON number or a string such as `"57.7%"`, `"3.0"` or `"4-22"`
/// (leading part). Unparseable values are `None`.
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let cleaned = s.trim().trim_end_matches('%').trim();
            let leading = match cleaned.char_indices().skip(1).find(|(_, c)| *c == '-') {
                Some((idx, _)) => &cleaned[..idx],
                None => cleaned,
            };
            leading
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
        }
        _ => None,
    }
}

/// `(made, attempted)` from `"19/27"`.
pub fn ratio(value: &Value) -> Option<(f64, f64)> {
    let text = value.as_str()?;
    let (made, attempted) = text.split_once('/')?;
    let made = made.trim().parse::<f64>().ok()?;
    let attempted = attempted.trim().parse::<f64>().ok()?;
    Some((made, attempted))
}

/// Completion percentage, one decimal, from made/attempted.
pub fn completion_pct(made: f64, attempted: f64) -> Option<f64> {
    (attempted > 0.0).then(|| (made / attempted * 1000.0).round() / 10.0)
}

/// First present, non-null value among `keys`.
pub fn first<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find(|v| !v.is_null())
}

/// First of `keys` that parses as a number.
pub fn first_number(value: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find_map(number)
}

/// The home or away node of a two-sided payload.
pub fn side(value: &Value, home: bool) -> Option<&Value> {
    let keys: &[&str] = if home {
        &["homeTeam", "home"]
    } else {
        &["awayTeam", "away"]
    };
    first(value, keys)
}

/// `(lowercased name, value)` pairs of a `[{name|displayName|label, value}]` list,
/// also accepted inside a `{"statistics": [...]}` or `{"data": [...]}` wrapper.
pub fn named_entries(node: &Value) -> Vec<(String, &Value)> {
    let list = match node {
        Value::Array(items) => items.as_slice(),
        Value::Object(_) => match first(node, &["statistics", "stats", "data"]) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };
    list.iter()
        .filter_map(|item| {
            let name = first(item, &["name", "displayName", "label"])?.as_str()?;
            let value = item.get("value")?;
            Some((name.trim().to_lowercase(), value))
        })
        .collect()
}

/// Final scores as `(home, away)`.
///
/// Accepts `homeScore`, `home_score`, `home_points`, a `score` on the team
/// objects, or `state.score.current` formatted `"24 - 17"`.
pub fn scores(detail: &Value) -> (Option<f64>, Option<f64>) {
    let flat = (
        first_number(detail, &["homeScore", "home_score", "home_points"]),
        first_number(detail, &["awayScore", "away_score", "away_points"]),
    );
    if flat.0.is_some() || flat.1.is_some() {
        return flat;
    }

    let nested = (
        side(detail, true).and_then(|team| first_number(team, &["score", "points"])),
        side(detail, false).and_then(|team| first_number(team, &["score", "points"])),
    );
    if nested.0.is_some() || nested.1.is_some() {
        return nested;
    }

    detail
        .pointer("/state/score/current")
        .and_then(Value::as_str)
        .and_then(|current| current.split_once('-'))
        .map(|(home, away)| (home.trim().parse().ok(), away.trim().parse().ok()))
        .unwrap_or((None, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_coercion() {
        assert_eq!(number(&json!(57)), Some(57.0));
        assert_eq!(number(&json!("57.7%")), Some(57.7));
        assert_eq!(number(&json!(" 3.0 ")), Some(3.0));
        assert_eq!(number(&json!("4-22")), Some(4.0));
        assert_eq!(number(&json!("-3")), Some(-3.0));
        assert_eq!(number(&json!("n/a")), None);
        assert_eq!(number(&json!(null)), None);
    }

    #[test]
    fn test_ratio_and_completion() {
        assert_eq!(ratio(&json!("19/27")), Some((19.0, 27.0)));
        assert_eq!(ratio(&json!("19-27")), None);
        assert_eq!(completion_pct(19.0, 27.0), Some(70.4));
        assert_eq!(completion_pct(0.0, 0.0), None);
    }

    #[test]
    fn test_named_entries_shapes() {
        let bare = json!([{"name": "Rushing Touchdowns", "value": 2}]);
        let wrapped = json!({"statistics": [{"displayName": "Total Yards", "value": "350"}]});
        assert_eq!(named_entries(&bare)[0].0, "rushing touchdowns");
        assert_eq!(named_entries(&wrapped)[0].0, "total yards");
        assert!(named_entries(&json!({"passing": {}})).is_empty());
    }

    #[test]
    fn test_scores_shapes() {
        assert_eq!(scores(&json!({"homeScore": 24, "awayScore": "17"})), (Some(24.0), Some(17.0)));
        assert_eq!(
            scores(&json!({"homeTeam": {"score": 10}, "awayTeam": {"score": 3}})),
            (Some(10.0), Some(3.0))
        );
        assert_eq!(
            scores(&json!({"state": {"score": {"current": "24 - 17"}}})),
            (Some(24.0), Some(17.0))
        );
        assert_eq!(scores(&json!({})), (None, None));
    }
}
