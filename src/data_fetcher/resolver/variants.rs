//! Team name normalization and search variants

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A known professional team and the names people use for it.
#[derive(Debug)]
pub struct KnownTeam {
    pub nickname: &'static str,
    pub full_name: &'static str,
    pub abbreviation: &'static str,
    /// Extra lowercase aliases (city names that are unambiguous, slang)
    pub aliases: &'static [&'static str],
}

const fn team(
    nickname: &'static str,
    full_name: &'static str,
    abbreviation: &'static str,
    aliases: &'static [&'static str],
) -> KnownTeam {
    KnownTeam {
        nickname,
        full_name,
        abbreviation,
        aliases,
    }
}

pub static KNOWN_TEAMS: &[KnownTeam] = &[
    // AFC East
    team("Bills", "Buffalo Bills", "BUF", &["buffalo"]),
    team("Dolphins", "Miami Dolphins", "MIA", &["miami"]),
    team("Patriots", "New England Patriots", "NE", &["new england", "pats"]),
    team("Jets", "New York Jets", "NYJ", &[]),
    // AFC North
    team("Ravens", "Baltimore Ravens", "BAL", &["baltimore"]),
    team("Bengals", "Cincinnati Bengals", "CIN", &["cincinnati"]),
    team("Browns", "Cleveland Browns", "CLE", &["cleveland"]),
    team("Steelers", "Pittsburgh Steelers", "PIT", &["pittsburgh"]),
    // AFC South
    team("Texans", "Houston Texans", "HOU", &["houston"]),
    team("Colts", "Indianapolis Colts", "IND", &["indianapolis"]),
    team("Jaguars", "Jacksonville Jaguars", "JAX", &["jacksonville", "jags"]),
    team("Titans", "Tennessee Titans", "TEN", &["tennessee"]),
    // AFC West
    team("Broncos", "Denver Broncos", "DEN", &["denver"]),
    team("Chiefs", "Kansas City Chiefs", "KC", &["kansas city"]),
    team("Raiders", "Las Vegas Raiders", "LV", &["las vegas"]),
    team("Chargers", "Los Angeles Chargers", "LAC", &["la chargers"]),
    // NFC East
    team("Cowboys", "Dallas Cowboys", "DAL", &["dallas"]),
    team("Giants", "New York Giants", "NYG", &[]),
    team("Eagles", "Philadelphia Eagles", "PHI", &["philadelphia"]),
    team("Commanders", "Washington Commanders", "WSH", &["washington"]),
    // NFC North
    team("Bears", "Chicago Bears", "CHI", &["chicago"]),
    team("Lions", "Detroit Lions", "DET", &["detroit"]),
    team("Packers", "Green Bay Packers", "GB", &["green bay"]),
    team("Vikings", "Minnesota Vikings", "MIN", &["minnesota"]),
    // NFC South
    team("Falcons", "Atlanta Falcons", "ATL", &["atlanta"]),
    team("Panthers", "Carolina Panthers", "CAR", &["carolina"]),
    team("Saints", "New Orleans Saints", "NO", &["new orleans"]),
    team("Buccaneers", "Tampa Bay Buccaneers", "TB", &["tampa bay", "bucs"]),
    // NFC West
    team("Cardinals", "Arizona Cardinals", "ARI", &["arizona"]),
    team("Rams", "Los Angeles Rams", "LAR", &["la rams"]),
    team("49ers", "San Francisco 49ers", "SF", &["san francisco", "niners"]),
    team("Seahawks", "Seattle Seahawks", "SEA", &["seattle"]),
];

static TEAM_INDEX: Lazy<HashMap<String, &'static KnownTeam>> = Lazy::new(|| {
    let mut index = HashMap::new();
    for known in KNOWN_TEAMS {
        let names = [known.nickname, known.full_name, known.abbreviation]
            .into_iter()
            .chain(known.aliases.iter().copied());
        for name in names {
            index.insert(normalize(name), known);
        }
    }
    index
});

/// Trims, lowercases and collapses internal whitespace.
///
/// ```
/// use statline::data_fetcher::resolver::normalize;
///
/// assert_eq!(normalize("  Dallas   COWBOYS "), "dallas cowboys");
/// ```
pub fn normalize(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upper-cases the first letter of every word and lower-cases the rest.
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Looks up a known team by nickname, full name, abbreviation or alias.
pub fn known_team(name: &str) -> Option<&'static KnownTeam> {
    TEAM_INDEX.get(&normalize(name)).copied()
}

/// Known abbreviation for a name, if any.
pub fn abbreviation_for(name: &str) -> Option<&'static str> {
    known_team(name).map(|known| known.abbreviation)
}

/// Ordered, de-duplicated names to try against team search:
/// verbatim, title-cased, canonical full name, nickname, abbreviation.
pub fn name_variants(input: &str) -> Vec<String> {
    let verbatim = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if verbatim.is_empty() {
        return Vec::new();
    }
    let known = known_team(&verbatim);

    let nickname = match known {
        Some(known) => Some(known.nickname.to_string()),
        None => {
            let words: Vec<&str> = verbatim.split(' ').collect();
            (words.len() >= 2)
                .then(|| words.last().map(|w| title_case(w)))
                .flatten()
        }
    };

    let candidates = [
        Some(verbatim.clone()),
        Some(title_case(&verbatim)),
        known.map(|k| k.full_name.to_string()),
        nickname,
        known.map(|k| k.abbreviation.to_string()),
    ];

    let mut variants: Vec<String> = Vec::new();
    for candidate in candidates.into_iter().flatten() {
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}
