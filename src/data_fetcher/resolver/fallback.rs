//! Static name-to-id table used when upstream resolution fails

use std::collections::{BTreeMap, HashMap};

use super::variants::{known_team, normalize};
use crate::data_fetcher::models::{ResolutionSource, TeamId, TeamIdentity};

/// Locally configured team ids, keyed by normalized name.
///
/// A lookup also tries the other names of a known team, so an entry for
/// `"dallas cowboys"` answers `"Cowboys"` and `"DAL"` as well.
#[derive(Debug, Clone, Default)]
pub struct FallbackTable {
    ids: HashMap<String, TeamId>,
}

impl FallbackTable {
    pub fn new(entries: &BTreeMap<String, TeamId>) -> Self {
        let ids = entries
            .iter()
            .map(|(name, id)| (normalize(name), *id))
            .filter(|(name, _)| !name.is_empty())
            .collect();
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn lookup(&self, name: &str, league: &str) -> Option<TeamIdentity> {
        let normalized = normalize(name);
        let (id, known) = match self.ids.get(&normalized) {
            Some(id) => (*id, known_team(&normalized)),
            None => {
                let known = known_team(&normalized)?;
                let id = [known.full_name, known.nickname, known.abbreviation]
                    .into_iter()
                    .chain(known.aliases.iter().copied())
                    .find_map(|alias| self.ids.get(&normalize(alias)))?;
                (*id, Some(known))
            }
        };

        Some(TeamIdentity {
            input_name: name.trim().to_string(),
            league: league.to_string(),
            resolved_id: id,
            display_name: known
                .map(|k| k.full_name.to_string())
                .unwrap_or_else(|| name.trim().to_string()),
            abbreviation: known.map(|k| k.abbreviation.to_string()),
            source: ResolutionSource::Fallback,
        })
    }
}
