//! Bulk team catalog, warmed once and consulted before team search

use std::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::variants::{name_variants, normalize};
use crate::constants::catalog::{BULK_KEY, MAX_PAGES, PAGE_SIZE};
use crate::data_fetcher::api::RequestClient;
use crate::data_fetcher::cache::DataClass;
use crate::data_fetcher::models::TeamSummary;

/// In-process copy of the upstream team list, backed by the durable
/// `teams_all` cache record.
#[derive(Debug, Default)]
pub struct TeamCatalog {
    teams: RwLock<Vec<TeamSummary>>,
}

impl TeamCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_teams(teams: Vec<TeamSummary>) -> Self {
        Self {
            teams: RwLock::new(teams),
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Loads the catalog and returns the number of teams now held.
    ///
    /// Tries the durable bulk record, then the league-scoped listing, then the
    /// paged listing. Failures are logged and leave the catalog as it was.
    #[instrument(skip(self, client))]
    pub async fn warm(&self, client: &RequestClient, league: &str) -> usize {
        if let Some(teams) = client
            .cache()
            .get_as::<Vec<TeamSummary>>(BULK_KEY)
            .await
            .filter(|teams| teams.iter().any(|t| t.league.is_some() && t.in_league(league)))
        {
            info!("Team catalog loaded from cache record: {} teams", teams.len());
            return self.replace(teams);
        }

        match client.list_league_teams(league).await {
            Ok(teams) if !teams.is_empty() => {
                info!("Team catalog loaded from league listing: {} teams", teams.len());
                return self.store(client, teams);
            }
            Ok(_) => debug!("League listing for {} was empty, trying paged listing", league),
            Err(e) => warn!("League listing for {} failed: {}", league, e),
        }

        let mut teams = Vec::new();
        for page in 0..MAX_PAGES {
            match client.list_teams_page(PAGE_SIZE, page * PAGE_SIZE).await {
                Ok(batch) => {
                    let last_page = batch.len() < PAGE_SIZE;
                    teams.extend(batch);
                    if last_page {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Paged team listing stopped at page {}: {}", page, e);
                    break;
                }
            }
        }

        if teams.is_empty() {
            warn!("Team catalog could not be warmed; resolution will rely on search");
            return self.len();
        }
        info!("Team catalog loaded from paged listing: {} teams", teams.len());
        self.store(client, teams)
    }

    /// Exact (case-insensitive) match of any name variant against a team's
    /// name, display name or abbreviation, within the league.
    pub fn find(&self, name: &str, league: &str) -> Option<TeamSummary> {
        let teams = self.read();
        if teams.is_empty() {
            return None;
        }
        name_variants(name).iter().find_map(|variant| {
            let wanted = normalize(variant);
            teams
                .iter()
                .filter(|team| team.in_league(league))
                .find(|team| {
                    [
                        Some(team.name.as_str()),
                        team.display_name.as_deref(),
                        team.abbreviation.as_deref(),
                    ]
                    .into_iter()
                    .flatten()
                    .any(|field| normalize(field) == wanted)
                })
                .cloned()
        })
    }

    fn store(&self, client: &RequestClient, teams: Vec<TeamSummary>) -> usize {
        client.cache().set_as(BULK_KEY, &teams, DataClass::Catalog);
        self.replace(teams)
    }

    fn replace(&self, teams: Vec<TeamSummary>) -> usize {
        let mut guard = self
            .teams
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = teams;
        guard.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<TeamSummary>> {
        self.teams
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
