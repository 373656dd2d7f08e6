//! Free-text team name to upstream team id

pub mod catalog;
pub mod fallback;
pub mod variants;

pub use catalog::TeamCatalog;
pub use fallback::FallbackTable;
pub use variants::{KnownTeam, abbreviation_for, known_team, name_variants, normalize, title_case};

use chrono::{DateTime, TimeDelta, Utc};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

use crate::constants::{cache_ttl, capacity};
use crate::data_fetcher::api::RequestClient;
use crate::data_fetcher::cache::Clock;
use crate::data_fetcher::models::{ResolutionSource, TeamIdentity, TeamSummary};
use crate::error::AppError;

/// A cached resolution outcome. `identity: None` is a negative entry.
#[derive(Debug, Clone)]
struct Resolution {
    identity: Option<TeamIdentity>,
    expires_at: DateTime<Utc>,
}

/// Outcome of trying one list of candidates against upstream.
enum SearchOutcome {
    Found(TeamSummary),
    NotFound,
    /// Nothing matched, and at least one query failed for a reason other than
    /// a rejected request
    Unreliable,
}

/// Resolves team names to ids, remembering both hits and misses.
///
/// Order: resolution cache, loaded catalog, team search per name variant,
/// abbreviation search. Misses are cached for a shorter time than hits, and
/// only when every upstream query actually answered.
#[derive(Debug)]
pub struct TeamResolver {
    client: RequestClient,
    catalog: Arc<TeamCatalog>,
    fallback: FallbackTable,
    resolutions: Mutex<LruCache<String, Resolution>>,
    clock: Arc<dyn Clock>,
}

impl TeamResolver {
    pub fn new(client: RequestClient, catalog: Arc<TeamCatalog>, fallback: FallbackTable) -> Self {
        let clock = client.cache().clock();
        let capacity =
            NonZeroUsize::new(capacity::RESOLUTION_ENTRIES).unwrap_or(NonZeroUsize::MIN);
        Self {
            client,
            catalog,
            fallback,
            resolutions: Mutex::new(LruCache::new(capacity)),
            clock,
        }
    }

    pub fn catalog(&self) -> &Arc<TeamCatalog> {
        &self.catalog
    }

    /// Resolves `name` within `league`, or `None` when nothing upstream matches.
    #[instrument(skip(self))]
    pub async fn resolve(&self, name: &str, league: &str) -> Option<TeamIdentity> {
        let normalized = normalize(name);
        if normalized.is_empty() {
            return None;
        }
        let key = resolution_key(&normalized, league);

        if let Some(cached) = self.cached(&key) {
            debug!("Resolution cache hit for '{}' in {}", name, league);
            return cached;
        }

        if let Some(team) = self.catalog.find(name, league) {
            debug!("Resolved '{}' from catalog: id={}", name, team.id);
            let identity =
                TeamIdentity::from_summary(name, league, &team, ResolutionSource::Catalog);
            self.remember(&key, Some(identity.clone()));
            return Some(identity);
        }

        let variants = name_variants(name);
        let mut unreliable = false;
        match self.search_by_name(&variants, league).await {
            SearchOutcome::Found(team) => {
                info!("Resolved '{}' via team search: id={}", name, team.id);
                let identity =
                    TeamIdentity::from_summary(name, league, &team, ResolutionSource::Search);
                self.remember(&key, Some(identity.clone()));
                return Some(identity);
            }
            SearchOutcome::Unreliable => unreliable = true,
            SearchOutcome::NotFound => {}
        }

        if let Some(abbreviation) = final_abbreviation(name) {
            match self.search_by_abbreviation(&abbreviation, league).await {
                SearchOutcome::Found(team) => {
                    info!("Resolved '{}' via abbreviation {}: id={}", name, abbreviation, team.id);
                    let identity = TeamIdentity::from_summary(
                        name,
                        league,
                        &team,
                        ResolutionSource::Abbreviation,
                    );
                    self.remember(&key, Some(identity.clone()));
                    return Some(identity);
                }
                SearchOutcome::Unreliable => unreliable = true,
                SearchOutcome::NotFound => {}
            }
        }

        if unreliable {
            warn!(
                "Could not resolve '{}' in {} while upstream was failing; miss not cached",
                name, league
            );
        } else {
            info!("No team matches '{}' in {}", name, league);
            self.remember(&key, None);
        }
        None
    }

    /// Like [`resolve`](Self::resolve), falling back to the configured static table.
    ///
    /// # Errors
    /// `AppError::ResolutionFailure` when neither upstream nor the table knows the name.
    pub async fn resolve_or_fallback(
        &self,
        name: &str,
        league: &str,
    ) -> Result<TeamIdentity, AppError> {
        if let Some(identity) = self.resolve(name, league).await {
            return Ok(identity);
        }
        match self.fallback.lookup(name, league) {
            Some(identity) => {
                warn!(
                    "Using static fallback id {} for '{}' in {}",
                    identity.resolved_id, name, league
                );
                Ok(identity)
            }
            None => Err(AppError::resolution_failure(name.trim(), league)),
        }
    }

    /// Drops every cached resolution.
    pub fn forget_all(&self) {
        self.lock().clear();
    }

    async fn search_by_name(&self, variants: &[String], league: &str) -> SearchOutcome {
        let mut unreliable = false;
        for variant in variants {
            match self.client.search_teams_by_name(variant, league).await {
                Ok(teams) => {
                    if let Some(team) = pick(teams, variant, league) {
                        return SearchOutcome::Found(team);
                    }
                    debug!("No matching team for variant '{}'", variant);
                }
                Err(e) if e.is_validation() => {
                    debug!("Team search rejected variant '{}': {}", variant, e);
                }
                Err(e) => {
                    warn!("Team search for variant '{}' failed: {}", variant, e);
                    unreliable = true;
                }
            }
        }
        if unreliable {
            SearchOutcome::Unreliable
        } else {
            SearchOutcome::NotFound
        }
    }

    async fn search_by_abbreviation(&self, abbreviation: &str, league: &str) -> SearchOutcome {
        match self.client.search_teams_by_abbreviation(abbreviation, league).await {
            Ok(teams) => match pick(teams, abbreviation, league) {
                Some(team) => SearchOutcome::Found(team),
                None => SearchOutcome::NotFound,
            },
            Err(e) if e.is_validation() => SearchOutcome::NotFound,
            Err(e) => {
                warn!("Abbreviation search for '{}' failed: {}", abbreviation, e);
                SearchOutcome::Unreliable
            }
        }
    }

    fn cached(&self, key: &str) -> Option<Option<TeamIdentity>> {
        let now = self.clock.now();
        let mut resolutions = self.lock();
        let expired = match resolutions.get(key) {
            Some(entry) if now < entry.expires_at => return Some(entry.identity.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            resolutions.pop(key);
        }
        None
    }

    fn remember(&self, key: &str, identity: Option<TeamIdentity>) {
        let seconds = if identity.is_some() {
            cache_ttl::RESOLUTION_POSITIVE_SECONDS
        } else {
            cache_ttl::RESOLUTION_NEGATIVE_SECONDS
        };
        let ttl = TimeDelta::seconds(i64::try_from(seconds).unwrap_or(i64::MAX));
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.lock().put(key.to_string(), Resolution { identity, expires_at });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, Resolution>> {
        self.resolutions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn resolution_key(normalized: &str, league: &str) -> String {
    format!("{}|{}", league.trim().to_uppercase(), normalized)
}

fn pick(teams: Vec<TeamSummary>, candidate: &str, league: &str) -> Option<TeamSummary> {
    teams
        .into_iter()
        .find(|team| team.in_league(league) && team.matches_name(candidate))
}

/// The abbreviation tried last: a known team's, or the input itself when it
/// already looks like one.
fn final_abbreviation(name: &str) -> Option<String> {
    if let Some(abbreviation) = abbreviation_for(name) {
        return Some(abbreviation.to_string());
    }
    let trimmed = name.trim();
    let looks_like_abbreviation = (2..=4).contains(&trimmed.len())
        && trimmed.chars().all(|c| c.is_ascii_alphabetic());
    looks_like_abbreviation.then(|| trimmed.to_uppercase())
}
