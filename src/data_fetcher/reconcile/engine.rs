//! Per-match statistics reconciliation and the head-to-head empty guard

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::diagnostics::Diagnostics;
use super::head_to_head::HeadToHeadStore;
use super::sources::{SourceInputs, StatSource, default_sources};
use crate::data_fetcher::api::{RequestClient, is_empty_payload};
use crate::data_fetcher::cache::DataClass;
use crate::data_fetcher::models::{
    HeadToHeadStatus, MatchRef, PartialStats, TeamIdentity, TeamStatistics, team_pair_key,
};
use crate::data_fetcher::resolver::TeamResolver;
use crate::error::AppError;

/// Best-effort statistics for one match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciled {
    pub match_id: i64,
    pub statistics: TeamStatistics,
    pub diagnostics: Diagnostics,
}

/// Head-to-head listing for two teams, with the most recent meeting reconciled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadToHeadReport {
    pub league: String,
    pub team_a: TeamIdentity,
    pub team_b: TeamIdentity,
    pub status: HeadToHeadStatus,
    pub matches: Vec<Value>,
    pub latest: Option<MatchRef>,
    pub statistics: Option<TeamStatistics>,
    pub last_good_at: Option<DateTime<Utc>>,
    pub diagnostics: Diagnostics,
}

/// Contribution name of the previously reconciled record.
pub const PREVIOUS_SOURCE: &str = "previous";

/// Cache key of the last reconciled pair for a match.
pub fn reconciled_key(match_id: i64) -> String {
    format!("stat_record:{match_id}")
}

#[derive(Debug)]
pub struct ReconciliationEngine {
    client: RequestClient,
    resolver: Arc<TeamResolver>,
    head_to_head: Arc<HeadToHeadStore>,
    sources: Vec<Box<dyn StatSource>>,
    retry_delay: Duration,
}

impl ReconciliationEngine {
    pub fn new(
        client: RequestClient,
        resolver: Arc<TeamResolver>,
        head_to_head: Arc<HeadToHeadStore>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            client,
            resolver,
            head_to_head,
            sources: default_sources(),
            retry_delay,
        }
    }

    pub fn resolver(&self) -> &Arc<TeamResolver> {
        &self.resolver
    }

    pub fn head_to_head_store(&self) -> &Arc<HeadToHeadStore> {
        &self.head_to_head
    }

    /// Home and away statistics for `match_id`.
    ///
    /// Detail, statistics and box score are fetched concurrently; a failed
    /// fetch is recorded in the diagnostics and the remaining payloads are
    /// still used. The last reconciled record for the match, if cached, is
    /// merged after the fresh sources. Always returns a record, possibly all zeros.
    #[instrument(skip(self))]
    pub async fn get_team_statistics(&self, match_id: i64) -> Reconciled {
        let (detail, statistics, box_score) = tokio::join!(
            self.client.match_detail(match_id),
            self.client.match_statistics(match_id),
            self.client.box_score(match_id),
        );

        let mut diagnostics = Diagnostics::default();
        let inputs = SourceInputs {
            detail: usable("detail", detail, &mut diagnostics),
            statistics: usable("statistics", statistics, &mut diagnostics),
            box_score: usable("box_score", box_score, &mut diagnostics),
        };

        let mut merged = TeamStatistics::default();
        for source in &self.sources {
            let Some((home, away)) = source.extract(&inputs) else {
                debug!("Source {} had nothing for match {}", source.name(), match_id);
                continue;
            };
            merge_source(&mut merged, source.name(), &home, &away, &mut diagnostics);
        }

        // The previous record ranks below every fresh source: it only fills
        // fields still at zero and can still raise touchdowns.
        let key = reconciled_key(match_id);
        let cache = self.client.cache();
        if let Some(previous) = cache.get_as::<TeamStatistics>(&key).await {
            diagnostics.merged_previous = true;
            merge_source(
                &mut merged,
                PREVIOUS_SOURCE,
                &PartialStats::from(previous.home),
                &PartialStats::from(previous.away),
                &mut diagnostics,
            );
        }

        if !merged.is_empty() {
            cache.set_as(&key, &merged, DataClass::Reconciled);
        }

        if diagnostics.partial {
            warn!(
                "Match {} reconciled with {} failed source fetch(es)",
                match_id,
                diagnostics.errors.len()
            );
        } else {
            info!("Match {} reconciled", match_id);
        }

        Reconciled {
            match_id,
            statistics: merged,
            diagnostics,
        }
    }

    /// Head-to-head meetings of two named teams.
    ///
    /// A non-empty answer replaces the pair's last-known-good listing. An empty
    /// or failed answer serves the last-known-good listing when there is one;
    /// otherwise an empty answer is retried once after the configured delay.
    ///
    /// # Errors
    /// `AppError::ResolutionFailure` when either name resolves neither upstream
    /// nor through the fallback table.
    #[instrument(skip(self))]
    pub async fn get_head_to_head(
        &self,
        team_a: &str,
        team_b: &str,
        league: &str,
    ) -> Result<HeadToHeadReport, AppError> {
        let (a, b) = futures::future::join(
            self.resolver.resolve_or_fallback(team_a, league),
            self.resolver.resolve_or_fallback(team_b, league),
        )
        .await;
        let (a, b) = (a?, b?);
        let pair_key = team_pair_key(league, a.resolved_id, b.resolved_id);
        let mut diagnostics = Diagnostics::default();

        let (status, matches, last_good_at) = match self
            .client
            .head_to_head(a.resolved_id, b.resolved_id)
            .await
        {
            Ok(matches) if !matches.is_empty() => self.fresh(&pair_key, league, matches),
            outcome => {
                let first_error = outcome.err();
                if let Some(error) = &first_error {
                    diagnostics.record_error("head_to_head", error);
                }

                if let Some(entry) = self.head_to_head.get(&pair_key) {
                    info!("Serving last-known-good head-to-head for {}", pair_key);
                    diagnostics.note(format!(
                        "upstream returned no usable listing; reused listing from {}",
                        entry.last_good_at.to_rfc3339()
                    ));
                    (
                        HeadToHeadStatus::ReusedStale,
                        entry.matches,
                        Some(entry.last_good_at),
                    )
                } else if first_error.is_some() {
                    (HeadToHeadStatus::Failed, Vec::new(), None)
                } else {
                    debug!("Empty head-to-head for {}, retrying once", pair_key);
                    tokio::time::sleep(self.retry_delay).await;
                    match self.client.head_to_head(a.resolved_id, b.resolved_id).await {
                        Ok(matches) if !matches.is_empty() => {
                            self.fresh(&pair_key, league, matches)
                        }
                        Ok(_) => {
                            warn!("Head-to-head for {} was empty twice", pair_key);
                            diagnostics.note("upstream returned no matches on both attempts");
                            (HeadToHeadStatus::EmptyTwice, Vec::new(), None)
                        }
                        Err(e) => {
                            diagnostics.record_error("head_to_head_retry", &e);
                            (HeadToHeadStatus::Failed, Vec::new(), None)
                        }
                    }
                }
            }
        };

        let refs: Vec<MatchRef> = matches.iter().filter_map(MatchRef::from_value).collect();
        let latest = MatchRef::latest(&refs).cloned();
        let statistics = match &latest {
            Some(latest) => {
                let reconciled = self.get_team_statistics(latest.match_id).await;
                diagnostics.absorb(reconciled.diagnostics);
                Some(reconciled.statistics)
            }
            None => None,
        };

        Ok(HeadToHeadReport {
            league: league.to_string(),
            team_a: a,
            team_b: b,
            status,
            matches,
            latest,
            statistics,
            last_good_at,
            diagnostics,
        })
    }

    fn fresh(
        &self,
        pair_key: &str,
        league: &str,
        matches: Vec<Value>,
    ) -> (HeadToHeadStatus, Vec<Value>, Option<DateTime<Utc>>) {
        let now = self.client.cache().now();
        self.head_to_head.record(pair_key, league, &matches, now);
        (HeadToHeadStatus::Fresh, matches, Some(now))
    }
}

fn merge_source(
    merged: &mut TeamStatistics,
    name: &str,
    home: &PartialStats,
    away: &PartialStats,
    diagnostics: &mut Diagnostics,
) {
    let home_changed = merged.home.merge_partial(home);
    let away_changed = merged.away.merge_partial(away);
    debug!(
        "Source {} changed home={:?} away={:?}",
        name, home_changed, away_changed
    );
    diagnostics.record_contribution(name, home_changed, away_changed);
}

/// Keeps a fetched payload if it has content; records a failure otherwise.
fn usable(
    source: &str,
    outcome: Result<Value, AppError>,
    diagnostics: &mut Diagnostics,
) -> Option<Value> {
    match outcome {
        Ok(value) if !is_empty_payload(&value) => Some(value),
        Ok(_) => {
            debug!("{} payload was empty", source);
            None
        }
        Err(e) => {
            warn!("{} fetch failed, continuing without it: {}", source, e);
            diagnostics.record_error(source, &e);
            None
        }
    }
}
