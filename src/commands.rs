use crate::cli::Command;
use serde::Serialize;
use serde_json::json;
use statline::config::Config;
use statline::data_fetcher::StatsService;
use statline::error::AppError;
use std::path::Path;
use tracing::info;

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn handle_resolve(
    service: &StatsService,
    name: &str,
    league: Option<&str>,
) -> Result<(), AppError> {
    let identity = service.resolve_team(name, league).await?;
    print_json(&identity)
}

pub async fn handle_stats(service: &StatsService, match_id: i64) -> Result<(), AppError> {
    let reconciled = service.get_match_statistics(match_id).await;
    print_json(&reconciled)
}

pub async fn handle_head_to_head(
    service: &StatsService,
    team_a: &str,
    team_b: &str,
    league: Option<&str>,
) -> Result<(), AppError> {
    let report = service.get_head_to_head(team_a, team_b, league).await?;
    print_json(&report)
}

pub async fn handle_find_match(
    service: &StatsService,
    date: &str,
    home: &str,
    away: &str,
    league: Option<&str>,
) -> Result<(), AppError> {
    let found = service.find_match(date, league, home, away).await?;
    print_json(&json!({
        "date": date,
        "found": found.is_some(),
        "match": found,
    }))
}

pub async fn handle_recent(
    service: &StatsService,
    team: &str,
    days: u32,
    league: Option<&str>,
) -> Result<(), AppError> {
    let matches = service.recent_matches(team, league, days).await?;
    print_json(&json!({
        "team": team,
        "days_back": days,
        "matches": matches,
    }))
}

pub async fn handle_team_stats(
    service: &StatsService,
    team: &str,
    from: Option<&str>,
    league: Option<&str>,
) -> Result<(), AppError> {
    let report = service.team_statistics(team, league, from).await?;
    print_json(&report)
}

pub async fn handle_warm(service: &StatsService, league: Option<&str>) -> Result<(), AppError> {
    let teams = service.warm_cache(league).await;
    print_json(&json!({
        "league": league.unwrap_or(service.default_league()),
        "catalog_teams": teams,
    }))
}

pub async fn handle_cache_stats(service: &StatsService) -> Result<(), AppError> {
    print_json(&service.stats().await)
}

pub async fn handle_clear_cache(service: &StatsService) -> Result<(), AppError> {
    service.clear_cache().await;
    print_json(&json!({ "cleared": true }))
}

/// Runs `list-config` or `set-config`; neither needs the upstream client.
pub async fn handle_config_command(command: &Command) -> Result<(), AppError> {
    match command {
        Command::SetConfig {
            api_domain,
            api_key,
            default_league,
            new_log_file_path,
            clear_log_file_path,
        } => {
            handle_set_config(ConfigUpdate {
                api_domain: api_domain.clone(),
                api_key: api_key.clone(),
                league: default_league.clone(),
                log_file_path: new_log_file_path.clone(),
                clear_log_file_path: *clear_log_file_path,
            })
            .await
        }
        _ => handle_list_config().await,
    }
}

/// Handles the `list-config` command.
pub async fn handle_list_config() -> Result<(), AppError> {
    Config::display().await
}

/// Changes requested by `set-config`.
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub api_domain: Option<String>,
    pub api_key: Option<String>,
    pub league: Option<String>,
    pub log_file_path: Option<String>,
    pub clear_log_file_path: bool,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.api_domain.is_none()
            && self.api_key.is_none()
            && self.league.is_none()
            && self.log_file_path.is_none()
            && !self.clear_log_file_path
    }

    pub fn apply(self, config: &mut Config) {
        if let Some(api_domain) = self.api_domain {
            config.api_domain = api_domain;
        }
        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }
        if let Some(league) = self.league {
            config.league = league;
        }
        if let Some(log_file_path) = self.log_file_path {
            config.log_file_path = Some(log_file_path);
        } else if self.clear_log_file_path {
            config.log_file_path = None;
        }
    }
}

/// Handles the `set-config` command. Starts from the existing file when there is one.
pub async fn handle_set_config(update: ConfigUpdate) -> Result<(), AppError> {
    if update.is_empty() {
        return Err(AppError::config_error(
            "Nothing to update; pass at least one set-config option",
        ));
    }

    let config_path = Config::get_config_path();
    let mut config = if Path::new(&config_path).exists() {
        Config::load_from_path(&config_path).await?
    } else {
        Config::default()
    };
    update.apply(&mut config);
    config.validate()?;
    config.save().await?;

    info!("Configuration saved to {}", config_path);
    println!("Config updated successfully!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_update_apply() {
        let mut config = Config {
            log_file_path: Some("/var/log/old.log".to_string()),
            ..Config::default()
        };
        let update = ConfigUpdate {
            api_key: Some("secret".to_string()),
            clear_log_file_path: true,
            ..ConfigUpdate::default()
        };
        assert!(!update.is_empty());
        update.apply(&mut config);
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.log_file_path, None);
    }

    #[test]
    fn test_empty_update() {
        assert!(ConfigUpdate::default().is_empty());
    }
}
