use crate::cli::{Args, Command};
use crate::commands;
use statline::config::Config;
use statline::data_fetcher::StatsService;
use statline::error::AppError;
use tracing::{debug, info};

/// Runs one upstream-facing command.
///
/// - Builds the service stack from configuration
/// - Warms the team catalog first when the command resolves names
/// - Waits for pending durable cache writes before returning
pub async fn run(args: &Args, mut config: Config) -> Result<(), AppError> {
    if let Some(league) = &args.league {
        config.league = league.clone();
    }
    let service = StatsService::from_config(&config)?;
    info!(
        "Using {} (league {}), cache at {}",
        config.api_domain,
        config.league,
        config.resolved_cache_dir().display()
    );

    if args.command.wants_warm_catalog() && !args.no_warm {
        let teams = service.warm_cache(None).await;
        debug!("Catalog holds {} teams before running command", teams);
    }

    let league = args.league.as_deref();
    let result = match &args.command {
        Command::Resolve { name } => commands::handle_resolve(&service, name, league).await,
        Command::Stats { match_id } => commands::handle_stats(&service, *match_id).await,
        Command::HeadToHead { team_a, team_b } => {
            commands::handle_head_to_head(&service, team_a, team_b, league).await
        }
        Command::FindMatch { date, home, away } => {
            commands::handle_find_match(&service, date, home, away, league).await
        }
        Command::Recent { team, days } => {
            commands::handle_recent(&service, team, *days, league).await
        }
        Command::TeamStats { team, from } => {
            commands::handle_team_stats(&service, team, from.as_deref(), league).await
        }
        Command::Warm => commands::handle_warm(&service, league).await,
        Command::CacheStats => commands::handle_cache_stats(&service).await,
        Command::ClearCache => commands::handle_clear_cache(&service).await,
        Command::ListConfig | Command::SetConfig { .. } => Err(AppError::config_error(
            "configuration commands do not use the upstream client",
        )),
    };

    service.shutdown().await;
    result
}
