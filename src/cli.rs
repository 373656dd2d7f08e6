use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};

fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .usage(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default().effects(Effects::BOLD))
        .valid(AnsiColor::Green.on_default())
        .invalid(AnsiColor::Red.on_default())
}

/// Sports statistics lookup with caching and multi-source reconciliation
///
/// Resolves free-text team names, reconciles per-match team statistics from
/// several upstream payloads and keeps a two-tier cache in front of the
/// upstream API. Every command prints JSON to stdout.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// League used when a command does not name one (overrides config)
    #[arg(long, global = true)]
    pub league: Option<String>,

    /// Skip the team catalog warm-up before running the command
    #[arg(long = "no-warm", global = true, help_heading = "Cache")]
    pub no_warm: bool,

    /// Log at debug level
    #[arg(long = "debug", global = true, help_heading = "Debug")]
    pub debug: bool,

    /// Do not write logs to stderr; the log file is still written
    #[arg(short = 'q', long = "quiet", global = true, help_heading = "Debug")]
    pub quiet: bool,

    /// Specify a custom log file path. If not provided, logs will be written to the default location.
    #[arg(long = "log-file", global = true, help_heading = "Debug")]
    pub log_file: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Resolve a team name to its upstream id
    Resolve {
        name: String,
    },
    /// Reconciled home/away statistics for a match id
    Stats {
        match_id: i64,
    },
    /// Head-to-head meetings of two teams, with the latest one reconciled
    #[command(name = "h2h")]
    HeadToHead {
        team_a: String,
        team_b: String,
    },
    /// Find the match between two teams on a date (YYYY-MM-DD)
    FindMatch {
        date: String,
        home: String,
        away: String,
    },
    /// Most recent matches of a team, walking back day by day
    Recent {
        team: String,
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Season statistics of a team, by name or numeric id
    TeamStats {
        team: String,
        /// First day included (YYYY-MM-DD); defaults to 30 days ago
        #[arg(long)]
        from: Option<String>,
    },
    /// Warm the team catalog and report its size
    Warm,
    /// Cache and request counters
    CacheStats,
    /// Remove every cached entry from both tiers
    ClearCache,
    /// Show the current configuration (API key masked)
    ListConfig,
    /// Update the configuration file
    SetConfig {
        #[arg(long)]
        api_domain: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long = "default-league")]
        default_league: Option<String>,
        /// Persist a custom log file location
        #[arg(long = "set-log-file")]
        new_log_file_path: Option<String>,
        /// Clear the custom log file path, reverting to the default location
        #[arg(long = "clear-log-file", conflicts_with = "new_log_file_path")]
        clear_log_file_path: bool,
    },
}

impl Command {
    /// Commands that only touch local configuration and need no upstream client.
    pub fn is_config_only(&self) -> bool {
        matches!(self, Command::ListConfig | Command::SetConfig { .. })
    }

    /// Commands that benefit from a warm team catalog.
    pub fn wants_warm_catalog(&self) -> bool {
        matches!(
            self,
            Command::Resolve { .. }
                | Command::HeadToHead { .. }
                | Command::FindMatch { .. }
                | Command::Recent { .. }
                | Command::TeamStats { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_head_to_head() {
        let args = Args::try_parse_from(["statline", "h2h", "Cowboys", "Eagles", "--league", "NFL"])
            .unwrap();
        assert_eq!(
            args.command,
            Command::HeadToHead {
                team_a: "Cowboys".to_string(),
                team_b: "Eagles".to_string(),
            }
        );
        assert_eq!(args.league.as_deref(), Some("NFL"));
        assert!(args.command.wants_warm_catalog());
    }

    #[test]
    fn test_parses_recent_default_days() {
        let args = Args::try_parse_from(["statline", "--quiet", "recent", "Bills"]).unwrap();
        assert!(args.quiet);
        assert_eq!(
            args.command,
            Command::Recent {
                team: "Bills".to_string(),
                days: 7
            }
        );
    }

    #[test]
    fn test_parses_team_stats() {
        let args =
            Args::try_parse_from(["statline", "team-stats", "6", "--from", "2024-08-01"]).unwrap();
        assert_eq!(
            args.command,
            Command::TeamStats {
                team: "6".to_string(),
                from: Some("2024-08-01".to_string()),
            }
        );
        assert!(args.command.wants_warm_catalog());
    }

    #[test]
    fn test_set_config_rejects_conflicting_log_flags() {
        let result = Args::try_parse_from([
            "statline",
            "set-config",
            "--set-log-file",
            "/tmp/x.log",
            "--clear-log-file",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_only_commands() {
        assert!(Command::ListConfig.is_config_only());
        assert!(!Command::Warm.is_config_only());
        assert!(!Command::Stats { match_id: 1 }.wants_warm_catalog());
    }
}
