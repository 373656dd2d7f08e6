//! Application-wide constants and configuration values
//!
//! This module centralizes the TTLs, retry limits and capacities used by the
//! cache, request client, resolver and reconciliation layers.

/// Default timeout for HTTP requests in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

/// Maximum number of connections per host in the HTTP client pool
pub const HTTP_POOL_MAX_IDLE_PER_HOST: usize = 32;

/// League used when none is configured or given on the command line
pub const DEFAULT_LEAGUE: &str = "NFL";

/// Header carrying the static upstream credential
pub const API_KEY_HEADER: &str = "x-rapidapi-key";

/// Cache TTL (Time To Live) values in seconds
pub mod cache_ttl {
    /// Live or in-progress match data
    pub const LIVE_MATCH_SECONDS: u64 = 60;

    /// Match detail, statistics and box scores
    pub const MATCH_DETAIL_SECONDS: u64 = 900;

    /// Per-match statistics payloads
    pub const STATISTICS_SECONDS: u64 = 900;

    /// Head-to-head listings
    pub const HEAD_TO_HEAD_SECONDS: u64 = 3600;

    /// Team search results and other team metadata (24 hours)
    pub const TEAM_METADATA_SECONDS: u64 = 86_400;

    /// Bulk team catalog record (24 hours)
    pub const CATALOG_SECONDS: u64 = 86_400;

    /// Successful team resolutions (24 hours)
    pub const RESOLUTION_POSITIVE_SECONDS: u64 = 86_400;

    /// Failed team resolutions. Short so a new alias or upstream fix is picked up.
    pub const RESOLUTION_NEGATIVE_SECONDS: u64 = 600;

    /// Reconciled statistics pair, filling gaps in later reconciliations of the same match
    pub const RECONCILED_RECORD_SECONDS: u64 = 86_400;
}

/// Cache capacities
pub mod capacity {
    /// Maximum number of entries held by the in-process tier
    pub const MEMORY_TIER_ENTRIES: usize = 2_000;

    /// Maximum number of memoized team resolutions
    pub const RESOLUTION_ENTRIES: usize = 512;

    /// Maximum number of team pairs with a last-known-good head-to-head result
    pub const HEAD_TO_HEAD_PAIRS: usize = 256;
}

/// Environment variable names
pub mod env_vars {
    /// Environment variable for API domain override
    pub const API_DOMAIN: &str = "STATLINE_API_DOMAIN";

    /// Environment variable for the upstream credential
    pub const API_KEY: &str = "STATLINE_API_KEY";

    /// Environment variable for log file path override
    pub const LOG_FILE: &str = "STATLINE_LOG_FILE";

    /// Environment variable for HTTP timeout override in seconds
    pub const HTTP_TIMEOUT: &str = "STATLINE_HTTP_TIMEOUT";

    /// Environment variable for durable cache directory override
    pub const CACHE_DIR: &str = "STATLINE_CACHE_DIR";

    /// Environment variable for default league override
    pub const LEAGUE: &str = "STATLINE_LEAGUE";
}

/// Retry configuration
pub mod retry {
    /// Total attempts (first try included) for throttled or faulted calls
    pub const MAX_ATTEMPTS: u32 = 4;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 1000;

    /// Maximum delay between retries (milliseconds)
    pub const MAX_DELAY_MS: u64 = 8000;

    /// Jitter applied to each backoff delay (+/- fraction of the delay)
    pub const JITTER_FRACTION: f64 = 0.2;

    /// Longest Retry-After value honoured (seconds)
    pub const MAX_RETRY_AFTER_SECONDS: u64 = 30;
}

/// Team catalog bootstrap
pub mod catalog {
    /// Page size for the paged bootstrap
    pub const PAGE_SIZE: usize = 500;

    /// Maximum pages walked by the paged bootstrap
    pub const MAX_PAGES: usize = 5;

    /// Durable cache key of the bulk catalog record
    pub const BULK_KEY: &str = "teams_all";
}

/// Head-to-head empty-result guard
pub mod head_to_head {
    /// Delay before the single retry after an empty result (milliseconds)
    pub const RETRY_DELAY_MS: u64 = 500;
}

/// Logging and diagnostics
pub mod logging {
    /// Characters of a rejected response body kept in the error log
    pub const ERROR_BODY_PREVIEW_CHARS: usize = 200;

    /// Characters of a successful response body logged at debug level
    pub const DEBUG_BODY_PREVIEW_CHARS: usize = 1024;
}

/// Limits for match search helpers
pub mod search {
    /// Most days walked backwards when looking for a team's latest match
    pub const MAX_DAYS_BACK: u32 = 30;

    /// Default look-back window of the per-team statistics request (days)
    pub const TEAM_STATS_LOOKBACK_DAYS: i64 = 30;

    /// Time zone sent with the per-team statistics request
    pub const TEAM_STATS_TIMEZONE: &str = "Europe/London";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_constants_are_reasonable() {
        // Live data expires first, team metadata last
        assert!(cache_ttl::LIVE_MATCH_SECONDS < cache_ttl::MATCH_DETAIL_SECONDS);
        assert!(cache_ttl::MATCH_DETAIL_SECONDS < cache_ttl::TEAM_METADATA_SECONDS);
        assert_eq!(cache_ttl::CATALOG_SECONDS, 24 * 60 * 60);

        // Negative resolutions must expire before positive ones
        assert!(cache_ttl::RESOLUTION_NEGATIVE_SECONDS < cache_ttl::RESOLUTION_POSITIVE_SECONDS);
    }

    #[test]
    fn test_retry_constants_are_reasonable() {
        assert_eq!(retry::MAX_ATTEMPTS, 4);
        assert!(retry::BASE_DELAY_MS > 0);
        assert!(retry::MAX_DELAY_MS >= retry::BASE_DELAY_MS);
        assert!((0.0..1.0).contains(&retry::JITTER_FRACTION));
    }

    #[test]
    fn test_capacities_are_non_zero() {
        assert!(capacity::MEMORY_TIER_ENTRIES > 0);
        assert!(capacity::RESOLUTION_ENTRIES > 0);
        assert!(capacity::HEAD_TO_HEAD_PAIRS > 0);
    }

    #[test]
    fn test_env_var_names_share_prefix() {
        for name in [
            env_vars::API_DOMAIN,
            env_vars::API_KEY,
            env_vars::LOG_FILE,
            env_vars::HTTP_TIMEOUT,
            env_vars::CACHE_DIR,
            env_vars::LEAGUE,
        ] {
            assert!(name.starts_with("STATLINE_"), "{name}");
        }
    }
}
