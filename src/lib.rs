//! Sports statistics reconciliation and caching layer
//!
//! This library sits in front of a sports-data API. It resolves free-text team
//! names to upstream identifiers, merges per-match team statistics from several
//! overlapping payloads into one best-effort record, and keeps a memory plus
//! on-disk cache so repeated lookups stay off the network.
//!
//! # Examples
//!
//! ```rust,no_run
//! use statline::config::Config;
//! use statline::data_fetcher::StatsService;
//! use statline::error::AppError;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AppError> {
//!     let config = Config::load().await?;
//!     let service = StatsService::from_config(&config)?;
//!
//!     // Head-to-head listing, with the latest meeting reconciled
//!     let report = service.get_head_to_head("Cowboys", "Eagles", None).await?;
//!     println!("{:?} with {} matches", report.status, report.matches.len());
//!
//!     // Statistics for a single match
//!     let reconciled = service.get_match_statistics(401_547_417).await;
//!     println!("home touchdowns: {}", reconciled.statistics.home.touchdowns);
//!
//!     service.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod constants;
pub mod data_fetcher;
pub mod error;
pub mod performance;
pub mod testing_utils;

// Re-export commonly used types for convenience
pub use config::Config;
pub use data_fetcher::models::{
    HeadToHeadStatus, MatchRef, StatField, StatRecord, TeamIdentity, TeamStatistics,
};
pub use data_fetcher::{HeadToHeadReport, Reconciled, StatsService, TieredCache};
pub use error::{AppError, ErrorKind};

// Re-export cache monitoring types for external tools
pub use data_fetcher::cache::{CacheInfo, CacheStats};

/// Current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
