pub mod api;
pub mod cache;
pub mod models;
pub mod reconcile;
pub mod resolver;
pub mod service;

pub use api::{MatchQuery, RequestClient};
pub use cache::{Clock, DataClass, ManualClock, SystemClock, TieredCache};
pub use models::{MatchRef, StatRecord, TeamIdentity, TeamStatistics};
pub use reconcile::{HeadToHeadReport, Reconciled, ReconciliationEngine};
pub use resolver::{FallbackTable, TeamCatalog, TeamResolver};
pub use service::{ServiceStats, StatsService, TeamStatisticsReport};
