pub mod head_to_head;
pub mod matches;
pub mod stats;
pub mod team;

pub use head_to_head::{HeadToHeadCacheEntry, HeadToHeadStatus, team_pair_key};
pub use matches::MatchRef;
pub use stats::{PartialStats, StatField, StatRecord, TeamStatistics, contribute};
pub use team::{ResolutionSource, TeamId, TeamIdentity, TeamSummary, records};
