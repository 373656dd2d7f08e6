pub mod diagnostics;
pub mod engine;
pub mod head_to_head;
pub mod payload;
pub mod sources;

pub use diagnostics::{Diagnostics, SourceContribution, SourceError};
pub use engine::{HeadToHeadReport, Reconciled, ReconciliationEngine, reconciled_key};
pub use head_to_head::HeadToHeadStore;
pub use sources::{
    BoxScoreSource, CategorySource, SidePair, SourceInputs, StatSource, SummarySource,
    TopPerformersSource, default_sources,
};
