use serde::Serialize;

use crate::data_fetcher::models::StatField;
use crate::error::{AppError, ErrorKind};

/// A fetch that failed while the rest of the reconciliation carried on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceError {
    pub source: String,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

/// Fields a source actually changed, per side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceContribution {
    pub source: String,
    pub home: Vec<StatField>,
    pub away: Vec<StatField>,
}

/// Metadata returned next to a best-effort result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    /// True when at least one fetch failed
    pub partial: bool,
    /// A previously reconciled record for the match filled remaining gaps
    pub merged_previous: bool,
    pub errors: Vec<SourceError>,
    pub contributions: Vec<SourceContribution>,
    pub notes: Vec<String>,
}

impl Diagnostics {
    pub fn record_error(&mut self, source: &str, error: &AppError) {
        self.partial = true;
        self.errors.push(SourceError {
            source: source.to_string(),
            kind: error.kind(),
            status: error.status(),
            message: error.to_string(),
        });
    }

    pub fn record_contribution(&mut self, source: &str, home: Vec<StatField>, away: Vec<StatField>) {
        self.contributions.push(SourceContribution {
            source: source.to_string(),
            home,
            away,
        });
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Folds another set of diagnostics in, e.g. from an enrichment step.
    pub fn absorb(&mut self, other: Diagnostics) {
        self.partial |= other.partial;
        self.merged_previous |= other.merged_previous;
        self.errors.extend(other.errors);
        self.contributions.extend(other.contributions);
        self.notes.extend(other.notes);
    }
}
