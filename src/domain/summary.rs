//! Run summary types
//!
//! Provides structures for tracking outcomes at entry and run levels.

use super::EntryOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one software entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryReport {
    /// Repository the entry belongs to (`owner/name`)
    pub repo: String,
    /// Software entry name
    pub software: String,
    /// Terminal state
    pub outcome: EntryOutcome,
}

impl EntryReport {
    /// Creates a new EntryReport
    pub fn new(repo: impl Into<String>, software: impl Into<String>, outcome: EntryOutcome) -> Self {
        Self {
            repo: repo.into(),
            software: software.into(),
            outcome,
        }
    }
}

/// Overall summary of one reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Whether this was a dry run
    pub dry_run: bool,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Per-entry outcomes, in configuration order
    pub entries: Vec<EntryReport>,
}

impl RunSummary {
    /// Creates a new RunSummary starting now
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            started_at: Utc::now(),
            finished_at: None,
            entries: Vec::new(),
        }
    }

    /// Adds an entry report
    pub fn add_entry(&mut self, report: EntryReport) {
        self.entries.push(report);
    }

    /// Marks the run as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Returns the number of entries checked
    pub fn entries_checked(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of proposals created (or that would be, in dry-run)
    pub fn updates_proposed(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_proposal()).count()
    }

    /// Returns the number of failed entries
    pub fn errors(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_failure()).count()
    }

    /// Returns true if any entry failed
    pub fn has_failures(&self) -> bool {
        self.errors() > 0
    }

    /// Returns all failed entries
    pub fn failures(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries.iter().filter(|e| e.outcome.is_failure())
    }

    /// Returns entries for a specific repository
    pub fn by_repo<'a>(&'a self, repo: &'a str) -> impl Iterator<Item = &'a EntryReport> {
        self.entries.iter().filter(move |e| e.repo == repo)
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new(false)
    }
}
