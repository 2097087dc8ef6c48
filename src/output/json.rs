//! JSON output formatter for machine processing

use crate::domain::{EntryReport, RunSummary};
use crate::output::{OutputFormatter, Verbosity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Quiet drops up-to-date and informational entries
    verbosity: Verbosity,
}

impl JsonFormatter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of the run
#[derive(Serialize)]
struct JsonOutput<'a> {
    dry_run: bool,
    started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_at: Option<DateTime<Utc>>,
    summary: JsonTotals,
    entries: Vec<&'a EntryReport>,
}

#[derive(Serialize)]
struct JsonTotals {
    entries_checked: usize,
    updates_proposed: usize,
    errors: usize,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, summary: &RunSummary, writer: &mut dyn Write) -> std::io::Result<()> {
        let entries = summary
            .entries
            .iter()
            .filter(|e| {
                self.verbosity != Verbosity::Quiet
                    || e.outcome.is_proposal()
                    || e.outcome.is_failure()
            })
            .collect();

        let output = JsonOutput {
            dry_run: summary.dry_run,
            started_at: summary.started_at,
            finished_at: summary.finished_at,
            summary: JsonTotals {
                entries_checked: summary.entries_checked(),
                updates_proposed: summary.updates_proposed(),
                errors: summary.errors(),
            },
            entries,
        };

        serde_json::to_writer_pretty(&mut *writer, &output)?;
        writeln!(writer)
    }
}
