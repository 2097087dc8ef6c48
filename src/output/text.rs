//! Text output formatter for human-readable display
//!
//! Entries are grouped per repository, one line each, followed by a
//! summary line with the run totals.

use crate::domain::{EntryOutcome, EntryReport, RunSummary};
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self::with_color(verbosity, true)
    }

    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    /// Whether an entry is worth a line at the current verbosity
    fn is_visible(&self, outcome: &EntryOutcome) -> bool {
        match self.verbosity {
            Verbosity::Quiet => outcome.is_proposal() || outcome.is_failure(),
            Verbosity::Normal => !matches!(outcome, EntryOutcome::UpToDate { .. }),
            Verbosity::Verbose => true,
        }
    }

    fn status_label(&self, outcome: &EntryOutcome) -> String {
        let label = match outcome {
            EntryOutcome::NoVersionFound => "missing",
            EntryOutcome::UpToDate { .. } => "ok",
            EntryOutcome::AlreadyProposed { .. } => "open",
            EntryOutcome::WouldPropose { .. } => "would",
            EntryOutcome::ProposalCreated { .. } => "new",
            EntryOutcome::Failed { .. } => "error",
        };
        let padded = format!("{:7}", label);

        if !self.color {
            return padded;
        }
        match outcome {
            EntryOutcome::NoVersionFound => padded.yellow().to_string(),
            EntryOutcome::UpToDate { .. } | EntryOutcome::AlreadyProposed { .. } => {
                padded.dimmed().to_string()
            }
            EntryOutcome::WouldPropose { .. } => padded.cyan().to_string(),
            EntryOutcome::ProposalCreated { .. } => padded.green().bold().to_string(),
            EntryOutcome::Failed { .. } => padded.red().bold().to_string(),
        }
    }

    fn format_entry(
        &self,
        report: &EntryReport,
        name_width: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let detail = match &report.outcome {
            EntryOutcome::WouldPropose {
                current,
                latest,
                branch,
            }
            | EntryOutcome::ProposalCreated {
                current,
                latest,
                branch,
            }
            | EntryOutcome::AlreadyProposed {
                current,
                latest,
                branch,
            } => {
                if self.color {
                    format!(
                        "{} {} {} {}",
                        current.dimmed(),
                        "→".dimmed(),
                        latest.bright_white().bold(),
                        format!("({})", branch).dimmed()
                    )
                } else {
                    format!("{} -> {} ({})", current, latest, branch)
                }
            }
            other => other.to_string(),
        };

        writeln!(
            writer,
            "  {} {:width$} {}",
            self.status_label(&report.outcome),
            report.software,
            detail,
            width = name_width
        )
    }

    fn format_totals(&self, summary: &RunSummary, writer: &mut dyn Write) -> std::io::Result<()> {
        let proposed_label = if summary.dry_run {
            "would be proposed"
        } else {
            "proposed"
        };
        let checked = summary.entries_checked();
        let proposed = summary.updates_proposed();
        let errors = summary.errors();

        if self.color {
            let errors_display = if errors > 0 {
                errors.to_string().red().bold().to_string()
            } else {
                errors.to_string().dimmed().to_string()
            };
            writeln!(
                writer,
                "{} checked, {} {}, {} failed",
                checked.to_string().bold(),
                proposed.to_string().green(),
                proposed_label,
                errors_display
            )
        } else {
            writeln!(
                writer,
                "{} checked, {} {}, {} failed",
                checked, proposed, proposed_label, errors
            )
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, summary: &RunSummary, writer: &mut dyn Write) -> std::io::Result<()> {
        if summary.dry_run {
            let banner = "(dry-run) no branches or pull requests were created";
            if self.color {
                writeln!(writer, "{}", banner.cyan())?;
            } else {
                writeln!(writer, "{}", banner)?;
            }
        }

        let name_width = summary
            .entries
            .iter()
            .map(|e| e.software.len())
            .max()
            .unwrap_or(0)
            .max(12);

        let mut repos: Vec<&str> = Vec::new();
        for report in &summary.entries {
            if !repos.contains(&report.repo.as_str()) {
                repos.push(&report.repo);
            }
        }

        for repo in repos {
            let visible: Vec<&EntryReport> = summary
                .by_repo(repo)
                .filter(|r| self.is_visible(&r.outcome))
                .collect();
            if visible.is_empty() {
                continue;
            }

            if self.color {
                writeln!(writer, "{}", repo.bold())?;
            } else {
                writeln!(writer, "{}", repo)?;
            }
            for report in visible {
                self.format_entry(report, name_width, writer)?;
            }
        }

        self.format_totals(summary, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    fn summary(dry_run: bool) -> RunSummary {
        let mut summary = RunSummary::new(dry_run);
        summary.add_entry(EntryReport::new(
            "ocf/puppet",
            "widget",
            EntryOutcome::ProposalCreated {
                current: "2.0.0".to_string(),
                latest: "2.1.0".to_string(),
                branch: "u-widget-2.1.0".to_string(),
            },
        ));
        summary.add_entry(EntryReport::new(
            "ocf/puppet",
            "gadget",
            EntryOutcome::UpToDate {
                version: "1.0".to_string(),
            },
        ));
        summary.add_entry(EntryReport::new(
            "ocf/etc",
            "tool",
            EntryOutcome::Failed {
                kind: FailureKind::SourceUnavailable,
                message: "npm unavailable for tool: HTTP 503".to_string(),
            },
        ));
        summary.finish();
        summary
    }

    fn render(formatter: TextFormatter, summary: &RunSummary) -> String {
        let mut out = Vec::new();
        formatter.format(summary, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_normal_output_hides_up_to_date() {
        let output = render(
            TextFormatter::with_color(Verbosity::Normal, false),
            &summary(false),
        );

        assert!(output.contains("ocf/puppet"));
        assert!(output.contains("2.0.0 -> 2.1.0 (u-widget-2.1.0)"));
        assert!(!output.contains("gadget"));
        assert!(output.contains("HTTP 503"));
        assert!(output.contains("3 checked, 1 proposed, 1 failed"));
    }

    #[test]
    fn test_verbose_output_shows_everything() {
        let output = render(
            TextFormatter::with_color(Verbosity::Verbose, false),
            &summary(false),
        );
        assert!(output.contains("gadget"));
        assert!(output.contains("up to date at 1.0"));
    }

    #[test]
    fn test_dry_run_banner() {
        let output = render(
            TextFormatter::with_color(Verbosity::Normal, false),
            &summary(true),
        );
        assert!(output.starts_with("(dry-run)"));
        assert!(output.contains("would be proposed"));
    }

    #[test]
    fn test_empty_summary() {
        let output = render(
            TextFormatter::with_color(Verbosity::Normal, false),
            &RunSummary::new(false),
        );
        assert_eq!(output, "0 checked, 0 proposed, 0 failed\n");
    }
}
