//! Reconcile decisions and per-entry terminal outcomes

use crate::error::{EntryError, FailureKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A confirmed drift, with the rewritten file ready to commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    /// Version currently recorded in the file
    pub current: String,
    /// Version reported by the source
    pub latest: String,
    /// Full file content with the version substituted
    pub new_content: String,
    /// Project homepage reported by the source, if any
    pub homepage: Option<String>,
}

/// Terminal output of one reconcile cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileDecision {
    /// The file does not contain the tracked version token
    NoVersionFound,
    /// The recorded version equals the source's latest
    UpToDate { version: String },
    /// Drift detected and no proposal exists yet
    UpdateAvailable(Update),
    /// Drift detected but a proposal branch already targets this version
    AlreadyProposed {
        current: String,
        latest: String,
        branch: String,
    },
}

impl ReconcileDecision {
    /// Returns true if a proposal should be published for this decision
    pub fn is_update(&self) -> bool {
        matches!(self, ReconcileDecision::UpdateAvailable(_))
    }
}

/// Final state of one entry in one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EntryOutcome {
    /// Nothing to extract, entry skipped
    NoVersionFound,
    /// Already at the latest version
    UpToDate { version: String },
    /// A proposal for this version already exists
    AlreadyProposed {
        current: String,
        latest: String,
        branch: String,
    },
    /// Dry-run: a proposal would have been created
    WouldPropose {
        current: String,
        latest: String,
        branch: String,
    },
    /// Branch, commit and pull request were created
    ProposalCreated {
        current: String,
        latest: String,
        branch: String,
    },
    /// The entry failed; sibling entries are unaffected
    Failed { kind: FailureKind, message: String },
}

impl EntryOutcome {
    /// Creates a Failed outcome from an entry error
    pub fn failed(error: &EntryError) -> Self {
        EntryOutcome::Failed {
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    /// Returns true if this entry produced (or would produce) a proposal
    pub fn is_proposal(&self) -> bool {
        matches!(
            self,
            EntryOutcome::ProposalCreated { .. } | EntryOutcome::WouldPropose { .. }
        )
    }

    /// Returns true if this entry failed
    pub fn is_failure(&self) -> bool {
        matches!(self, EntryOutcome::Failed { .. })
    }

    /// Short name of the state, used in log lines
    pub fn state(&self) -> &'static str {
        match self {
            EntryOutcome::NoVersionFound => "no_version_found",
            EntryOutcome::UpToDate { .. } => "up_to_date",
            EntryOutcome::AlreadyProposed { .. } => "already_proposed",
            EntryOutcome::WouldPropose { .. } => "would_propose",
            EntryOutcome::ProposalCreated { .. } => "proposal_created",
            EntryOutcome::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for EntryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryOutcome::NoVersionFound => write!(f, "no current version found"),
            EntryOutcome::UpToDate { version } => write!(f, "up to date at {}", version),
            EntryOutcome::AlreadyProposed {
                current,
                latest,
                branch,
            } => write!(f, "{} → {} already proposed on {}", current, latest, branch),
            EntryOutcome::WouldPropose {
                current, latest, ..
            } => write!(f, "would update {} → {}", current, latest),
            EntryOutcome::ProposalCreated {
                current,
                latest,
                branch,
            } => write!(f, "proposed {} → {} on {}", current, latest, branch),
            EntryOutcome::Failed { kind, message } => write!(f, "{}: {}", kind, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;

    #[test]
    fn test_decision_is_update() {
        let update = ReconcileDecision::UpdateAvailable(Update {
            current: "1.0".to_string(),
            latest: "1.1".to_string(),
            new_content: "v = 1.1".to_string(),
            homepage: None,
        });
        assert!(update.is_update());
        assert!(!ReconcileDecision::NoVersionFound.is_update());
    }

    #[test]
    fn test_outcome_failed_from_error() {
        let err: EntryError = SourceError::unavailable("npm", "widget", "HTTP 502").into();
        let outcome = EntryOutcome::failed(&err);
        assert!(outcome.is_failure());
        assert_eq!(outcome.state(), "failed");
        assert!(outcome.to_string().contains("source unavailable"));
    }

    #[test]
    fn test_outcome_is_proposal() {
        let created = EntryOutcome::ProposalCreated {
            current: "2.0.0".to_string(),
            latest: "2.1.0".to_string(),
            branch: "u-widget-2.1.0".to_string(),
        };
        let would = EntryOutcome::WouldPropose {
            current: "2.0.0".to_string(),
            latest: "2.1.0".to_string(),
            branch: "u-widget-2.1.0".to_string(),
        };
        assert!(created.is_proposal());
        assert!(would.is_proposal());
        assert!(!EntryOutcome::NoVersionFound.is_proposal());
    }

    #[test]
    fn test_outcome_display() {
        let outcome = EntryOutcome::ProposalCreated {
            current: "2.0.0".to_string(),
            latest: "2.1.0".to_string(),
            branch: "u-widget-2.1.0".to_string(),
        };
        assert_eq!(
            outcome.to_string(),
            "proposed 2.0.0 → 2.1.0 on u-widget-2.1.0"
        );
    }

    #[test]
    fn test_outcome_serde_tag() {
        let outcome = EntryOutcome::UpToDate {
            version: "1.2.3".to_string(),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert_eq!(json, r#"{"state":"up_to_date","version":"1.2.3"}"#);
        let parsed: EntryOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, outcome);
    }
}
