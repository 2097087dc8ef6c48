//! Change proposals: idempotency gate and rendered text
//!
//! A proposal is a branch plus a pull request. The branch name is derived
//! from the software name and the target version, so a second run finds the
//! branch and reports `AlreadyProposed` instead of proposing again.

use crate::config::Settings;
use crate::domain::{ReconcileDecision, SoftwareEntry, Update};
use std::collections::HashSet;

/// Pull request body used when no template is configured
pub const DEFAULT_PR_TEMPLATE: &str = "\
This pull request was automatically generated by {bot_name}. Be sure to test it before merging!

You can find a changelog at {changelog_url}

If something looks wrong, contact {contact_info}.
";

/// Text used when neither a changelog nor a homepage is known
pub const NO_CHANGELOG: &str = "not available";

/// Deterministic branch name for a software/version pair
pub fn branch_key(name: &str, latest: &str) -> String {
    format!("u-{}-{}", name, latest)
}

/// Idempotency check between drift detection and any mutating call
pub struct ProposalGate;

impl ProposalGate {
    /// True when no existing branch already carries this proposal
    pub fn should_propose(key: &str, existing_branches: &HashSet<String>) -> bool {
        !existing_branches.contains(key)
    }

    /// Turn an `UpdateAvailable` into `AlreadyProposed` when its branch exists.
    ///
    /// Every other decision passes through unchanged.
    pub fn check(
        entry: &SoftwareEntry,
        decision: ReconcileDecision,
        existing_branches: &HashSet<String>,
    ) -> ReconcileDecision {
        match decision {
            ReconcileDecision::UpdateAvailable(update) => {
                let branch = branch_key(&entry.name, &update.latest);
                if Self::should_propose(&branch, existing_branches) {
                    ReconcileDecision::UpdateAvailable(update)
                } else {
                    ReconcileDecision::AlreadyProposed {
                        current: update.current,
                        latest: update.latest,
                        branch,
                    }
                }
            }
            other => other,
        }
    }
}

/// Everything needed to publish one proposal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub branch: String,
    pub base_branch: String,
    pub file: String,
    pub content: String,
    pub commit_message: String,
    pub title: String,
    pub body: String,
}

/// Renders proposal text from the bot identity and the body template
#[derive(Debug, Clone)]
pub struct ProposalRenderer {
    bot_name: String,
    contact_info: String,
    template: String,
}

impl ProposalRenderer {
    pub fn new(
        bot_name: impl Into<String>,
        contact_info: impl Into<String>,
        template: Option<String>,
    ) -> Self {
        Self {
            bot_name: bot_name.into(),
            contact_info: contact_info.into(),
            template: template.unwrap_or_else(|| DEFAULT_PR_TEMPLATE.to_string()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.bot_name.clone(),
            settings.contact_info.clone(),
            settings.pr_template.clone(),
        )
    }

    /// Changelog link: entry template, then project homepage, then a placeholder
    pub fn changelog_url(entry: &SoftwareEntry, update: &Update) -> String {
        entry
            .changelog_url(&update.latest)
            .or_else(|| update.homepage.clone())
            .unwrap_or_else(|| NO_CHANGELOG.to_string())
    }

    pub fn render_body(&self, changelog_url: &str) -> String {
        self.template
            .replace("{changelog_url}", changelog_url)
            .replace("{bot_name}", &self.bot_name)
            .replace("{contact_info}", &self.contact_info)
    }

    /// Build the full proposal for an update
    pub fn render(&self, entry: &SoftwareEntry, update: &Update, base_branch: &str) -> Proposal {
        Proposal {
            branch: branch_key(&entry.name, &update.latest),
            base_branch: base_branch.to_string(),
            file: entry.file().to_string(),
            content: update.new_content.clone(),
            commit_message: format!("automatically bump {} to {}", entry.name, update.latest),
            title: format!(
                "[Automatic] Update {} from {} to {}.",
                entry.name, update.current, update.latest
            ),
            body: self.render_body(&Self::changelog_url(entry, update)),
        }
    }
}
