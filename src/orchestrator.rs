//! Run orchestration across every configured entry
//!
//! This module provides:
//! - Preflight construction of every source and extractor
//! - Bounded parallel reconciliation with per-entry isolation
//! - Proposal gating and dry-run handling
//! - One log event per entry terminal state

use crate::config::{Config, Repository, Settings};
use crate::domain::{EntryOutcome, EntryReport, ReconcileDecision, RunSummary, SoftwareEntry};
use crate::error::{AppError, ConfigError, EntryError};
use crate::extract::Extractor;
use crate::hosting::{GitHubClient, HostingClient};
use crate::progress::Progress;
use crate::proposal::{ProposalGate, ProposalRenderer};
use crate::reconcile::reconcile;
use crate::source::{
    HttpClient, HttpSourceFactory, SourceFactory, VersionSource, DEFAULT_USER_AGENT,
};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// One entry ready to reconcile
struct Job<'a> {
    repo: &'a Repository,
    entry: &'a SoftwareEntry,
    extractor: Extractor,
    source: Box<dyn VersionSource>,
}

/// Orchestrator for coordinating a reconciliation run
pub struct Orchestrator {
    hosting: Arc<dyn HostingClient>,
    sources: Arc<dyn SourceFactory>,
    show_progress: bool,
}

impl Orchestrator {
    /// Create a new orchestrator over a hosting client and a source factory
    pub fn new(hosting: Arc<dyn HostingClient>, sources: Arc<dyn SourceFactory>) -> Self {
        Self {
            hosting,
            sources,
            show_progress: false,
        }
    }

    /// Create an orchestrator talking to GitHub and the public sources
    pub fn from_settings(settings: &Settings, token: &str) -> Result<Self, AppError> {
        let timeout = settings.timeout();
        let client = HttpClient::with_config(timeout, DEFAULT_USER_AGENT)?;
        let hosting = GitHubClient::new(
            token,
            settings.endpoints.github.clone(),
            timeout,
            DEFAULT_USER_AGENT,
        )?;
        let sources = HttpSourceFactory::new(client, settings.endpoints.clone());

        Ok(Self::new(Arc::new(hosting), Arc::new(sources)))
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Reconcile every entry in `config`.
    ///
    /// Configuration problems abort before any entry is processed. Every
    /// other failure is confined to its entry and recorded in the summary.
    pub async fn run_reconciliation(&self, config: &Config) -> Result<RunSummary, ConfigError> {
        let jobs = self.prepare(config)?;
        let dry_run = config.settings.dry_run;
        let renderer = ProposalRenderer::from_settings(&config.settings);
        let mut summary = RunSummary::new(dry_run);

        let mut progress = Progress::new(self.show_progress);
        progress.start(jobs.len() as u64, "Checking software");

        let progress_ref = &progress;
        let renderer_ref = &renderer;
        let reports: Vec<EntryReport> = stream::iter(jobs)
            .map(|job| async move {
                let report = self.run_entry(job, dry_run, renderer_ref).await;
                progress_ref.inc();
                report
            })
            .buffered(config.settings.concurrency.max(1))
            .collect()
            .await;

        progress.finish_and_clear();

        for report in reports {
            summary.add_entry(report);
        }
        summary.finish();
        Ok(summary)
    }

    /// Build every extractor and source up front
    fn prepare<'a>(&self, config: &'a Config) -> Result<Vec<Job<'a>>, ConfigError> {
        let mut jobs = Vec::with_capacity(config.entry_count());
        for repo in &config.repos {
            for entry in &repo.software {
                let extractor = Extractor::for_locator(&entry.name, &entry.locator)?;
                let source = self.sources.create(entry)?;
                jobs.push(Job {
                    repo,
                    entry,
                    extractor,
                    source,
                });
            }
        }
        debug!(entries = jobs.len(), "prepared entries");
        Ok(jobs)
    }

    async fn run_entry(&self, job: Job<'_>, dry_run: bool, renderer: &ProposalRenderer) -> EntryReport {
        let repo = job.repo.github_id.clone();
        let software = job.entry.name.clone();

        let outcome = match self.process(job, dry_run, renderer).await {
            Ok(outcome) => outcome,
            Err(e) => EntryOutcome::failed(&e),
        };
        log_outcome(&repo, &software, &outcome);

        EntryReport::new(repo, software, outcome)
    }

    async fn process(
        &self,
        mut job: Job<'_>,
        dry_run: bool,
        renderer: &ProposalRenderer,
    ) -> Result<EntryOutcome, EntryError> {
        let repo = job.repo;
        let entry = job.entry;

        let content = self
            .hosting
            .get_file(&repo.github_id, &repo.base_branch, entry.file())
            .await
            .map_err(EntryError::File)?;

        let decision = reconcile(entry, &job.extractor, &content, job.source.as_mut()).await?;
        let decision = if decision.is_update() {
            let branches = self.hosting.list_branches(&repo.github_id).await?;
            ProposalGate::check(entry, decision, &branches)
        } else {
            decision
        };

        match decision {
            ReconcileDecision::NoVersionFound => Ok(EntryOutcome::NoVersionFound),
            ReconcileDecision::UpToDate { version } => Ok(EntryOutcome::UpToDate { version }),
            ReconcileDecision::AlreadyProposed {
                current,
                latest,
                branch,
            } => Ok(EntryOutcome::AlreadyProposed {
                current,
                latest,
                branch,
            }),
            ReconcileDecision::UpdateAvailable(update) => {
                let proposal = renderer.render(entry, &update, &repo.base_branch);
                if dry_run {
                    return Ok(EntryOutcome::WouldPropose {
                        current: update.current,
                        latest: update.latest,
                        branch: proposal.branch,
                    });
                }

                self.hosting
                    .create_branch_with_commit(
                        &repo.github_id,
                        &proposal.base_branch,
                        &proposal.branch,
                        &proposal.commit_message,
                        &proposal.file,
                        &proposal.content,
                    )
                    .await?;
                let pull = self
                    .hosting
                    .create_pull_request(
                        &repo.github_id,
                        &proposal.title,
                        &proposal.body,
                        &proposal.branch,
                        &proposal.base_branch,
                    )
                    .await
                    .map_err(|source| EntryError::Undelivered {
                        branch: proposal.branch.clone(),
                        source,
                    })?;
                debug!(software = %entry.name, url = %pull.url, "opened pull request");

                Ok(EntryOutcome::ProposalCreated {
                    current: update.current,
                    latest: update.latest,
                    branch: proposal.branch,
                })
            }
        }
    }
}

/// Emit the single terminal-state event for an entry
fn log_outcome(repo: &str, software: &str, outcome: &EntryOutcome) {
    let state = outcome.state();
    match outcome {
        EntryOutcome::NoVersionFound => warn!(%repo, %software, %state, "{}", outcome),
        EntryOutcome::Failed { .. } => error!(%repo, %software, %state, "{}", outcome),
        _ => info!(%repo, %software, %state, "{}", outcome),
    }
}
