//! Git-hosting collaborator
//!
//! The reconcile core only needs four operations from the hosting service:
//! read a file, list branches, commit a file onto a new branch and open a
//! pull request. `GitHubClient` implements them over the GitHub REST API.

mod github;

pub use github::{GitHubClient, GITHUB_API_URL};

use crate::error::HostingError;
use async_trait::async_trait;
use std::collections::HashSet;

/// A pull request that was opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub url: String,
}

/// Operations consumed from the hosting service. `repo` is `owner/name`.
#[async_trait]
pub trait HostingClient: Send + Sync {
    /// Content of a single file on `branch`
    async fn get_file(&self, repo: &str, branch: &str, path: &str) -> Result<String, HostingError>;

    /// Names of every branch in the repository
    async fn list_branches(&self, repo: &str) -> Result<HashSet<String>, HostingError>;

    /// Create `new_branch` from `base_branch` with one commit replacing `path`
    async fn create_branch_with_commit(
        &self,
        repo: &str,
        base_branch: &str,
        new_branch: &str,
        commit_message: &str,
        path: &str,
        content: &str,
    ) -> Result<(), HostingError>;

    /// Open a pull request from `head` into `base`
    async fn create_pull_request(
        &self,
        repo: &str,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequest, HostingError>;
}
