//! GitHub REST API client

use super::{HostingClient, PullRequest};
use crate::error::HostingError;
use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::iter;
use std::time::Duration;
use tracing::debug;

/// Default base URL for the GitHub API
pub const GITHUB_API_URL: &str = "https://api.github.com";

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";
const API_VERSION: &str = "2022-11-28";
const BRANCHES_PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct ContentEntry {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct Branch {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitCommit {
    tree: GitObject,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
    html_url: String,
}

/// Hosting client backed by the GitHub REST API
#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: Url,
    token: String,
    timeout: Duration,
}

impl GitHubClient {
    /// Create a client authenticating with `token`
    pub fn new(
        token: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, HostingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                HostingError::unavailable(
                    "",
                    "client setup",
                    format!("failed to create HTTP client: {}", e),
                )
            })?;

        let base_url = base_url.into();
        let base_url = Url::parse(&base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                HostingError::unavailable(
                    "",
                    "client setup",
                    format!("invalid API base URL '{}'", base_url),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            token: token.into(),
            timeout,
        })
    }

    /// `{base}/repos/{owner}/{name}/{segments...}`, each segment percent-encoded
    fn url<'a>(
        &self,
        repo: &str,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, HostingError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| HostingError::unavailable(repo, "build request", "API base URL has no path"))?
            .pop_if_empty()
            .push("repos")
            .extend(repo.split('/'))
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.request_accepting(method, url, JSON_MEDIA_TYPE)
    }

    fn request_accepting(&self, method: Method, url: Url, accept: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, accept)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Send a request; transport failures and timeouts become `Unavailable`
    async fn send(
        &self,
        request: RequestBuilder,
        repo: &str,
        operation: &str,
    ) -> Result<Response, HostingError> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                HostingError::unavailable(
                    repo,
                    operation,
                    format!("timed out after {}s", self.timeout.as_secs()),
                )
            } else {
                HostingError::unavailable(repo, operation, e.to_string())
            }
        })
    }

    /// Fail on any non-success status
    fn ensure_success(
        response: Response,
        repo: &str,
        operation: &str,
    ) -> Result<Response, HostingError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(HostingError::unavailable(
                repo,
                operation,
                format!("HTTP {}", status),
            ))
        }
    }

    async fn read_json<T: DeserializeOwned>(
        response: Response,
        repo: &str,
        operation: &str,
    ) -> Result<T, HostingError> {
        response.json::<T>().await.map_err(|e| {
            HostingError::unavailable(repo, operation, format!("failed to parse response: {}", e))
        })
    }

    async fn call_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        repo: &str,
        operation: &str,
    ) -> Result<T, HostingError> {
        let response = self.send(request, repo, operation).await?;
        let response = Self::ensure_success(response, repo, operation)?;
        Self::read_json(response, repo, operation).await
    }
}

#[async_trait]
impl HostingClient for GitHubClient {
    async fn get_file(&self, repo: &str, branch: &str, path: &str) -> Result<String, HostingError> {
        let operation = "get file";
        let mut url = self.url(
            repo,
            iter::once("contents").chain(path.trim_start_matches('/').split('/')),
        )?;
        url.query_pairs_mut().append_pair("ref", branch);
        debug!(%repo, %path, %branch, "fetching file");

        // Metadata first: a directory or submodule must not be mistaken for a file
        let response = self
            .send(self.request(Method::GET, url.clone()), repo, operation)
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(HostingError::NotFound {
                repo: repo.to_string(),
                path: path.to_string(),
            });
        }
        let response = Self::ensure_success(response, repo, operation)?;
        let metadata: serde_json::Value = Self::read_json(response, repo, operation).await?;
        let is_file = serde_json::from_value::<ContentEntry>(metadata)
            .map(|entry| entry.kind == "file")
            .unwrap_or(false);
        if !is_file {
            return Err(HostingError::AmbiguousPath {
                repo: repo.to_string(),
                path: path.to_string(),
            });
        }

        let request = self.request_accepting(Method::GET, url, RAW_MEDIA_TYPE);
        let response = self.send(request, repo, operation).await?;
        let response = Self::ensure_success(response, repo, operation)?;
        response
            .text()
            .await
            .map_err(|e| HostingError::unavailable(repo, operation, e.to_string()))
    }

    async fn list_branches(&self, repo: &str) -> Result<HashSet<String>, HostingError> {
        let mut branches = HashSet::new();
        let mut page = 1;

        loop {
            let mut url = self.url(repo, ["branches"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &BRANCHES_PER_PAGE.to_string())
                .append_pair("page", &page.to_string());
            let batch: Vec<Branch> = self
                .call_json(self.request(Method::GET, url), repo, "list branches")
                .await?;
            let done = batch.len() < BRANCHES_PER_PAGE;
            branches.extend(batch.into_iter().map(|b| b.name));
            if done {
                break;
            }
            page += 1;
        }

        debug!(%repo, count = branches.len(), "listed branches");
        Ok(branches)
    }

    async fn create_branch_with_commit(
        &self,
        repo: &str,
        base_branch: &str,
        new_branch: &str,
        commit_message: &str,
        path: &str,
        content: &str,
    ) -> Result<(), HostingError> {
        let operation = "create branch";

        let base: GitRef = self
            .call_json(
                self.request(
                    Method::GET,
                    self.url(repo, ["git", "ref", "heads"].into_iter().chain(base_branch.split('/')))?,
                ),
                repo,
                operation,
            )
            .await?;
        let parent = base.object.sha;

        let parent_commit: GitCommit = self
            .call_json(
                self.request(Method::GET, self.url(repo, ["git", "commits", parent.as_str()])?),
                repo,
                operation,
            )
            .await?;

        let tree: GitObject = self
            .call_json(
                self.request(Method::POST, self.url(repo, ["git", "trees"])?).json(&json!({
                    "base_tree": parent_commit.tree.sha,
                    "tree": [{
                        "path": path.trim_start_matches('/'),
                        "mode": "100644",
                        "type": "blob",
                        "content": content,
                    }],
                })),
                repo,
                operation,
            )
            .await?;

        let commit: GitObject = self
            .call_json(
                self.request(Method::POST, self.url(repo, ["git", "commits"])?).json(&json!({
                    "message": commit_message,
                    "tree": tree.sha,
                    "parents": [parent],
                })),
                repo,
                operation,
            )
            .await?;

        let request = self
            .request(Method::POST, self.url(repo, ["git", "refs"])?)
            .json(&json!({
                "ref": format!("refs/heads/{}", new_branch),
                "sha": commit.sha,
            }));
        let response = self.send(request, repo, operation).await?;
        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(HostingError::Conflict {
                repo: repo.to_string(),
                branch: new_branch.to_string(),
            });
        }
        Self::ensure_success(response, repo, operation)?;

        debug!(%repo, branch = %new_branch, "created branch");
        Ok(())
    }

    async fn create_pull_request(
        &self,
        repo: &str,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequest, HostingError> {
        let pull: PullResponse = self
            .call_json(
                self.request(Method::POST, self.url(repo, ["pulls"])?).json(&json!({
                    "title": title,
                    "body": body,
                    "head": head,
                    "base": base,
                })),
                repo,
                "create pull request",
            )
            .await?;

        Ok(PullRequest {
            number: pull.number,
            url: pull.html_url,
        })
    }
}
