//! crates.io API source
//!
//! Fetches crate information from crates.io.
//! API endpoint: https://crates.io/api/v1/crates/{crate_name}

use crate::domain::SourceType;
use crate::error::{ConfigError, SourceError};
use crate::source::{
    ensure_type, resolve_latest, HttpClient, SourceRequest, SourceSnapshot, VersionSource,
};
use async_trait::async_trait;
use serde::Deserialize;

/// crates.io base URL
pub const CRATES_IO_URL: &str = "https://crates.io";

/// crates.io crate response
#[derive(Debug, Deserialize)]
struct CratesIoResponse {
    /// Crate summary
    #[serde(rename = "crate")]
    krate: CrateInfo,
    /// Published versions, newest first
    #[serde(default)]
    versions: Vec<CrateVersion>,
}

/// Crate summary fields
#[derive(Debug, Deserialize)]
struct CrateInfo {
    /// Highest non-prerelease version
    max_stable_version: Option<String>,
    /// Most recently published version
    newest_version: Option<String>,
    /// Crate homepage
    homepage: Option<String>,
}

/// Version entry
#[derive(Debug, Deserialize)]
struct CrateVersion {
    /// Version number
    num: String,
    /// Whether this version is yanked
    #[serde(default)]
    yanked: bool,
}

/// Registry-style source backed by crates.io
pub struct CratesIoSource {
    client: HttpClient,
    base_url: String,
    id: String,
    filter: Option<String>,
    snapshot: Option<SourceSnapshot>,
}

impl CratesIoSource {
    /// Create a new crates.io source
    pub fn new(source_type: SourceType, request: SourceRequest) -> Result<Self, ConfigError> {
        ensure_type(SourceType::Crates, source_type)?;
        Ok(Self {
            client: request.client,
            base_url: request.endpoints.crates,
            id: request.id,
            filter: request.filter,
            snapshot: None,
        })
    }

    /// Constructor stored in the registration table
    pub fn boxed(
        source_type: SourceType,
        request: SourceRequest,
    ) -> Result<Box<dyn VersionSource>, ConfigError> {
        Ok(Box::new(Self::new(source_type, request)?))
    }

    /// Build the URL for a crate
    fn build_url(&self) -> String {
        format!(
            "{}/api/v1/crates/{}",
            self.base_url.trim_end_matches('/'),
            self.id
        )
    }

    fn snapshot(&self) -> Result<&SourceSnapshot, SourceError> {
        self.snapshot
            .as_ref()
            .ok_or_else(|| SourceError::not_refreshed(SourceType::Crates.display_name(), &self.id))
    }
}

#[async_trait]
impl VersionSource for CratesIoSource {
    fn source_type(&self) -> SourceType {
        SourceType::Crates
    }

    fn id(&self) -> &str {
        &self.id
    }

    async fn refresh(&mut self) -> Result<(), SourceError> {
        let url = self.build_url();
        let response: CratesIoResponse = self
            .client
            .get_json(&url, &self.id, SourceType::Crates.display_name())
            .await?;

        let CrateInfo {
            max_stable_version,
            newest_version,
            homepage,
        } = response.krate;

        self.snapshot = Some(SourceSnapshot {
            latest: max_stable_version.or(newest_version),
            homepage,
            all_versions: response
                .versions
                .into_iter()
                .filter(|v| !v.yanked)
                .map(|v| v.num)
                .collect(),
        });
        Ok(())
    }

    fn latest(&self) -> Result<String, SourceError> {
        resolve_latest(
            self.snapshot()?,
            self.filter.as_deref(),
            SourceType::Crates,
            &self.id,
        )
    }

    fn all_versions(&self) -> Result<&[String], SourceError> {
        Ok(&self.snapshot()?.all_versions)
    }

    fn project_homepage(&self) -> Result<Option<&str>, SourceError> {
        Ok(self.snapshot()?.homepage.as_deref())
    }
}
