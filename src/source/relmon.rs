//! release-monitoring.org source
//!
//! Fetches project information from Anitya.
//! API endpoint: https://release-monitoring.org/api/project/{id}

use crate::domain::SourceType;
use crate::error::{ConfigError, SourceError};
use crate::source::{
    ensure_type, resolve_latest, HttpClient, SourceRequest, SourceSnapshot, VersionSource,
};
use async_trait::async_trait;
use serde::Deserialize;

/// release-monitoring.org base URL
pub const RELMON_URL: &str = "https://release-monitoring.org";

/// Anitya project response
#[derive(Debug, Deserialize)]
struct RelmonProjectResponse {
    /// Latest version as determined by Anitya
    version: Option<String>,
    /// Known versions, newest first
    #[serde(default)]
    versions: Vec<String>,
    /// Project homepage
    homepage: Option<String>,
}

/// Registry-style source backed by release-monitoring.org
pub struct RelmonSource {
    client: HttpClient,
    base_url: String,
    id: String,
    filter: Option<String>,
    snapshot: Option<SourceSnapshot>,
}

impl RelmonSource {
    /// Create a new release-monitoring.org source
    pub fn new(source_type: SourceType, request: SourceRequest) -> Result<Self, ConfigError> {
        ensure_type(SourceType::Relmon, source_type)?;
        Ok(Self {
            client: request.client,
            base_url: request.endpoints.relmon,
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

    /// Build the URL for a project
    fn build_url(&self) -> String {
        format!("{}/api/project/{}", self.base_url.trim_end_matches('/'), self.id)
    }

    fn snapshot(&self) -> Result<&SourceSnapshot, SourceError> {
        self.snapshot
            .as_ref()
            .ok_or_else(|| SourceError::not_refreshed(SourceType::Relmon.display_name(), &self.id))
    }
}

#[async_trait]
impl VersionSource for RelmonSource {
    fn source_type(&self) -> SourceType {
        SourceType::Relmon
    }

    fn id(&self) -> &str {
        &self.id
    }

    async fn refresh(&mut self) -> Result<(), SourceError> {
        let url = self.build_url();
        let response: RelmonProjectResponse = self
            .client
            .get_json(&url, &self.id, SourceType::Relmon.display_name())
            .await?;

        self.snapshot = Some(SourceSnapshot {
            latest: response.version,
            homepage: response.homepage,
            all_versions: response.versions,
        });
        Ok(())
    }

    fn latest(&self) -> Result<String, SourceError> {
        resolve_latest(
            self.snapshot()?,
            self.filter.as_deref(),
            SourceType::Relmon,
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
