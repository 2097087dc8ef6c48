//! Helm chart repository source
//!
//! Reads the repository index.
//! API endpoint: {repository}/index.yaml
//!
//! The index lists every published version of each chart with no separate
//! latest pointer, so this is a catalog-style source. Versions keep the order
//! the index serves them in and the first one counts as latest.

use crate::domain::SourceType;
use crate::error::{ConfigError, SourceError};
use crate::source::{
    ensure_type, resolve_latest, HttpClient, SourceRequest, SourceSnapshot, VersionSource,
};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;

/// Repository index document
#[derive(Debug, Deserialize)]
struct HelmIndex {
    /// Published versions per chart name
    #[serde(default)]
    entries: HashMap<String, Vec<ChartVersion>>,
}

/// One published chart version
#[derive(Debug, Deserialize)]
struct ChartVersion {
    /// Chart version
    version: String,
    /// Project homepage
    #[serde(default)]
    home: Option<String>,
}

/// Catalog-style source backed by a Helm chart repository
pub struct HelmSource {
    client: HttpClient,
    repository: String,
    index_url: Url,
    chart: String,
    filter: Option<String>,
    snapshot: Option<SourceSnapshot>,
}

impl HelmSource {
    /// Create a new Helm source. The entry id is the repository URL.
    pub fn new(source_type: SourceType, request: SourceRequest) -> Result<Self, ConfigError> {
        ensure_type(SourceType::Helm, source_type)?;
        let index_url = index_url(&request.id)?;
        Ok(Self {
            client: request.client,
            repository: request.id,
            index_url,
            chart: request.chart,
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

    fn snapshot(&self) -> Result<&SourceSnapshot, SourceError> {
        self.snapshot
            .as_ref()
            .ok_or_else(|| SourceError::not_refreshed(SourceType::Helm.display_name(), &self.chart))
    }
}

/// Resolve `index.yaml` relative to the repository root
fn index_url(repository: &str) -> Result<Url, ConfigError> {
    let unsupported = |message: &str| ConfigError::UnsupportedRepository {
        url: repository.to_string(),
        message: message.to_string(),
    };

    let mut url = Url::parse(repository).map_err(|e| unsupported(&e.to_string()))?;
    match url.scheme() {
        "https" | "http" => {}
        "oci" => return Err(unsupported("OCI registries are not supported")),
        _ => return Err(unsupported("expected an http(s) URL")),
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.join("index.yaml")
        .map_err(|e| unsupported(&e.to_string()))
}

/// Build a snapshot from an index for one chart
fn snapshot_from_index(mut index: HelmIndex, chart: &str) -> Result<SourceSnapshot, SourceError> {
    let versions = index.entries.remove(chart).ok_or_else(|| {
        SourceError::invalid_response(
            SourceType::Helm.display_name(),
            chart,
            "chart not found in repository index",
        )
    })?;

    Ok(SourceSnapshot {
        latest: versions.first().map(|v| v.version.clone()),
        homepage: versions.first().and_then(|v| v.home.clone()),
        all_versions: versions.into_iter().map(|v| v.version).collect(),
    })
}

#[async_trait]
impl VersionSource for HelmSource {
    fn source_type(&self) -> SourceType {
        SourceType::Helm
    }

    fn id(&self) -> &str {
        &self.repository
    }

    async fn refresh(&mut self) -> Result<(), SourceError> {
        let registry = SourceType::Helm.display_name();
        let body = self
            .client
            .get_text(self.index_url.as_str(), &self.chart, registry)
            .await?;
        let index: HelmIndex = serde_yaml::from_str(&body).map_err(|e| {
            SourceError::invalid_response(
                registry,
                &self.chart,
                format!("failed to parse index.yaml: {}", e),
            )
        })?;

        self.snapshot = Some(snapshot_from_index(index, &self.chart)?);
        Ok(())
    }

    fn latest(&self) -> Result<String, SourceError> {
        resolve_latest(
            self.snapshot()?,
            self.filter.as_deref(),
            SourceType::Helm,
            &self.chart,
        )
    }

    fn all_versions(&self) -> Result<&[String], SourceError> {
        Ok(&self.snapshot()?.all_versions)
    }

    fn project_homepage(&self) -> Result<Option<&str>, SourceError> {
        Ok(self.snapshot()?.homepage.as_deref())
    }
}
