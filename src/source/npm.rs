//! npm Registry source
//!
//! Fetches package metadata from the npm registry.
//! API endpoint: https://registry.npmjs.org/{package}
//!
//! The registry has no single "latest" field, only the `latest` dist-tag, so
//! this is a catalog-style source. Versions are ordered newest first by their
//! publish time.

use crate::domain::SourceType;
use crate::error::{ConfigError, SourceError};
use crate::source::{
    ensure_type, resolve_latest, HttpClient, SourceRequest, SourceSnapshot, VersionSource,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::cmp::Reverse;
use std::collections::HashMap;

/// npm registry base URL
pub const NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// npm package metadata response
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    /// Distribution tags, e.g. `latest`, `next`
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
    /// Available versions, in document order
    #[serde(default)]
    versions: serde_json::Map<String, serde_json::Value>,
    /// Publish time per version, plus `created`/`modified`/`unpublished` bookkeeping
    #[serde(default)]
    time: HashMap<String, serde_json::Value>,
    /// Project homepage
    homepage: Option<String>,
}

/// Catalog-style source backed by the npm registry
pub struct NpmSource {
    client: HttpClient,
    base_url: String,
    id: String,
    filter: Option<String>,
    snapshot: Option<SourceSnapshot>,
}

impl NpmSource {
    /// Create a new npm source
    pub fn new(source_type: SourceType, request: SourceRequest) -> Result<Self, ConfigError> {
        ensure_type(SourceType::Npm, source_type)?;
        Ok(Self {
            client: request.client,
            base_url: request.endpoints.npm,
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

    /// Encode package name for URL (handles scoped packages)
    fn encode_package_name(package_name: &str) -> String {
        if package_name.starts_with('@') {
            // Scoped package: @scope/name -> @scope%2Fname
            package_name.replace('/', "%2F")
        } else {
            package_name.to_string()
        }
    }

    /// Build the URL for a package
    fn build_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            Self::encode_package_name(&self.id)
        )
    }

    fn snapshot(&self) -> Result<&SourceSnapshot, SourceError> {
        self.snapshot
            .as_ref()
            .ok_or_else(|| SourceError::not_refreshed(SourceType::Npm.display_name(), &self.id))
    }
}

/// Order versions newest first by publish time.
///
/// This intentionally departs from the document order of `versions`; the
/// filter scan depends on newest-first order. Versions without a parseable
/// timestamp follow, in reverse document order.
fn order_versions(
    versions: &serde_json::Map<String, serde_json::Value>,
    time: &HashMap<String, serde_json::Value>,
) -> Vec<String> {
    let mut ordered: Vec<(Option<DateTime<Utc>>, usize, &String)> = versions
        .keys()
        .enumerate()
        .map(|(index, version)| {
            let published = time
                .get(version)
                .and_then(|t| t.as_str())
                .and_then(|t| t.parse::<DateTime<Utc>>().ok());
            (published, index, version)
        })
        .collect();

    // Some(_) sorts above None, so Reverse puts timestamped versions first
    ordered.sort_by_key(|(published, index, _)| Reverse((*published, *index)));

    ordered
        .into_iter()
        .map(|(_, _, version)| version.clone())
        .collect()
}

#[async_trait]
impl VersionSource for NpmSource {
    fn source_type(&self) -> SourceType {
        SourceType::Npm
    }

    fn id(&self) -> &str {
        &self.id
    }

    async fn refresh(&mut self) -> Result<(), SourceError> {
        let url = self.build_url();
        let response: NpmPackageResponse = self
            .client
            .get_json(&url, &self.id, SourceType::Npm.display_name())
            .await?;

        self.snapshot = Some(SourceSnapshot {
            latest: response.dist_tags.get("latest").cloned(),
            homepage: response.homepage,
            all_versions: order_versions(&response.versions, &response.time),
        });
        Ok(())
    }

    fn latest(&self) -> Result<String, SourceError> {
        resolve_latest(
            self.snapshot()?,
            self.filter.as_deref(),
            SourceType::Npm,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use mockito::Server;

    fn make_source(base_url: &str, id: &str, filter: Option<&str>) -> NpmSource {
        let endpoints = Endpoints {
            npm: base_url.to_string(),
            ..Endpoints::default()
        };
        NpmSource::new(
            SourceType::Npm,
            SourceRequest {
                id: id.to_string(),
                filter: filter.map(str::to_string),
                chart: id.to_string(),
                client: HttpClient::new().unwrap(),
                endpoints,
            },
        )
        .unwrap()
    }

    const BODY: &str = r#"{
        "name": "widget",
        "dist-tags": {"latest": "2.1.0", "next": "3.0.0-beta.2"},
        "homepage": "https://widget.dev",
        "versions": {
            "1.0.0": {},
            "2.0.0": {},
            "2.1.0": {},
            "3.0.0-beta.1": {},
            "3.0.0-beta.2": {}
        },
        "time": {
            "created": "2019-01-01T00:00:00.000Z",
            "modified": "2024-06-01T00:00:00.000Z",
            "1.0.0": "2019-01-01T00:00:00.000Z",
            "2.0.0": "2022-03-01T00:00:00.000Z",
            "2.1.0": "2023-05-01T00:00:00.000Z",
            "3.0.0-beta.1": "2024-04-01T00:00:00.000Z",
            "3.0.0-beta.2": "2024-05-01T00:00:00.000Z"
        }
    }"#;

    #[test]
    fn test_build_url() {
        let source = make_source("https://registry.npmjs.org", "lodash", None);
        assert_eq!(source.build_url(), "https://registry.npmjs.org/lodash");
    }

    #[test]
    fn test_build_url_scoped_package() {
        let source = make_source("https://registry.npmjs.org", "@types/node", None);
        assert_eq!(
            source.build_url(),
            "https://registry.npmjs.org/@types%2Fnode"
        );
    }

    #[test]
    fn test_order_versions_by_publish_time() {
        let versions: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(r#"{"1.0.0": {}, "1.1.0": {}, "1.0.1": {}}"#).unwrap();
        let time: HashMap<String, serde_json::Value> = serde_json::from_str(
            r#"{
                "1.0.0": "2020-01-01T00:00:00Z",
                "1.1.0": "2020-02-01T00:00:00Z",
                "1.0.1": "2020-03-01T00:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(order_versions(&versions, &time), vec!["1.0.1", "1.1.0", "1.0.0"]);
    }

    #[test]
    fn test_order_versions_without_time_reverses_document_order() {
        let versions: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(r#"{"a": {}, "b": {}, "c": {}}"#).unwrap();
        let time: HashMap<String, serde_json::Value> =
            serde_json::from_str(r#"{"a": "2020-01-01T00:00:00Z", "unpublished": {"time": "x"}}"#)
                .unwrap();

        assert_eq!(order_versions(&versions, &time), vec!["a", "c", "b"]);
    }

    #[tokio::test]
    async fn test_latest_uses_dist_tag_without_filter() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/widget")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BODY)
            .create_async()
            .await;

        let mut source = make_source(&server.url(), "widget", None);
        source.refresh().await.unwrap();

        mock.assert_async().await;
        assert_eq!(source.latest().unwrap(), "2.1.0");
        assert_eq!(source.project_homepage().unwrap(), Some("https://widget.dev"));
        assert_eq!(
            source.all_versions().unwrap()[0],
            "3.0.0-beta.2".to_string()
        );
    }

    #[tokio::test]
    async fn test_latest_with_filter_returns_first_clean_version() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/widget")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BODY)
            .create_async()
            .await;

        let mut source = make_source(&server.url(), "widget", Some("beta"));
        source.refresh().await.unwrap();

        assert_eq!(source.latest().unwrap(), "2.1.0");
    }

    #[tokio::test]
    async fn test_latest_with_filter_matching_everything() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/widget")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BODY)
            .create_async()
            .await;

        let mut source = make_source(&server.url(), "widget", Some("."));
        source.refresh().await.unwrap();

        assert!(matches!(
            source.latest(),
            Err(SourceError::NoMatchingVersion { .. })
        ));
    }

    #[tokio::test]
    async fn test_refresh_not_found_is_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body(r#"{"error": "Not found"}"#)
            .create_async()
            .await;

        let mut source = make_source(&server.url(), "missing", None);
        let result = source.refresh().await;

        assert!(matches!(result, Err(SourceError::Unavailable { .. })));
    }
}
