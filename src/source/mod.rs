//! Version sources for fetching upstream release information
//!
//! This module provides:
//! - The `VersionSource` capability trait
//! - A closed registration table mapping source types to constructors
//! - release-monitoring.org, npm, crates.io and Helm repository sources
//! - The filter contract shared by every source

mod client;
mod crates_io;
mod helm;
mod npm;
mod relmon;

pub use client::{HttpClient, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use crates_io::{CratesIoSource, CRATES_IO_URL};
pub use helm::HelmSource;
pub use npm::{NpmSource, NPM_REGISTRY_URL};
pub use relmon::{RelmonSource, RELMON_URL};

use crate::config::Endpoints;
use crate::domain::{SoftwareEntry, SourceType};
use crate::error::{ConfigError, SourceError};
use async_trait::async_trait;
use tracing::debug;

/// Version metadata captured by one successful refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSnapshot {
    /// The source's own latest pointer (a distribution tag for catalogs)
    pub latest: Option<String>,
    /// Project homepage, if published
    pub homepage: Option<String>,
    /// All versions in the source's native ordering
    pub all_versions: Vec<String>,
}

/// One external registry or catalog, bound to one package identity.
///
/// Accessors fail with `SourceError::NotRefreshed` until `refresh` has
/// succeeded; that is a programming error rather than an upstream failure.
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// The source type this instance was built for
    fn source_type(&self) -> SourceType;

    /// The package identity within the source
    fn id(&self) -> &str;

    /// Query the upstream endpoint and replace the snapshot
    async fn refresh(&mut self) -> Result<(), SourceError>;

    /// The latest version, honoring the configured filter
    fn latest(&self) -> Result<String, SourceError>;

    /// Every known version in the source's native ordering
    fn all_versions(&self) -> Result<&[String], SourceError>;

    /// The project homepage, if the source publishes one
    fn project_homepage(&self) -> Result<Option<&str>, SourceError>;
}

/// Everything a constructor needs to bind a source to one entry
#[derive(Clone)]
pub struct SourceRequest {
    /// Package identity within the source
    pub id: String,
    /// Exclusion substring
    pub filter: Option<String>,
    /// Chart name, only consulted by Helm repositories
    pub chart: String,
    /// Shared HTTP client
    pub client: HttpClient,
    /// Base URLs for every source
    pub endpoints: Endpoints,
}

/// Constructor signature stored in the registration table
pub type SourceConstructor =
    fn(SourceType, SourceRequest) -> Result<Box<dyn VersionSource>, ConfigError>;

/// Registration table: the only place new source types are wired in
const SOURCE_TABLE: &[(SourceType, SourceConstructor)] = &[
    (SourceType::Relmon, RelmonSource::boxed as SourceConstructor),
    (SourceType::Npm, NpmSource::boxed as SourceConstructor),
    (SourceType::Crates, CratesIoSource::boxed as SourceConstructor),
    (SourceType::Helm, HelmSource::boxed as SourceConstructor),
];

/// Look up the constructor registered for a source type
pub fn constructor_for(source_type: SourceType) -> Option<SourceConstructor> {
    SOURCE_TABLE
        .iter()
        .find(|(registered, _)| *registered == source_type)
        .map(|(_, constructor)| *constructor)
}

/// Build the source declared by a software entry
pub fn create_source(
    entry: &SoftwareEntry,
    client: HttpClient,
    endpoints: Endpoints,
) -> Result<Box<dyn VersionSource>, ConfigError> {
    let constructor = constructor_for(entry.source_type).ok_or_else(|| {
        ConfigError::invalid_entry(
            &entry.name,
            format!("no source registered for type '{}'", entry.source_type),
        )
    })?;

    debug!(
        software = %entry.name,
        source = %entry.source_type,
        style = ?entry.source_type.style(),
        "building version source"
    );
    constructor(
        entry.source_type,
        SourceRequest {
            id: entry.source_id.clone(),
            filter: entry.filter.clone(),
            chart: entry.chart_name().to_string(),
            client,
            endpoints,
        },
    )
}

/// Fail construction when a constructor is handed another type
pub(crate) fn ensure_type(
    constructor: SourceType,
    requested: SourceType,
) -> Result<(), ConfigError> {
    if constructor == requested {
        Ok(())
    } else {
        Err(ConfigError::SourceTypeMismatch {
            constructor,
            requested,
        })
    }
}

/// First version that does not contain the filter substring
pub fn first_unfiltered<'a>(versions: &'a [String], filter: &str) -> Option<&'a String> {
    versions.iter().find(|version| !version.contains(filter))
}

/// Resolve "latest" from a snapshot under the shared filter contract.
///
/// Without a filter the source's own pointer is returned verbatim. With a
/// filter, `all_versions` is scanned in native order and the first version
/// not containing the filter wins.
pub(crate) fn resolve_latest(
    snapshot: &SourceSnapshot,
    filter: Option<&str>,
    source_type: SourceType,
    id: &str,
) -> Result<String, SourceError> {
    match filter {
        Some(filter) => first_unfiltered(&snapshot.all_versions, filter)
            .cloned()
            .ok_or_else(|| SourceError::NoMatchingVersion {
                registry: source_type.display_name().to_string(),
                id: id.to_string(),
                filter: filter.to_string(),
            }),
        None => snapshot.latest.clone().ok_or_else(|| {
            SourceError::invalid_response(
                source_type.display_name(),
                id,
                "no latest version reported",
            )
        }),
    }
}

/// Factory seam between the orchestrator and concrete sources
pub trait SourceFactory: Send + Sync {
    /// Build the source for one entry. Construction never touches the network.
    fn create(&self, entry: &SoftwareEntry) -> Result<Box<dyn VersionSource>, ConfigError>;
}

/// Factory producing HTTP-backed sources from the registration table
#[derive(Clone)]
pub struct HttpSourceFactory {
    client: HttpClient,
    endpoints: Endpoints,
}

impl HttpSourceFactory {
    /// Create a new factory
    pub fn new(client: HttpClient, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }
}

impl SourceFactory for HttpSourceFactory {
    fn create(&self, entry: &SoftwareEntry) -> Result<Box<dyn VersionSource>, ConfigError> {
        create_source(entry, self.client.clone(), self.endpoints.clone())
    }
}
