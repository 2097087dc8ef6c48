//! Tracked software entries

use super::SourceType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy for locating the current version inside a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Regex capture from free-form text
    Pattern,
    /// Keyed lookup inside a TOML or JSON document
    StructuredField,
}

/// Where the version lives: the file plus a pattern or a key path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Locator {
    /// Regular expression; the first capture group (or whole match) is the version
    Pattern { file: String, regex: String },
    /// Dotted key path such as `widget.version`
    Field { file: String, key_path: String },
}

impl Locator {
    /// Path of the file holding the version
    pub fn file(&self) -> &str {
        match self {
            Locator::Pattern { file, .. } | Locator::Field { file, .. } => file,
        }
    }

    /// Extraction mode implied by this locator
    pub fn mode(&self) -> ExtractionMode {
        match self {
            Locator::Pattern { .. } => ExtractionMode::Pattern,
            Locator::Field { .. } => ExtractionMode::StructuredField,
        }
    }
}

/// One trackable version reference. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareEntry {
    /// Display identity, also part of the proposal branch key
    pub name: String,
    /// Which version source to query
    pub source_type: SourceType,
    /// Identity of the package within that source
    pub source_id: String,
    /// Versions containing this substring are never considered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Location of the version inside the repository
    pub locator: Locator,
    /// Changelog URL template, `{}` or `{version}` is replaced by the new version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,
    /// Chart name inside a Helm repository index, when it differs from `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<String>,
}

impl SoftwareEntry {
    /// Creates a new entry without filter or changelog
    pub fn new(
        name: impl Into<String>,
        source_type: SourceType,
        source_id: impl Into<String>,
        locator: Locator,
    ) -> Self {
        Self {
            name: name.into(),
            source_type,
            source_id: source_id.into(),
            filter: None,
            locator,
            changelog: None,
            chart: None,
        }
    }

    /// Sets the exclusion filter (builder pattern)
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Sets the changelog template (builder pattern)
    pub fn with_changelog(mut self, changelog: impl Into<String>) -> Self {
        self.changelog = Some(changelog.into());
        self
    }

    /// Sets the Helm chart name (builder pattern)
    pub fn with_chart(mut self, chart: impl Into<String>) -> Self {
        self.chart = Some(chart.into());
        self
    }

    /// Path of the file holding the version
    pub fn file(&self) -> &str {
        self.locator.file()
    }

    /// Chart to look up in a Helm index, defaulting to the software name
    pub fn chart_name(&self) -> &str {
        self.chart.as_deref().unwrap_or(&self.name)
    }

    /// Renders the changelog URL for a version, if a template is configured
    pub fn changelog_url(&self, version: &str) -> Option<String> {
        self.changelog
            .as_ref()
            .map(|template| template.replace("{version}", version).replace("{}", version))
    }
}

impl fmt::Display for SoftwareEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}:{}) in {}",
            self.name,
            self.source_type,
            self.source_id,
            self.file()
        )
    }
}
