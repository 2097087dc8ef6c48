//! Version source type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported version sources, named as they appear in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// release-monitoring.org (Anitya)
    Relmon,
    /// npm registry
    Npm,
    /// crates.io
    Crates,
    /// Helm chart repository (`index.yaml`)
    Helm,
}

/// How a source exposes its notion of "latest"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStyle {
    /// Upstream publishes a single latest pointer
    Registry,
    /// Upstream publishes a version collection plus a distribution tag
    Catalog,
}

impl SourceType {
    /// Returns the configuration name of this source type
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Relmon => "relmon",
            SourceType::Npm => "npm",
            SourceType::Crates => "crates",
            SourceType::Helm => "helm",
        }
    }

    /// Returns the human-facing registry name
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceType::Relmon => "release-monitoring.org",
            SourceType::Npm => "npm",
            SourceType::Crates => "crates.io",
            SourceType::Helm => "Helm repository",
        }
    }

    /// Returns the style of this source
    pub fn style(&self) -> SourceStyle {
        match self {
            SourceType::Relmon | SourceType::Crates => SourceStyle::Registry,
            SourceType::Npm | SourceType::Helm => SourceStyle::Catalog,
        }
    }

    /// Returns all supported source types
    pub fn all() -> &'static [SourceType] {
        &[
            SourceType::Relmon,
            SourceType::Npm,
            SourceType::Crates,
            SourceType::Helm,
        ]
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styles() {
        assert_eq!(SourceType::Relmon.style(), SourceStyle::Registry);
        assert_eq!(SourceType::Crates.style(), SourceStyle::Registry);
        assert_eq!(SourceType::Npm.style(), SourceStyle::Catalog);
        assert_eq!(SourceType::Helm.style(), SourceStyle::Catalog);
    }

    #[test]
    fn test_display() {
        assert_eq!(SourceType::Relmon.to_string(), "relmon");
        assert_eq!(SourceType::Npm.display_name(), "npm");
        assert_eq!(SourceType::Crates.display_name(), "crates.io");
    }

    #[test]
    fn test_serde_lowercase() {
        let parsed: SourceType = serde_json::from_str("\"relmon\"").unwrap();
        assert_eq!(parsed, SourceType::Relmon);
        assert!(serde_json::from_str::<SourceType>("\"pypi\"").is_err());
    }

    #[test]
    fn test_all() {
        assert_eq!(SourceType::all().len(), 4);
        let parsed: SourceType = serde_json::from_str("\"helm\"").unwrap();
        assert_eq!(parsed, SourceType::Helm);
    }
}
