//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ConfigError: Invalid or incomplete configuration (aborts the whole run)
//! - SourceError: Issues talking to a version source
//! - ExtractError: Issues reading the tracked file's structure
//! - HostingError: Issues with the git-hosting API
//! - EntryError: Any failure confined to a single software entry

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::SourceType;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Version source related errors raised outside of an entry
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Hosting related errors raised outside of an entry
    /// Hosting failure after drift was detected
    #[error(transparent)]
    Hosting(#[from] HostingError),

    /// The tracked file could not be fetched from the repository
    #[error(transparent)]
    File(HostingError),

    /// The proposal branch exists but its pull request was never opened
    #[error("branch '{branch}' was pushed without a pull request (delete it to retry): {source}")]
    Undelivered {
        branch: String,
        #[source]
        source: HostingError,
    },
}

/// Errors related to configuration. Always fatal for the run.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for the expected schema
    #[error("failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// A required global setting is missing or empty
    #[error("missing required setting '{field}'")]
    MissingSetting { field: String },

    /// A setting has an out-of-range value
    #[error("invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// A repository identifier is malformed
    #[error("invalid repository '{github_id}': expected 'owner/name'")]
    InvalidRepository { github_id: String },

    /// A software entry is malformed
    #[error("invalid software entry '{software}': {message}")]
    InvalidEntry { software: String, message: String },

    /// The extraction regex does not compile
    #[error("invalid pattern for '{software}': {message}")]
    InvalidPattern { software: String, message: String },

    /// Structured-field extraction on a file format we cannot edit
    #[error("unsupported structured file '{file}' for '{software}': expected .toml or .json")]
    UnsupportedDocument { software: String, file: String },

    /// A source constructor was handed an entry of another type
    #[error("source type mismatch: {constructor} source cannot be built for type '{requested}'")]
    SourceTypeMismatch {
        constructor: SourceType,
        requested: SourceType,
    },

    /// A Helm repository URL that cannot be queried over HTTP
    #[error("unsupported Helm repository '{url}': {message}")]
    UnsupportedRepository { url: String, message: String },

    /// The software filter named nothing in the configuration
    #[error("no software named '{name}' in the configuration")]
    UnknownSoftware { name: String },

    /// The hosting token environment variable is unset
    #[error("hosting token not found in environment variable {var}")]
    MissingToken { var: String },
}

/// Errors related to version sources
#[derive(Error, Debug)]
pub enum SourceError {
    /// The upstream endpoint failed, timed out, or returned a non-success status
    #[error("{registry} is unavailable for '{id}': {message}")]
    Unavailable {
        registry: String,
        id: String,
        message: String,
    },

    /// The upstream answered with a body we could not understand
    #[error("invalid response from {registry} for '{id}': {message}")]
    InvalidResponse {
        registry: String,
        id: String,
        message: String,
    },

    /// Every known version contains the filter substring
    #[error("no version of '{id}' on {registry} passes filter '{filter}'")]
    NoMatchingVersion {
        registry: String,
        id: String,
        filter: String,
    },

    /// A snapshot accessor was called before a successful refresh
    #[error("{registry} source for '{id}' was read before refresh")]
    NotRefreshed { registry: String, id: String },
}

/// Errors related to reading the tracked file
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The structured document could not be parsed or re-serialized
    #[error("failed to process {file}: {message}")]
    InvalidDocument { file: String, message: String },
}

/// Errors related to the git-hosting collaborator
#[derive(Error, Debug)]
pub enum HostingError {
    /// The requested file does not exist
    #[error("file '{path}' not found in {repo}")]
    NotFound { repo: String, path: String },

    /// The path resolves to something other than a single file
    #[error("path '{path}' in {repo} is not a single file")]
    AmbiguousPath { repo: String, path: String },

    /// The hosting API failed or timed out
    #[error("hosting API unavailable during {operation} on {repo}: {message}")]
    Unavailable {
        repo: String,
        operation: String,
        message: String,
    },

    /// A branch with the target name appeared concurrently
    #[error("branch '{branch}' already exists in {repo}")]
    Conflict { repo: String, branch: String },
}

/// Failure confined to one software entry
#[derive(Error, Debug)]
pub enum EntryError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Hosting(#[from] HostingError),

    /// The tracked file could not be fetched from the repository
    #[error(transparent)]
    File(HostingError),

    /// The proposal branch exists but its pull request was never opened
    #[error("branch '{branch}' was pushed without a pull request (delete it to retry): {source}")]
    Undelivered {
        branch: String,
        #[source]
        source: HostingError,
    },
}

/// Reporting class of an entry failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The version source could not be queried
    SourceUnavailable,
    /// The filter excluded every version
    NoMatchingVersion,
    /// The tracked file could not be fetched
    FileUnavailable,
    /// The tracked file could not be parsed
    ExtractionFailed,
    /// Drift was detected but the proposal could not be published
    HostingUnavailable,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::SourceUnavailable => "source unavailable",
            FailureKind::NoMatchingVersion => "no matching version",
            FailureKind::FileUnavailable => "file unavailable",
            FailureKind::ExtractionFailed => "extraction failed",
            FailureKind::HostingUnavailable => "hosting unavailable",
        };
        f.write_str(label)
    }
}

impl EntryError {
    /// Classify this failure for reporting
    pub fn kind(&self) -> FailureKind {
        match self {
            EntryError::Source(SourceError::NoMatchingVersion { .. }) => {
                FailureKind::NoMatchingVersion
            }
            EntryError::Source(_) => FailureKind::SourceUnavailable,
            EntryError::Extract(_) => FailureKind::ExtractionFailed,
            EntryError::File(_) => FailureKind::FileUnavailable,
            EntryError::Hosting(_) | EntryError::Undelivered { .. } => {
                FailureKind::HostingUnavailable
            }
        }
    }
}

impl ConfigError {
    /// Creates a new ParseError
    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ConfigError::ParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new MissingSetting error
    pub fn missing_setting(field: impl Into<String>) -> Self {
        ConfigError::MissingSetting {
            field: field.into(),
        }
    }

    /// Creates a new InvalidValue error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidEntry error
    pub fn invalid_entry(software: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidEntry {
            software: software.into(),
            message: message.into(),
        }
    }
}

impl SourceError {
    /// Creates a new Unavailable error
    pub fn unavailable(
        registry: impl Into<String>,
        id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        SourceError::Unavailable {
            registry: registry.into(),
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(
        registry: impl Into<String>,
        id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        SourceError::InvalidResponse {
            registry: registry.into(),
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates a new NotRefreshed error
    pub fn not_refreshed(registry: impl Into<String>, id: impl Into<String>) -> Self {
        SourceError::NotRefreshed {
            registry: registry.into(),
            id: id.into(),
        }
    }
}

impl ExtractError {
    /// Creates a new InvalidDocument error
    pub fn invalid_document(file: impl Into<String>, message: impl Into<String>) -> Self {
        ExtractError::InvalidDocument {
            file: file.into(),
            message: message.into(),
        }
    }
}

impl HostingError {
    /// Creates a new Unavailable error
    pub fn unavailable(
        repo: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        HostingError::Unavailable {
            repo: repo.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_missing_setting() {
        let err = ConfigError::missing_setting("bot_name");
        let msg = format!("{}", err);
        assert!(msg.contains("missing required setting"));
        assert!(msg.contains("bot_name"));
    }

    #[test]
    fn test_config_error_type_mismatch() {
        let err = ConfigError::SourceTypeMismatch {
            constructor: SourceType::Npm,
            requested: SourceType::Relmon,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("npm source cannot be built for type 'relmon'"));
    }

    #[test]
    fn test_source_error_unavailable() {
        let err = SourceError::unavailable("npm", "left-pad", "HTTP 503");
        let msg = format!("{}", err);
        assert!(msg.contains("npm is unavailable"));
        assert!(msg.contains("HTTP 503"));
    }

    #[test]
    fn test_source_error_no_matching_version() {
        let err = SourceError::NoMatchingVersion {
            registry: "npm".to_string(),
            id: "react".to_string(),
            filter: "rc".to_string(),
        };
        assert!(err.to_string().contains("passes filter 'rc'"));
    }

    #[test]
    fn test_hosting_error_conflict() {
        let err = HostingError::Conflict {
            repo: "ocf/puppet".to_string(),
            branch: "u-widget-2.1.0".to_string(),
        };
        assert!(err.to_string().contains("u-widget-2.1.0"));
    }

    #[test]
    fn test_entry_error_kinds() {
        let err: EntryError = SourceError::unavailable("npm", "x", "timeout").into();
        assert_eq!(err.kind(), FailureKind::SourceUnavailable);

        let err: EntryError = SourceError::NoMatchingVersion {
            registry: "npm".to_string(),
            id: "x".to_string(),
            filter: "beta".to_string(),
        }
        .into();
        assert_eq!(err.kind(), FailureKind::NoMatchingVersion);

        let err = EntryError::File(HostingError::NotFound {
            repo: "a/b".to_string(),
            path: "Makefile".to_string(),
        });
        assert_eq!(err.kind(), FailureKind::FileUnavailable);

        let err = EntryError::File(HostingError::unavailable("a/b", "get file", "HTTP 503"));
        assert_eq!(err.kind(), FailureKind::FileUnavailable);

        let err = EntryError::Undelivered {
            branch: "u-widget-2.1.0".to_string(),
            source: HostingError::unavailable("a/b", "create pull request", "500"),
        };
        assert_eq!(err.kind(), FailureKind::HostingUnavailable);
        assert!(err.to_string().contains("u-widget-2.1.0"));

        let err: EntryError = HostingError::unavailable("a/b", "create pull request", "500").into();
        assert_eq!(err.kind(), FailureKind::HostingUnavailable);

        let err: EntryError = ExtractError::invalid_document("versions.toml", "bad").into();
        assert_eq!(err.kind(), FailureKind::ExtractionFailed);
    }

    #[test]
    fn test_app_error_from_config_error() {
        let app_err: AppError = ConfigError::missing_setting("contact_info").into();
        assert!(app_err.to_string().contains("contact_info"));
    }

    #[test]
    fn test_failure_kind_display() {
        assert_eq!(
            FailureKind::HostingUnavailable.to_string(),
            "hosting unavailable"
        );
        assert_eq!(FailureKind::SourceUnavailable.to_string(), "source unavailable");
    }
}
