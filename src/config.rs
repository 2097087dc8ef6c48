//! Configuration loading and validation
//!
//! The configuration file lists repositories, each with the software entries
//! tracked in it, plus global settings. Everything is validated up front so a
//! bad entry aborts the run before any network traffic.

use crate::domain::{Locator, SoftwareEntry, SourceType};
use crate::error::ConfigError;
use crate::extract::{compile_pattern, DocumentFormat};
use crate::hosting::GITHUB_API_URL;
use crate::source::{CRATES_IO_URL, NPM_REGISTRY_URL, RELMON_URL};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default configuration file name
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Default environment variable holding the hosting token
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_KEY";

/// Default number of entries reconciled in parallel
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default per-call HTTP timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default base branch for proposals
pub const DEFAULT_BASE_BRANCH: &str = "master";

/// Validated configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Global settings
    pub settings: Settings,
    /// Repositories and their tracked software
    pub repos: Vec<Repository>,
}

/// Global settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Report decisions without mutating anything
    pub dry_run: bool,
    /// Bot identity rendered into proposals
    pub bot_name: String,
    /// Contact rendered into proposals
    pub contact_info: String,
    /// Environment variable holding the hosting token
    pub token_env: String,
    /// Maximum number of entries reconciled at once
    pub concurrency: usize,
    /// Per-call HTTP timeout in seconds
    pub timeout_secs: u64,
    /// Optional pull request body template
    pub pr_template: Option<String>,
    /// Base URLs of every external service
    pub endpoints: Endpoints,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dry_run: false,
            bot_name: String::new(),
            contact_info: String::new(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            pr_template: None,
            endpoints: Endpoints::default(),
        }
    }
}

impl Settings {
    /// Per-call HTTP timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Look up the hosting token through `lookup`, usually `std::env::var`
    pub fn resolve_token(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, ConfigError> {
        lookup(&self.token_env)
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingToken {
                var: self.token_env.clone(),
            })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_name.trim().is_empty() {
            return Err(ConfigError::missing_setting("settings.bot_name"));
        }
        if self.contact_info.trim().is_empty() {
            return Err(ConfigError::missing_setting("settings.contact_info"));
        }
        if self.token_env.trim().is_empty() {
            return Err(ConfigError::missing_setting("settings.token_env"));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::invalid_value(
                "settings.concurrency",
                "must be at least 1",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "settings.timeout_secs",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Base URLs of the hosting API and every version source
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Endpoints {
    pub github: String,
    pub relmon: String,
    pub npm: String,
    pub crates: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            github: GITHUB_API_URL.to_string(),
            relmon: RELMON_URL.to_string(),
            npm: NPM_REGISTRY_URL.to_string(),
            crates: CRATES_IO_URL.to_string(),
        }
    }
}

/// A validated repository
#[derive(Debug, Clone, PartialEq)]
pub struct Repository {
    /// `owner/name` on the hosting service
    pub github_id: String,
    /// Branch proposals are based on and target
    pub base_branch: String,
    /// Tracked software entries
    pub software: Vec<SoftwareEntry>,
}

/// Raw file layout
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    settings: Option<Settings>,
    #[serde(default)]
    repo: Vec<RepoConfig>,
}

/// Raw `[[repo]]` table
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RepoConfig {
    github_id: String,
    #[serde(default)]
    base_branch: Option<String>,
    #[serde(default)]
    software: Vec<SoftwareConfig>,
}

/// Raw `[[repo.software]]` table
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SoftwareConfig {
    name: String,
    #[serde(rename = "type")]
    source_type: SourceType,
    id: String,
    #[serde(default)]
    filter: Option<String>,
    file: String,
    #[serde(default)]
    regex: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    changelog: Option<String>,
    #[serde(default)]
    chart: Option<String>,
}

impl SoftwareConfig {
    /// Validate and convert into a domain entry
    fn into_entry(self) -> Result<SoftwareEntry, ConfigError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ConfigError::invalid_entry("<unnamed>", "name must not be empty"));
        }
        if self.id.trim().is_empty() {
            return Err(ConfigError::invalid_entry(&name, "id must not be empty"));
        }
        if self.file.trim().is_empty() {
            return Err(ConfigError::invalid_entry(&name, "file must not be empty"));
        }
        if matches!(self.filter.as_deref(), Some("")) {
            return Err(ConfigError::invalid_entry(
                &name,
                "filter must not be empty; omit it instead",
            ));
        }

        match self.chart.as_deref() {
            Some(_) if self.source_type != SourceType::Helm => {
                return Err(ConfigError::invalid_entry(
                    &name,
                    "'chart' is only valid for helm sources",
                ))
            }
            Some(chart) if chart.trim().is_empty() => {
                return Err(ConfigError::invalid_entry(&name, "chart must not be empty"))
            }
            _ => {}
        }

        let locator = match (self.regex, self.key) {
            (Some(regex), None) => {
                compile_pattern(&regex).map_err(|e| ConfigError::InvalidPattern {
                    software: name.clone(),
                    message: e.to_string(),
                })?;
                Locator::Pattern {
                    file: self.file,
                    regex,
                }
            }
            (None, Some(key_path)) => {
                if key_path.split('.').any(|segment| segment.is_empty()) {
                    return Err(ConfigError::invalid_entry(
                        &name,
                        format!("invalid key path '{}'", key_path),
                    ));
                }
                if DocumentFormat::from_path(&self.file).is_none() {
                    return Err(ConfigError::UnsupportedDocument {
                        software: name,
                        file: self.file,
                    });
                }
                Locator::Field {
                    file: self.file,
                    key_path,
                }
            }
            (Some(_), Some(_)) => {
                return Err(ConfigError::invalid_entry(
                    &name,
                    "set either 'regex' or 'key', not both",
                ))
            }
            (None, None) => {
                return Err(ConfigError::invalid_entry(
                    &name,
                    "one of 'regex' or 'key' is required",
                ))
            }
        };

        Ok(SoftwareEntry {
            name,
            source_type: self.source_type,
            source_id: self.id,
            filter: self.filter,
            locator,
            changelog: self.changelog,
            chart: self.chart,
        })
    }
}

fn validate_github_id(github_id: &str) -> Result<(), ConfigError> {
    let mut parts = github_id.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(()),
        _ => Err(ConfigError::InvalidRepository {
            github_id: github_id.to_string(),
        }),
    }
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, path)
    }

    /// Parse and validate configuration content. `origin` is used in errors.
    pub fn parse(content: &str, origin: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| ConfigError::parse_error(origin.as_ref(), e.to_string()))?;

        let settings = file
            .settings
            .ok_or_else(|| ConfigError::missing_setting("settings"))?;
        settings.validate()?;

        let mut repos = Vec::with_capacity(file.repo.len());
        for repo in file.repo {
            validate_github_id(&repo.github_id)?;
            let software = repo
                .software
                .into_iter()
                .map(SoftwareConfig::into_entry)
                .collect::<Result<Vec<_>, _>>()?;
            repos.push(Repository {
                github_id: repo.github_id,
                base_branch: repo
                    .base_branch
                    .filter(|b| !b.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_BASE_BRANCH.to_string()),
                software,
            });
        }

        Ok(Self { settings, repos })
    }

    /// Restrict the configuration to entries with the given name
    pub fn select(mut self, name: &str) -> Result<Self, ConfigError> {
        for repo in &mut self.repos {
            repo.software.retain(|entry| entry.name == name);
        }
        self.repos.retain(|repo| !repo.software.is_empty());

        if self.repos.is_empty() {
            return Err(ConfigError::UnknownSoftware {
                name: name.to_string(),
            });
        }
        Ok(self)
    }

    /// Total number of tracked entries
    pub fn entry_count(&self) -> usize {
        self.repos.iter().map(|r| r.software.len()).sum()
    }
}
