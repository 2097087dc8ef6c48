//! Current-version extraction and in-place substitution
//!
//! This module provides:
//! - Pattern extraction from free-form text
//! - Structured-field extraction from TOML and JSON documents
//! - Substitution that leaves the parsed original untouched

mod pattern;
mod structured;

pub use pattern::{compile_pattern, PatternExtractor};
pub use structured::{DocumentFormat, FieldExtractor, KeyPath};

use crate::domain::Locator;
use crate::error::{ConfigError, ExtractError};
use std::ops::Range;

/// Extractor bound to one entry's locator
#[derive(Debug, Clone)]
pub enum Extractor {
    Pattern(PatternExtractor),
    Field(FieldExtractor),
}

impl Extractor {
    /// Build the extractor for a locator.
    ///
    /// `software` is only used to name the entry in errors.
    pub fn for_locator(software: &str, locator: &Locator) -> Result<Self, ConfigError> {
        match locator {
            Locator::Pattern { regex, .. } => {
                let regex = compile_pattern(regex).map_err(|e| ConfigError::InvalidPattern {
                    software: software.to_string(),
                    message: e.to_string(),
                })?;
                Ok(Extractor::Pattern(PatternExtractor::new(regex)))
            }
            Locator::Field { file, key_path } => {
                let format = DocumentFormat::from_path(file).ok_or_else(|| {
                    ConfigError::UnsupportedDocument {
                        software: software.to_string(),
                        file: file.clone(),
                    }
                })?;
                Ok(Extractor::Field(FieldExtractor::new(
                    file.clone(),
                    format,
                    KeyPath::parse(key_path),
                )))
            }
        }
    }

    /// Locate the current version. `Ok(None)` means the token is absent.
    pub fn extract(&self, content: &str) -> Result<Option<Extraction>, ExtractError> {
        match self {
            Extractor::Pattern(pattern) => Ok(pattern.extract(content)),
            Extractor::Field(field) => field.extract(content),
        }
    }

    /// Shorthand for the extracted version alone
    pub fn extract_current(&self, content: &str) -> Result<Option<String>, ExtractError> {
        Ok(self.extract(content)?.map(|e| e.current))
    }
}

/// A located version plus everything needed to substitute it later
#[derive(Debug, Clone)]
pub struct Extraction {
    current: String,
    parsed: Parsed,
}

/// Parsed form of the file the version was found in
#[derive(Debug, Clone)]
pub(crate) enum Parsed {
    /// Original text and the byte span of the version token
    Text { content: String, span: Range<usize> },
    /// Structured document and where the field lives in it
    Document {
        file: String,
        document: structured::Document,
        key_path: KeyPath,
    },
}

impl Extraction {
    pub(crate) fn new(current: String, parsed: Parsed) -> Self {
        Self { current, parsed }
    }

    /// The version currently recorded in the file
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Render the file with the version replaced by `new_version`.
    ///
    /// Structured documents are modified on a copy; the extraction itself
    /// can be substituted again or inspected afterwards.
    pub fn substitute(&self, new_version: &str) -> Result<String, ExtractError> {
        match &self.parsed {
            Parsed::Text { content, span } => {
                let mut updated =
                    String::with_capacity(content.len() - span.len() + new_version.len());
                updated.push_str(&content[..span.start]);
                updated.push_str(new_version);
                updated.push_str(&content[span.end..]);
                Ok(updated)
            }
            Parsed::Document {
                file,
                document,
                key_path,
            } => document.clone().set_and_render(file, key_path, new_version),
        }
    }
}
