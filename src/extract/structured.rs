//! Structured-field extraction for TOML and JSON documents
//!
//! TOML goes through `toml_edit` so comments, spacing and key order survive
//! a substitution. JSON is re-serialized pretty with key order preserved.

use super::{Extraction, Parsed};
use crate::error::ExtractError;
use std::path::Path;
use toml_edit::DocumentMut;

/// Document formats supported in structured-field mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Json,
}

impl DocumentFormat {
    /// Detect the format from a file extension
    pub fn from_path(file: impl AsRef<Path>) -> Option<Self> {
        let extension = file.as_ref().extension()?.to_str()?;
        match extension.to_ascii_lowercase().as_str() {
            "toml" => Some(DocumentFormat::Toml),
            "json" => Some(DocumentFormat::Json),
            _ => None,
        }
    }
}

/// Dotted key path, e.g. `app.version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn parse(path: &str) -> Self {
        Self(path.split('.').map(str::to_string).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for KeyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// A parsed structured document
#[derive(Debug, Clone)]
pub(crate) enum Document {
    Toml(DocumentMut),
    Json {
        value: serde_json::Value,
        trailing_newline: bool,
    },
}

impl Document {
    fn parse(format: DocumentFormat, file: &str, content: &str) -> Result<Self, ExtractError> {
        match format {
            DocumentFormat::Toml => content
                .parse::<DocumentMut>()
                .map(Document::Toml)
                .map_err(|e| ExtractError::invalid_document(file, e.to_string())),
            DocumentFormat::Json => serde_json::from_str(content)
                .map(|value| Document::Json {
                    value,
                    trailing_newline: content.ends_with('\n'),
                })
                .map_err(|e| ExtractError::invalid_document(file, e.to_string())),
        }
    }

    /// String value at `key_path`; anything else counts as absent
    fn lookup(&self, key_path: &KeyPath) -> Option<&str> {
        match self {
            Document::Toml(document) => {
                let mut item = document.as_item();
                for segment in key_path.segments() {
                    item = item.get(segment.as_str())?;
                }
                item.as_str()
            }
            Document::Json { value, .. } => {
                let mut value = value;
                for segment in key_path.segments() {
                    value = value.get(segment.as_str())?;
                }
                value.as_str()
            }
        }
    }

    /// Set the field and serialize. Consumes the document, so callers pass a copy.
    pub(crate) fn set_and_render(
        self,
        file: &str,
        key_path: &KeyPath,
        new_version: &str,
    ) -> Result<String, ExtractError> {
        let missing =
            || ExtractError::invalid_document(file, format!("'{}' is not a string field", key_path));

        match self {
            Document::Toml(mut document) => {
                let mut item = document.as_item_mut();
                for segment in key_path.segments() {
                    item = item.get_mut(segment.as_str()).ok_or_else(missing)?;
                }
                let value = item
                    .as_value_mut()
                    .filter(|v| v.is_str())
                    .ok_or_else(missing)?;

                // Keep surrounding whitespace and trailing comments
                let decor = value.decor().clone();
                *value = toml_edit::Value::from(new_version);
                *value.decor_mut() = decor;

                Ok(document.to_string())
            }
            Document::Json {
                mut value,
                trailing_newline,
            } => {
                let mut field = &mut value;
                for segment in key_path.segments() {
                    field = field.get_mut(segment.as_str()).ok_or_else(missing)?;
                }
                if !field.is_string() {
                    return Err(missing());
                }
                *field = serde_json::Value::String(new_version.to_string());

                let mut rendered = serde_json::to_string_pretty(&value)
                    .map_err(|e| ExtractError::invalid_document(file, e.to_string()))?;
                if trailing_newline {
                    rendered.push('\n');
                }
                Ok(rendered)
            }
        }
    }
}

/// Extracts the version from a keyed field of a structured document
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    file: String,
    format: DocumentFormat,
    key_path: KeyPath,
}

impl FieldExtractor {
    pub fn new(file: impl Into<String>, format: DocumentFormat, key_path: KeyPath) -> Self {
        Self {
            file: file.into(),
            format,
            key_path,
        }
    }

    pub(crate) fn extract(&self, content: &str) -> Result<Option<Extraction>, ExtractError> {
        let document = Document::parse(self.format, &self.file, content)?;
        let Some(current) = document.lookup(&self.key_path).map(str::to_string) else {
            return Ok(None);
        };

        Ok(Some(Extraction::new(
            current,
            Parsed::Document {
                file: self.file.clone(),
                document,
                key_path: self.key_path.clone(),
            },
        )))
    }
}
