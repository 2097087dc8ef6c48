//! Pattern-mode extraction

use super::{Extraction, Parsed};
use regex::Regex;
use std::ops::Range;

/// Compile a locator pattern
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(pattern)
}

/// Extracts the version with a regular expression.
///
/// The first participating capture group is the version token; a pattern
/// without groups uses the whole match.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    regex: Regex,
}

impl PatternExtractor {
    pub fn new(regex: Regex) -> Self {
        Self { regex }
    }

    /// Byte span of the version token in the first match
    fn find(&self, content: &str) -> Option<Range<usize>> {
        let captures = self.regex.captures(content)?;
        let token = captures
            .iter()
            .skip(1)
            .flatten()
            .next()
            .or_else(|| captures.get(0))?;
        Some(token.range())
    }

    pub(crate) fn extract(&self, content: &str) -> Option<Extraction> {
        let span = self.find(content)?;
        Some(Extraction::new(
            content[span.clone()].to_string(),
            Parsed::Text {
                content: content.to_string(),
                span,
            },
        ))
    }
}
