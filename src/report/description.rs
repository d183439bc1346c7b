//! Traceability tags embedded in test descriptions.
//!
//! Grammar: `<prefix>:<identifier>:<display name>`. The description is split on
//! `:` into at most three segments so the display name may itself contain colons.
//! The description is tagged when the second segment contains the configured marker.

/// Identifier used when a description carries no tag.
pub const NOT_DEFINED: &str = "Not defined";

const DELIMITER: char = ':';
const MAX_SEGMENTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDescription {
    pub identifier: String,
    pub display_name: String,
    pub is_tagged: bool,
}

/// Tagging convention for one reporter instance.
#[derive(Debug, Clone)]
pub struct DescriptionParser {
    marker: String,
    tagged_only: bool,
}

impl DescriptionParser {
    pub fn new(marker: impl Into<String>, tagged_only: bool) -> Self {
        Self { marker: marker.into(), tagged_only }
    }

    /// Returns `None` when the description is untagged and only tagged tests are reported.
    ///
    /// Tagged segments are trimmed. An untagged description becomes the display
    /// name verbatim, surrounding whitespace included, so the report carries the
    /// exact text the test declared.
    pub fn parse(&self, description: &str) -> Option<ParsedDescription> {
        let mut segments = description.splitn(MAX_SEGMENTS, DELIMITER);
        let _prefix = segments.next();

        if let Some(identifier) = segments.next().map(str::trim) {
            if !self.marker.is_empty() && identifier.contains(self.marker.as_str()) {
                let display_name = match segments.next().map(str::trim) {
                    Some(name) if !name.is_empty() => name.to_string(),
                    _ => description.to_string(),
                };
                return Some(ParsedDescription {
                    identifier: identifier.to_string(),
                    display_name,
                    is_tagged: true,
                });
            }
        }

        if self.tagged_only {
            return None;
        }

        Some(ParsedDescription {
            identifier: NOT_DEFINED.to_string(),
            display_name: description.to_string(),
            is_tagged: false,
        })
    }
}
