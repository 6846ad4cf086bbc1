use std::fmt;

use crate::error::StateError;

/// Separator used when none is configured.
pub const DEFAULT_SEPARATOR: char = '.';

/// Wildcards reserved for subscription patterns.
const WILDCARDS: [char; 2] = ['+', '#'];

/// A validated, concrete path into the state tree.
///
/// A path is one or more non-blank segments joined by a separator
/// (`phoneinput.checkout.number`). Wildcards (`+`, `#`) are only valid in
/// subscription patterns, never in a concrete path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatePath {
    raw: String,
    separator: char,
}

impl StatePath {
    /// Parse a path using the default `.` separator.
    pub fn parse(raw: &str) -> Result<Self, StateError> {
        Self::parse_with(raw, DEFAULT_SEPARATOR)
    }

    /// Parse a path using a custom separator.
    pub fn parse_with(raw: &str, separator: char) -> Result<Self, StateError> {
        if raw.is_empty() {
            return Err(StateError::MalformedPath("empty path".to_string()));
        }
        for segment in raw.split(separator) {
            check_segment(segment, separator, raw)?;
        }
        Ok(Self {
            raw: raw.to_string(),
            separator,
        })
    }

    /// Build a path from individual segments.
    pub fn from_segments<I, S>(segments: I, separator: char) -> Result<Self, StateError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(&separator.to_string());
        Self::parse_with(&joined, separator)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.raw.split(self.separator)
    }

    /// Append one segment. The segment may not contain the separator.
    pub fn child(&self, segment: &str) -> Result<Self, StateError> {
        check_segment(segment, self.separator, segment)?;
        if segment.contains(self.separator) {
            return Err(StateError::MalformedPath(format!(
                "segment '{}' contains separator '{}'",
                segment, self.separator
            )));
        }
        Ok(Self {
            raw: format!("{}{}{}", self.raw, self.separator, segment),
            separator: self.separator,
        })
    }

    /// Append every segment of `other`.
    pub fn join(&self, other: &StatePath) -> Self {
        let tail = other.raw.replace(other.separator, &self.separator.to_string());
        Self {
            raw: format!("{}{}{}", self.raw, self.separator, tail),
            separator: self.separator,
        }
    }

    /// The path without its last segment, `None` for a single-segment path.
    pub fn parent(&self) -> Option<Self> {
        self.raw.rfind(self.separator).map(|idx| Self {
            raw: self.raw[..idx].to_string(),
            separator: self.separator,
        })
    }

    /// Last segment.
    pub fn leaf(&self) -> &str {
        match self.raw.rfind(self.separator) {
            Some(idx) => &self.raw[idx + self.separator.len_utf8()..],
            None => &self.raw,
        }
    }

    /// Split into (substate path, value key).
    ///
    /// `phoneinput.a.number` -> `(Some(phoneinput.a), "number")`
    pub fn split_substate(&self) -> (Option<Self>, &str) {
        (self.parent(), self.leaf())
    }

    /// True if `prefix` equals this path or is one of its ancestors.
    pub fn starts_with(&self, prefix: &StatePath) -> bool {
        self.strip_prefix(prefix).is_some() || self.raw == prefix.raw
    }

    /// The remainder of this path below `prefix`, if `prefix` is an ancestor.
    pub fn strip_prefix(&self, prefix: &StatePath) -> Option<&str> {
        self.raw
            .strip_prefix(prefix.raw.as_str())
            .and_then(|rest| rest.strip_prefix(self.separator))
            .filter(|rest| !rest.is_empty())
    }

    /// Subscription pattern matching this path and everything beneath it.
    pub fn subtree_pattern(&self) -> String {
        format!("{}{}#", self.raw, self.separator)
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for StatePath {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

fn check_segment(segment: &str, separator: char, context: &str) -> Result<(), StateError> {
    if segment.trim().is_empty() {
        return Err(StateError::MalformedPath(format!(
            "blank segment in '{}' (separator '{}')",
            context, separator
        )));
    }
    if segment.contains(WILDCARDS) {
        return Err(StateError::MalformedPath(format!(
            "wildcard in concrete path '{}'",
            context
        )));
    }
    Ok(())
}
