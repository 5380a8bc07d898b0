//! Route path type and segment validation.
//!
//! - Internal representation: always decoded, absolute, no trailing slash
//! - Request boundary: decode percent-encoding and strip query/fragment on input

use std::borrow::Borrow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PathIssue, Result, RouteError};

/// Characters hierarchical node stores reserve in item names.
const RESERVED_CHARS: [char; 5] = ['[', ']', '*', '|', ':'];

/// Normalized logical path inside one route tree.
///
/// Invariants:
/// - Always starts with `/`
/// - Never ends with `/` (except the root itself)
/// - Every segment passed [`validate_segment`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutePath(Arc<str>);

impl RoutePath {
    /// The tree root (`/`).
    pub fn root() -> Self {
        Self(Arc::from("/"))
    }

    /// Parse a logical path. The root is accepted.
    ///
    /// Repeated and trailing slashes collapse: `/a//b/` -> `/a/b`.
    pub fn parse(raw: &str) -> Result<Self> {
        let segments = split_segments(raw)?;
        Ok(Self::from_segments(&segments))
    }

    /// Parse a path taken from an incoming request.
    ///
    /// Percent-encoding is decoded and query string / fragment are dropped,
    /// so `/posts/hello%20world?v=1#top` resolves as `/posts/hello world`.
    pub fn from_request(encoded: &str) -> Result<Self> {
        use percent_encoding::percent_decode_str;

        let path = match url::Url::parse("http://localhost").and_then(|base| base.join(encoded)) {
            Ok(parsed) => percent_decode_str(parsed.path())
                .decode_utf8()
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| parsed.path().to_string()),
            Err(_) => encoded
                .split(['?', '#'])
                .next()
                .unwrap_or(encoded)
                .to_string(),
        };
        Self::parse(&path)
    }

    fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        if segments.is_empty() {
            return Self::root();
        }
        let mut path = String::new();
        for segment in segments {
            path.push('/');
            path.push_str(segment.as_ref());
        }
        Self(Arc::from(path))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.as_ref() == "/"
    }

    /// Iterate over segments (empty for the root).
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Last segment, `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// `/a/b` -> `/a`, `/a` -> `/`, `/` -> `None`
    pub fn parent(&self) -> Option<Self> {
        self.split_last().map(|(parent, _)| parent)
    }

    /// Split into parent path and last segment.
    pub fn split_last(&self) -> Option<(Self, &str)> {
        if self.is_root() {
            return None;
        }
        let idx = self.0.rfind('/')?;
        let parent = if idx == 0 {
            Self::root()
        } else {
            Self(Arc::from(&self.0[..idx]))
        };
        Some((parent, &self.0[idx + 1..]))
    }

    /// Append one segment. The segment is validated.
    pub fn join(&self, segment: &str) -> Result<Self> {
        validate_segment(segment).map_err(|issue| RouteError::invalid_path(segment, issue))?;
        Ok(self.join_unchecked(segment))
    }

    pub(crate) fn join_unchecked(&self, segment: &str) -> Self {
        if self.is_root() {
            Self(Arc::from(format!("/{segment}")))
        } else {
            Self(Arc::from(format!("{}/{segment}", self.0)))
        }
    }

    /// Append all segments of `other` (a path relative to this one).
    pub fn concat(&self, other: &RoutePath) -> Self {
        match (self.is_root(), other.is_root()) {
            (_, true) => self.clone(),
            (true, false) => other.clone(),
            (false, false) => Self(Arc::from(format!("{}{}", self.0, other.0))),
        }
    }

    /// Check if `self` is `ancestor` or lies below it.
    pub fn is_within(&self, ancestor: &RoutePath) -> bool {
        self.strip_ancestor(ancestor).is_some()
    }

    /// Make `self` relative to `ancestor`: `/r/en/a/b` within `/r/en` -> `/a/b`.
    pub fn strip_ancestor(&self, ancestor: &RoutePath) -> Option<Self> {
        if ancestor.is_root() {
            return Some(self.clone());
        }
        let rest = self.0.strip_prefix(ancestor.as_str())?;
        if rest.is_empty() {
            Some(Self::root())
        } else if rest.starts_with('/') {
            Some(Self(Arc::from(rest)))
        } else {
            // `/r/en-gb` is not within `/r/en`
            None
        }
    }
}

// ============================================================================
// PathSegmenter
// ============================================================================

/// Decompose a path into its ordered, non-empty segments.
///
/// Fails for empty or relative input and for anything that normalizes to the
/// root alone: operations taking a target must never fall back to the whole
/// tree on malformed input.
///
/// # Examples
/// ```
/// use routemap::core::segments;
/// assert_eq!(segments("/products/machines").unwrap(), vec!["products", "machines"]);
/// assert!(segments("/").is_err());
/// assert!(segments("").is_err());
/// ```
pub fn segments(path: &str) -> Result<Vec<&str>> {
    let segments = split_segments(path)?;
    if segments.is_empty() {
        return Err(RouteError::invalid_path(path, PathIssue::Root));
    }
    Ok(segments)
}

fn split_segments(path: &str) -> Result<Vec<&str>> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(RouteError::invalid_path(path, PathIssue::Empty));
    }
    if !trimmed.starts_with('/') {
        return Err(RouteError::invalid_path(path, PathIssue::NotAbsolute));
    }

    trimmed
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            validate_segment(s)
                .map(|()| s)
                .map_err(|issue| RouteError::invalid_path(path, issue))
        })
        .collect()
}

/// Validate a single path segment.
pub fn validate_segment(segment: &str) -> std::result::Result<(), PathIssue> {
    if segment.is_empty() {
        return Err(PathIssue::Empty);
    }
    if segment == "." || segment == ".." {
        return Err(PathIssue::DotSegment);
    }
    if segment.chars().any(char::is_control) {
        return Err(PathIssue::Control);
    }
    if segment.contains('\\') {
        return Err(PathIssue::Backslash);
    }
    if segment.contains('/') {
        return Err(PathIssue::Reserved('/'));
    }
    if let Some(ch) = segment.chars().find(|ch| RESERVED_CHARS.contains(ch)) {
        return Err(PathIssue::Reserved(ch));
    }
    Ok(())
}

// ============================================================================
// Trait impls
// ============================================================================

impl std::fmt::Display for RoutePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for RoutePath {
    fn default() -> Self {
        Self::root()
    }
}

impl AsRef<str> for RoutePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RoutePath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for RoutePath {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq<str> for RoutePath {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for RoutePath {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl Serialize for RoutePath {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RoutePath {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
