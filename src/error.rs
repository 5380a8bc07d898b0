//! Route mapper error types.

use thiserror::Error;

use crate::content::ContentId;
use crate::core::RoutePath;
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, RouteError>;

// ============================================================================
// RouteError
// ============================================================================

/// Errors surfaced by the route mapper.
///
/// Every variant is returned to the caller unchanged; the mapper never retries.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Malformed or degenerate path argument.
    #[error("invalid path `{path}`: {issue}")]
    InvalidPath { path: String, issue: PathIssue },

    /// A different content entity already owns the target path.
    #[error("resource locator `{path}` already exists")]
    AlreadyExists { path: String },

    /// Lookup target absent.
    #[error("{target} not found")]
    NotFound { target: String },

    /// Lookup hit a superseded path; `location` is where the content lives now.
    #[error("resource locator `{path}` moved to `{location}`")]
    Moved {
        path: RoutePath,
        location: RoutePath,
        content: ContentId,
    },

    /// Deletion argument that would wipe more than a single subtree.
    #[error("refusing to delete {0}")]
    InvalidArgument(String),

    /// Underlying node store failure.
    #[error(transparent)]
    Store(StoreError),
}

impl RouteError {
    pub(crate) fn invalid_path(path: &str, issue: PathIssue) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            issue,
        }
    }

    pub(crate) fn not_found(target: impl Into<String>) -> Self {
        Self::NotFound {
            target: target.into(),
        }
    }

    /// Check if this error should be served as a redirect.
    pub const fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }

    /// Check if this error is a 404-equivalent condition.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StoreError> for RouteError {
    fn from(err: StoreError) -> Self {
        match err {
            // Commit-time conflicts mean another session claimed the path first
            StoreError::Conflict { path } => Self::AlreadyExists { path },
            other => Self::Store(other),
        }
    }
}

// ============================================================================
// PathIssue
// ============================================================================

/// Why a path or segment was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathIssue {
    #[error("path must not be empty")]
    Empty,
    #[error("path must start with '/'")]
    NotAbsolute,
    #[error("path must not be the tree root")]
    Root,
    #[error("path contains '.' or '..' segments")]
    DotSegment,
    #[error("path contains control characters")]
    Control,
    #[error("path contains a backslash")]
    Backslash,
    #[error("path contains reserved character '{0}'")]
    Reserved(char),
}
