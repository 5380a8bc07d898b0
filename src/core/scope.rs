//! Route tree scopes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::path::{RoutePath, validate_segment};
use crate::error::{Result, RouteError};

/// Default layout of scope roots inside the node store.
pub const DEFAULT_ROOT_TEMPLATE: &str = "/cmf/{workspace}/routes/{locale}";

/// The (workspace, locale) pair rooting one independent route tree.
///
/// Paths are unique only within a scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    workspace: String,
    locale: String,
}

impl Scope {
    /// Create a scope. Both parts become store path segments and are validated.
    pub fn new(workspace: impl Into<String>, locale: impl Into<String>) -> Result<Self> {
        let workspace = workspace.into();
        let locale = locale.into();
        for part in [&workspace, &locale] {
            validate_segment(part).map_err(|issue| RouteError::invalid_path(part, issue))?;
        }
        Ok(Self { workspace, locale })
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Store path of this scope's root, built from a template containing
    /// `{workspace}` and `{locale}` placeholders.
    pub fn root_path(&self, template: &str) -> Result<RoutePath> {
        let path = template
            .replace("{workspace}", &self.workspace)
            .replace("{locale}", &self.locale);
        RoutePath::parse(&path)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.workspace, self.locale)
    }
}
