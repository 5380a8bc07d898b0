//! `routemap.toml` sections.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::DEFAULT_ROOT_TEMPLATE;

/// `[store]` - where committed state lives, relative to the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Route repository snapshot.
    pub path: PathBuf,
    /// Content parent map used for parent lookups.
    pub content: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: "routes.json".into(),
            content: "contents.json".into(),
        }
    }
}

/// `[routes]` - scope layout and the default scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesSection {
    /// Store path of a scope root.
    pub root: String,
    pub workspace: String,
    pub locale: String,
}

impl Default for RoutesSection {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT_TEMPLATE.to_string(),
            workspace: "default".to_string(),
            locale: "en".to_string(),
        }
    }
}

/// Separator between a segment and its disambiguation suffix.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Separator {
    /// `machines-1` (default)
    #[default]
    Dash,
    /// `machines_1`
    Underscore,
}

impl Separator {
    pub const fn as_char(self) -> char {
        match self {
            Self::Dash => '-',
            Self::Underscore => '_',
        }
    }
}

/// `[unique]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniqueSection {
    pub separator: Separator,
}

/// `[log]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub verbose: bool,
}
