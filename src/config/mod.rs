//! `routemap.toml` configuration.
//!
//! ```toml
//! [store]
//! path = "routes.json"
//! content = "contents.json"
//!
//! [routes]
//! root = "/cmf/{workspace}/routes/{locale}"
//! workspace = "default"
//! locale = "en"
//!
//! [unique]
//! separator = "dash"
//!
//! [log]
//! verbose = false
//! ```
//!
//! Every field has a default, and a missing file means all defaults.

mod error;
mod section;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

pub use error::ConfigError;
pub use section::{LogSection, RoutesSection, Separator, StoreSection, UniqueSection};

use crate::core::Scope;
use crate::mapper::MapperOptions;
use crate::{debug, log};

/// Default config file name.
pub const CONFIG_FILE: &str = "routemap.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Directory relative store paths resolve against.
    #[serde(skip)]
    root: PathBuf,

    pub store: StoreSection,
    pub routes: RoutesSection,
    pub unique: UniqueSection,
    pub log: LogSection,
}

impl RouteConfig {
    /// Load and validate the config at `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_path(path)?
        } else {
            debug!("config"; "{} not found, using defaults", path.display());
            Self::default()
        };
        config.set_root(path.parent().unwrap_or(Path::new("")));
        config.validate()?;
        Ok(config)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "ignoring unknown fields in {}:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    /// Check the scope root template and the default scope.
    pub fn validate(&self) -> Result<()> {
        let template = &self.routes.root;
        if !template.starts_with('/') {
            bail!(ConfigError::Validation(format!(
                "routes.root `{template}` must be an absolute store path"
            )));
        }
        for placeholder in ["{workspace}", "{locale}"] {
            if !template.contains(placeholder) {
                bail!(ConfigError::Validation(format!(
                    "routes.root `{template}` must contain `{placeholder}`"
                )));
            }
        }

        let scope = self
            .default_scope()
            .map_err(|err| ConfigError::Validation(format!("routes: {err}")))?;
        scope
            .root_path(template)
            .map_err(|err| ConfigError::Validation(format!("routes.root: {err}")))?;
        Ok(())
    }

    pub fn get_root(&self) -> &Path {
        &self.root
    }

    pub fn set_root(&mut self, root: &Path) {
        self.root = root.to_path_buf();
    }

    /// Route repository file.
    pub fn store_path(&self) -> PathBuf {
        self.root.join(&self.store.path)
    }

    /// Content parent map file.
    pub fn content_path(&self) -> PathBuf {
        self.root.join(&self.store.content)
    }

    /// Scope used when the command line names none.
    pub fn default_scope(&self) -> crate::error::Result<Scope> {
        Scope::new(&self.routes.workspace, &self.routes.locale)
    }

    pub fn mapper_options(&self) -> MapperOptions {
        MapperOptions {
            root_template: self.routes.root.clone(),
            separator: self.unique.separator.as_char(),
        }
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Parse a config, failing on unknown fields.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> RouteConfig {
    let (parsed, ignored) = RouteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
