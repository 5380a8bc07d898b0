//! Content entities - the external side the route tree indexes.
//!
//! The mapper never owns content. It needs a stable identifier and a desired
//! path from an entity ([`ContentEntity`]), and the entity's ancestor chain
//! for parent lookups ([`ContentSource`]).

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a content entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub Uuid);

impl ContentId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl From<Uuid> for ContentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// An entity that can be routed.
pub trait ContentEntity {
    fn uuid(&self) -> ContentId;

    /// Desired logical path, set by the entity's own editing workflow.
    fn resource_segment(&self) -> &str;
}

/// Ancestor lookup for content entities.
pub trait ContentSource {
    /// Ancestors of `id`, nearest first. Unknown ids have none.
    fn ancestors(&self, id: ContentId) -> Vec<ContentId>;
}

impl<T: ContentSource + ?Sized> ContentSource for &T {
    fn ancestors(&self, id: ContentId) -> Vec<ContentId> {
        (**self).ancestors(id)
    }
}

/// Minimal routable entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub uuid: ContentId,
    pub resource_segment: String,
}

impl Content {
    pub fn new(uuid: ContentId, resource_segment: impl Into<String>) -> Self {
        Self {
            uuid,
            resource_segment: resource_segment.into(),
        }
    }
}

impl ContentEntity for Content {
    fn uuid(&self) -> ContentId {
        self.uuid
    }

    fn resource_segment(&self) -> &str {
        &self.resource_segment
    }
}

// ============================================================================
// ContentTree
// ============================================================================

/// Content hierarchy kept as a child -> parent map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTree {
    #[serde(default)]
    parents: BTreeMap<ContentId, ContentId>,
}

impl ContentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file. A missing file yields an empty tree.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read content tree: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Malformed content tree: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write content tree: {}", path.display()))
    }

    pub fn parent(&self, child: ContentId) -> Option<ContentId> {
        self.parents.get(&child).copied()
    }

    /// Attach `child` below `parent`. Returns `false` (and changes nothing)
    /// if that would make `child` its own ancestor.
    pub fn set_parent(&mut self, child: ContentId, parent: ContentId) -> bool {
        if child == parent || self.ancestors(parent).contains(&child) {
            return false;
        }
        self.parents.insert(child, parent);
        true
    }

    pub fn remove_parent(&mut self, child: ContentId) -> Option<ContentId> {
        self.parents.remove(&child)
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

impl ContentSource for ContentTree {
    fn ancestors(&self, id: ContentId) -> Vec<ContentId> {
        let mut seen = FxHashSet::default();
        let mut chain = Vec::new();
        let mut current = id;
        seen.insert(current);
        // A hand-edited file may still contain a cycle
        while let Some(parent) = self.parent(current) {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }
}
