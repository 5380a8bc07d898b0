//! Hierarchical node store - the storage collaborator of the route mapper.
//!
//! The mapper only talks to the [`NodeStore`] trait. [`memory`] provides a
//! session-buffered implementation with optimistic concurrency and optional
//! JSON file backing.
//!
//! # Architecture
//!
//! ```text
//! Repository (committed tree, version, file)
//!     │  session()
//!     ▼
//! Session ──── working copy ──── Mutation journal
//!     │  commit(): replay journal onto latest committed tree
//!     ▼
//! Repository (version + 1, persisted)
//! ```

pub mod memory;
mod mutation;
mod tree;

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use memory::{Repository, Session};

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// StoreError
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("node `{0}` not found")]
    NotFound(String),

    #[error("invalid node name `{0}`")]
    InvalidName(String),

    #[error("item `{0}` already exists")]
    ItemExists(String),

    /// Staged changes no longer apply to the latest committed state.
    #[error("concurrent modification of `{path}`")]
    Conflict { path: String },

    #[error("IO error when accessing `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("repository snapshot is malformed")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Identifiers & values
// ============================================================================

/// Stable node identifier, unchanged by rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A typed node property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    String(String),
    Integer(i64),
    Date(DateTime<Utc>),
    /// Reference to another identifiable item (node or content).
    Reference(Uuid),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub const fn as_reference(&self) -> Option<Uuid> {
        match self {
            Self::Reference(id) => Some(*id),
            _ => None,
        }
    }
}

/// Lightweight handle to a node, as seen when it was looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHandle {
    id: NodeId,
    path: String,
}

impl NodeHandle {
    pub(crate) fn new(id: NodeId, path: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }

    /// The node's identifier.
    #[inline]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Absolute store path at lookup time.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment (empty for the store root).
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }
}

// ============================================================================
// NodeStore
// ============================================================================

/// Session-scoped access to a hierarchical, referenceable node store.
///
/// Writes are staged until [`commit`](NodeStore::commit); reads observe the
/// session's own pending writes.
pub trait NodeStore {
    /// Look up a node by absolute path (`/` is the store root).
    fn find_by_path(&self, path: &str) -> StoreResult<Option<NodeHandle>>;

    fn find_by_identifier(&self, id: NodeId) -> StoreResult<Option<NodeHandle>>;

    /// Names of the node's children, in sibling order.
    fn child_names(&self, node: &NodeHandle) -> StoreResult<Vec<String>>;

    /// Create a child, or return the existing child with that name.
    fn create_child(&mut self, parent: &NodeHandle, name: &str) -> StoreResult<NodeHandle>;

    /// Rename a node in place, keeping its position among siblings.
    fn rename(&mut self, node: &NodeHandle, new_name: &str) -> StoreResult<NodeHandle>;

    fn property(&self, node: &NodeHandle, key: &str) -> StoreResult<Option<Value>>;

    /// Set a property; `None` removes it.
    fn set_property(&mut self, node: &NodeHandle, key: &str, value: Option<Value>)
    -> StoreResult<()>;

    /// Remove a node and all of its descendants.
    fn remove(&mut self, node: &NodeHandle) -> StoreResult<()>;

    /// All nodes holding a [`Value::Reference`] to `target`.
    fn referrers(&self, target: Uuid) -> StoreResult<Vec<NodeHandle>>;

    /// Make staged changes visible to other sessions.
    fn commit(&mut self) -> StoreResult<()>;

    /// Discard staged changes.
    fn rollback(&mut self) -> StoreResult<()>;

    /// Rebase onto the latest committed state, optionally keeping staged changes.
    fn refresh(&mut self, keep_changes: bool) -> StoreResult<()>;

    fn has_pending_changes(&self) -> bool;
}
