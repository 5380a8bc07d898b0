//! Route records as stored on nodes, and read access to one scope's tree.
//!
//! A route node is an ordinary store node carrying `route:*` properties.
//! Nodes without `route:kind` are neutral structural segments.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::ContentId;
use crate::core::RoutePath;
use crate::store::{NodeHandle, NodeId, NodeStore, StoreResult, Value};

pub(super) const KIND: &str = "route:kind";
pub(super) const CONTENT: &str = "route:content";
/// History nodes only: identifier of the content's current path node.
pub(super) const REDIRECT: &str = "route:redirect";
pub(super) const CREATED: &str = "route:created";
/// Per-content creation counter, orders routes created within one tick.
pub(super) const SEQUENCE: &str = "route:sequence";

/// Route node kind. `Path -> History` is the only transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// Currently active and resolvable.
    Path,
    /// Superseded; resolves as a redirect.
    History,
}

impl RouteKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::History => "history",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(Self::Path),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One entry of a route tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteNode {
    /// Store node identifier.
    pub id: NodeId,
    /// Path relative to the scope root.
    pub path: RoutePath,
    pub kind: RouteKind,
    pub content: ContentId,
    pub created_at: DateTime<Utc>,
    pub sequence: i64,
    /// Current path node of the content, set on history nodes.
    pub redirect: Option<NodeId>,
}

impl RouteNode {
    pub const fn is_current(&self) -> bool {
        matches!(self.kind, RouteKind::Path)
    }

    /// Newest first; the sequence breaks timestamp ties.
    pub(super) fn newest_first(a: &Self, b: &Self) -> std::cmp::Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.sequence.cmp(&a.sequence))
    }
}

/// Read-only view of one scope's route tree.
pub(super) struct ScopedTree<'a, S> {
    store: &'a S,
    root: &'a RoutePath,
}

impl<'a, S: NodeStore> ScopedTree<'a, S> {
    pub fn new(store: &'a S, root: &'a RoutePath) -> Self {
        Self { store, root }
    }

    /// Store path of a logical path.
    pub fn store_path(&self, logical: &RoutePath) -> RoutePath {
        self.root.concat(logical)
    }

    pub fn handle_at(&self, logical: &RoutePath) -> StoreResult<Option<NodeHandle>> {
        self.store.find_by_path(self.store_path(logical).as_str())
    }

    /// Route node at a logical path; `None` for absent or structural nodes.
    pub fn route_at(&self, logical: &RoutePath) -> StoreResult<Option<RouteNode>> {
        match self.handle_at(logical)? {
            Some(handle) => self.load(&handle),
            None => Ok(None),
        }
    }

    /// Decode the route record of a node inside this scope.
    pub fn load(&self, handle: &NodeHandle) -> StoreResult<Option<RouteNode>> {
        let Some(path) = RoutePath::parse(handle.path())
            .ok()
            .and_then(|path| path.strip_ancestor(self.root))
        else {
            return Ok(None);
        };

        let kind = self.store.property(handle, KIND)?;
        let Some(kind) = kind.as_ref().and_then(Value::as_str).and_then(RouteKind::parse) else {
            return Ok(None);
        };
        let Some(content) = self
            .store
            .property(handle, CONTENT)?
            .and_then(|v| v.as_reference())
        else {
            return Ok(None);
        };

        let created_at = self
            .store
            .property(handle, CREATED)?
            .and_then(|v| v.as_date())
            .unwrap_or_default();
        let sequence = self
            .store
            .property(handle, SEQUENCE)?
            .and_then(|v| v.as_integer())
            .unwrap_or_default();
        let redirect = self
            .store
            .property(handle, REDIRECT)?
            .and_then(|v| v.as_reference())
            .map(NodeId);

        Ok(Some(RouteNode {
            id: handle.id(),
            path,
            kind,
            content: ContentId(content),
            created_at,
            sequence,
            redirect,
        }))
    }

    /// Every route node of `content` in this scope, newest first.
    pub fn routes_of(&self, content: ContentId) -> StoreResult<Vec<RouteNode>> {
        let mut routes = Vec::new();
        for handle in self.store.referrers(content.0)? {
            if let Some(route) = self.load(&handle)?
                && route.content == content
            {
                routes.push(route);
            }
        }
        routes.sort_by(RouteNode::newest_first);
        Ok(routes)
    }

    /// The content's current path node, if it has one in this scope.
    pub fn current_of(&self, content: ContentId) -> StoreResult<Option<RouteNode>> {
        Ok(self
            .routes_of(content)?
            .into_iter()
            .find(RouteNode::is_current))
    }

    pub fn by_id(&self, id: NodeId) -> StoreResult<Option<RouteNode>> {
        match self.store.find_by_identifier(id)? {
            Some(handle) => self.load(&handle),
            None => Ok(None),
        }
    }
}
