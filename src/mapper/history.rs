//! Redirect resolution and path history of one content entity.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use serde::Serialize;

use super::node::{RouteKind, RouteNode, ScopedTree};
use crate::content::ContentId;
use crate::core::RoutePath;
use crate::error::{Result, RouteError};
use crate::store::NodeStore;

/// One past or present path of a content entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub path: RoutePath,
    pub kind: RouteKind,
    pub created_at: DateTime<Utc>,
}

impl From<&RouteNode> for HistoryEntry {
    fn from(node: &RouteNode) -> Self {
        Self {
            path: node.path.clone(),
            kind: node.kind,
            created_at: node.created_at,
        }
    }
}

/// Decides where a superseded route leads.
///
/// History nodes redirect straight to the current path node, so a lookup is
/// normally a single hop. Chains left by older data are still followed, and a
/// dangling redirect falls back to the content's current path node.
pub(super) struct HistoryChainResolver<'t, 'a, S> {
    tree: &'t ScopedTree<'a, S>,
}

impl<'t, 'a, S: NodeStore> HistoryChainResolver<'t, 'a, S> {
    pub fn new(tree: &'t ScopedTree<'a, S>) -> Self {
        Self { tree }
    }

    /// Current path node reached from `node`.
    pub fn resolve(&self, node: &RouteNode) -> Result<RouteNode> {
        let mut seen = FxHashSet::default();
        let mut current = node.clone();

        loop {
            if current.is_current() {
                return Ok(current);
            }
            if !seen.insert(current.id) {
                break;
            }
            let Some(next) = current.redirect else {
                break;
            };
            match self.tree.by_id(next)? {
                Some(target) if target.content == node.content => current = target,
                _ => break,
            }
        }

        self.tree
            .current_of(node.content)?
            .ok_or_else(|| RouteError::not_found(format!("current path of content {}", node.content)))
    }

    /// Every route of `content`, newest first.
    pub fn history(&self, content: ContentId) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .tree
            .routes_of(content)?
            .iter()
            .map(HistoryEntry::from)
            .collect())
    }
}
