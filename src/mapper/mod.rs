//! Route tree mapper - human readable paths to content, per scope.
//!
//! Each [`Scope`] owns one tree below a store path built from the root
//! template. Leaves carry a route record (see [`RouteNode`]):
//!
//! ```text
//! /cmf/default/routes/en               scope root
//! ├── products                         structural
//! │   ├── machines      path     -> content A
//! │   └── old-machines  history  -> content A (redirect: machines)
//! └── about             path     -> content B
//! ```
//!
//! # Module Structure
//!
//! - [`node`]: route records and scoped read access
//! - [`history`]: redirect resolution and path history
//!
//! The mapper only stages changes. Callers commit through
//! [`store_mut`](RouteTreeMapper::store_mut).

mod history;
mod node;

#[cfg(test)]
mod tests;

use chrono::Utc;

pub use history::HistoryEntry;
pub use node::{RouteKind, RouteNode};

use history::HistoryChainResolver;
use node::{CONTENT, CREATED, KIND, REDIRECT, SEQUENCE, ScopedTree};

use crate::content::{ContentEntity, ContentId, ContentSource};
use crate::core::{DEFAULT_ROOT_TEMPLATE, RoutePath, Scope, UniqueNameResolver, segments};
use crate::debug;
use crate::error::{Result, RouteError};
use crate::store::{NodeHandle, NodeStore, StoreError, Value};
use crate::utils::plural_count;

/// Mapper settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperOptions {
    /// Store path of a scope root, with `{workspace}` and `{locale}` placeholders.
    pub root_template: String,
    /// Separator between a segment and its disambiguation suffix.
    pub separator: char,
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            root_template: DEFAULT_ROOT_TEMPLATE.to_string(),
            separator: '-',
        }
    }
}

/// One node of a scope listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: RoutePath,
    pub depth: usize,
    /// `None` for structural nodes.
    pub route: Option<RouteNode>,
}

#[derive(Debug)]
pub struct RouteTreeMapper<S> {
    store: S,
    options: MapperOptions,
    resolver: UniqueNameResolver,
}

impl<S: NodeStore> RouteTreeMapper<S> {
    pub fn new(store: S) -> Self {
        Self::with_options(store, MapperOptions::default())
    }

    pub fn with_options(store: S, options: MapperOptions) -> Self {
        let resolver = UniqueNameResolver::new(options.separator);
        Self {
            store,
            options,
            resolver,
        }
    }

    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store access for the session boundary (commit, rollback, refresh).
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Store path of the scope's tree root.
    pub fn scope_root(&self, scope: &Scope) -> Result<RoutePath> {
        scope.root_path(&self.options.root_template)
    }

    // ========================================================================
    // Uniqueness
    // ========================================================================

    /// Check that no current path node exists at `path`.
    pub fn unique(&self, path: &str, scope: &Scope) -> Result<bool> {
        let logical = RoutePath::parse(path)?;
        let root = self.scope_root(scope)?;
        let tree = ScopedTree::new(&self.store, &root);
        Ok(!tree.route_at(&logical)?.is_some_and(|node| node.is_current()))
    }

    /// Disambiguate the last segment of `path` against every child of its
    /// parent. Free paths, the root and paths below a missing parent come
    /// back unchanged.
    pub fn unique_path(&self, path: &str, scope: &Scope) -> Result<RoutePath> {
        let logical = RoutePath::parse(path)?;
        let Some((parent, name)) = logical.split_last() else {
            return Ok(RoutePath::root());
        };

        let root = self.scope_root(scope)?;
        let tree = ScopedTree::new(&self.store, &root);
        let Some(parent_node) = tree.handle_at(&parent)? else {
            return Ok(logical.clone());
        };

        let siblings = self.store.child_names(&parent_node)?;
        let name = self.resolver.resolve(&siblings, name);
        Ok(parent.join_unchecked(&name))
    }

    // ========================================================================
    // Save
    // ========================================================================

    /// Route `content` at `path`.
    ///
    /// A previous current path of the content becomes a history node, and
    /// every history node of the content is redirected to the new path node.
    /// Fails with [`RouteError::AlreadyExists`] if another content owns
    /// `path`, as its current or a history route. Changes are staged, not
    /// committed.
    pub fn save(&mut self, content: ContentId, path: &str, scope: &Scope) -> Result<RouteNode> {
        segments(path)?;
        let logical = RoutePath::parse(path)?;
        let root = self.scope_root(scope)?;

        let (existing, routes) = {
            let tree = ScopedTree::new(&self.store, &root);
            (tree.route_at(&logical)?, tree.routes_of(content)?)
        };

        if let Some(node) = &existing {
            // A history node still resolves to its content
            if node.content != content {
                return Err(RouteError::AlreadyExists {
                    path: logical.to_string(),
                });
            }
            if node.is_current() {
                debug!("mapper"; "{} already routed at {}", content, logical);
                return Ok(node.clone());
            }
        }

        let created_at = Utc::now();
        let sequence = routes.iter().map(|r| r.sequence + 1).max().unwrap_or(0);

        for route in routes.iter().filter(|r| r.is_current()) {
            let handle = self.handle_of(route)?;
            self.store
                .set_property(&handle, KIND, Some(kind_value(RouteKind::History)))?;
            debug!("mapper"; "{} moved: {} -> {}", content, route.path, logical);
        }

        let node = self.ensure_path(&root.concat(&logical))?;
        if existing.is_some() {
            debug!("mapper"; "reclaiming history route {} of {}", logical, content);
        }
        self.store
            .set_property(&node, KIND, Some(kind_value(RouteKind::Path)))?;
        self.store
            .set_property(&node, CONTENT, Some(Value::Reference(content.0)))?;
        self.store
            .set_property(&node, CREATED, Some(Value::Date(created_at)))?;
        self.store
            .set_property(&node, SEQUENCE, Some(Value::Integer(sequence)))?;
        self.store.set_property(&node, REDIRECT, None)?;

        // Every earlier route now redirects straight to the new node
        let redirect = Value::Reference(node.id().0);
        for route in routes.iter().filter(|r| r.id != node.id()) {
            let handle = self.handle_of(route)?;
            self.store
                .set_property(&handle, REDIRECT, Some(redirect.clone()))?;
        }
        if !routes.is_empty() {
            debug!("mapper"; "redirected {} of {} to {}", plural_count(routes.len(), "earlier route"), content, logical);
        }

        Ok(RouteNode {
            id: node.id(),
            path: logical,
            kind: RouteKind::Path,
            content,
            created_at,
            sequence,
            redirect: None,
        })
    }

    /// Route an entity at its own resource segment.
    pub fn save_entity<E: ContentEntity>(&mut self, entity: &E, scope: &Scope) -> Result<RouteNode> {
        self.save(entity.uuid(), entity.resource_segment(), scope)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn load_by_content<E: ContentEntity>(&self, entity: &E, scope: &Scope) -> Result<RoutePath> {
        self.load_by_content_uuid(entity.uuid(), scope)
    }

    /// Current path of a content entity.
    pub fn load_by_content_uuid(&self, content: ContentId, scope: &Scope) -> Result<RoutePath> {
        let root = self.scope_root(scope)?;
        ScopedTree::new(&self.store, &root)
            .current_of(content)?
            .map(|node| node.path)
            .ok_or_else(|| RouteError::not_found(format!("route of content {content}")))
    }

    /// Content routed at `path`.
    ///
    /// A history node yields [`RouteError::Moved`] with the content's current
    /// location. Structural nodes are not routes and yield `NotFound`.
    pub fn load_by_resource_locator(&self, path: &str, scope: &Scope) -> Result<ContentId> {
        let logical = RoutePath::parse(path)?;
        let root = self.scope_root(scope)?;
        let tree = ScopedTree::new(&self.store, &root);

        let Some(node) = tree.route_at(&logical)? else {
            return Err(RouteError::not_found(format!("resource locator `{logical}`")));
        };
        match node.kind {
            RouteKind::Path => Ok(node.content),
            RouteKind::History => {
                let current = HistoryChainResolver::new(&tree).resolve(&node)?;
                Err(RouteError::Moved {
                    path: logical,
                    location: current.path,
                    content: node.content,
                })
            }
        }
    }

    /// Path of the nearest ancestor of `content` routed in this scope.
    pub fn parent_path<C: ContentSource>(
        &self,
        source: &C,
        content: ContentId,
        scope: &Scope,
    ) -> Result<Option<RoutePath>> {
        let root = self.scope_root(scope)?;
        let tree = ScopedTree::new(&self.store, &root);
        for ancestor in source.ancestors(content) {
            if let Some(node) = tree.current_of(ancestor)? {
                return Ok(Some(node.path));
            }
        }
        Ok(None)
    }

    /// Every path ever routed to `content` in this scope, newest first.
    pub fn load_history_by_content_uuid(
        &self,
        content: ContentId,
        scope: &Scope,
    ) -> Result<Vec<HistoryEntry>> {
        let root = self.scope_root(scope)?;
        let tree = ScopedTree::new(&self.store, &root);
        HistoryChainResolver::new(&tree).history(content)
    }

    /// Depth-first listing of the scope's tree, scope root first.
    pub fn tree(&self, scope: &Scope) -> Result<Vec<TreeEntry>> {
        let root = self.scope_root(scope)?;
        let tree = ScopedTree::new(&self.store, &root);
        let Some(handle) = tree.handle_at(&RoutePath::root())? else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        let mut stack = vec![(RoutePath::root(), handle)];
        while let Some((path, handle)) = stack.pop() {
            for name in self.store.child_names(&handle)?.iter().rev() {
                let child = path.join_unchecked(name);
                if let Some(child_handle) = tree.handle_at(&child)? {
                    stack.push((child, child_handle));
                }
            }
            entries.push(TreeEntry {
                depth: path.depth(),
                route: tree.load(&handle)?,
                path,
            });
        }
        Ok(entries)
    }

    // ========================================================================
    // Delete
    // ========================================================================

    /// Remove the node at `path` with its whole subtree, whatever the kinds.
    ///
    /// An absent, empty or root path is refused with
    /// [`RouteError::InvalidArgument`] before anything is touched.
    pub fn delete_by_path<'p>(
        &mut self,
        path: impl Into<Option<&'p str>>,
        scope: &Scope,
    ) -> Result<()> {
        let Some(raw) = path.into() else {
            return Err(RouteError::InvalidArgument("an absent path".to_string()));
        };
        if raw.trim().is_empty() {
            return Err(RouteError::InvalidArgument("an empty path".to_string()));
        }
        let logical = RoutePath::parse(raw)?;
        if logical.is_root() {
            return Err(RouteError::InvalidArgument(format!(
                "the whole route tree (`{raw}`)"
            )));
        }

        let root = self.scope_root(scope)?;
        let handle = ScopedTree::new(&self.store, &root)
            .handle_at(&logical)?
            .ok_or_else(|| RouteError::not_found(format!("resource locator `{logical}`")))?;
        self.store.remove(&handle)?;
        debug!("mapper"; "deleted {} in {}", logical, scope);
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Walk to `target`, creating structural nodes for missing segments.
    fn ensure_path(&mut self, target: &RoutePath) -> Result<NodeHandle> {
        let mut node = self
            .store
            .find_by_path("/")?
            .ok_or_else(|| StoreError::NotFound("/".to_string()))?;
        for segment in target.segments() {
            node = self.store.create_child(&node, segment)?;
        }
        Ok(node)
    }

    fn handle_of(&self, route: &RouteNode) -> Result<NodeHandle> {
        self.store
            .find_by_identifier(route.id)?
            .ok_or_else(|| RouteError::not_found(format!("route node {}", route.id)))
    }
}

fn kind_value(kind: RouteKind) -> Value {
    Value::String(kind.as_str().to_string())
}
