//! In-memory node tree, used both as committed state and as session working copy.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{NodeHandle, NodeId, StoreError, StoreResult, Value};
use crate::core::validate_segment;

/// A single stored node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct NodeRecord {
    pub id: NodeId,
    pub name: String,
    pub parent: Option<NodeId>,
    /// Children in sibling order.
    #[serde(default)]
    pub children: Vec<NodeId>,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

/// Serialized form of a tree (node arena flattened to a list).
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct Snapshot {
    pub version: u64,
    pub root: NodeId,
    pub nodes: Vec<NodeRecord>,
}

#[derive(Debug, Clone)]
pub(super) struct NodeTree {
    root: NodeId,
    nodes: FxHashMap<NodeId, NodeRecord>,
    /// Reference target -> nodes holding a reference to it.
    refs: FxHashMap<Uuid, FxHashSet<NodeId>>,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// An empty tree. The root identifier is fixed so trees created
    /// independently can still be replayed onto each other.
    pub fn new() -> Self {
        let root = NodeId(Uuid::nil());
        let mut nodes = FxHashMap::default();
        nodes.insert(
            root,
            NodeRecord {
                id: root,
                name: String::new(),
                parent: None,
                children: Vec::new(),
                properties: BTreeMap::new(),
            },
        );
        Self {
            root,
            nodes,
            refs: FxHashMap::default(),
        }
    }

    #[inline]
    pub const fn root_id(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Absolute path of a node (`/` for the root).
    pub fn path_of(&self, id: NodeId) -> Option<String> {
        let mut names = Vec::new();
        let mut current = self.nodes.get(&id)?;
        while let Some(parent) = current.parent {
            names.push(current.name.as_str());
            current = self.nodes.get(&parent)?;
        }
        if names.is_empty() {
            return Some("/".to_string());
        }
        names.reverse();
        Some(format!("/{}", names.join("/")))
    }

    pub fn handle(&self, id: NodeId) -> Option<NodeHandle> {
        self.path_of(id).map(|path| NodeHandle::new(id, path))
    }

    /// Resolve an absolute path.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        if !path.starts_with('/') {
            return None;
        }
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self.root, |parent, name| self.child(parent, name))
    }

    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes
            .get(&parent)?
            .children
            .iter()
            .copied()
            .find(|child| self.nodes.get(child).is_some_and(|c| c.name == name))
    }

    pub fn child_names(&self, id: NodeId) -> Option<Vec<String>> {
        let record = self.nodes.get(&id)?;
        Some(
            record
                .children
                .iter()
                .filter_map(|child| self.nodes.get(child).map(|c| c.name.clone()))
                .collect(),
        )
    }

    /// Insert a new child with a caller-chosen identifier.
    pub fn insert_child(&mut self, parent: NodeId, name: &str, id: NodeId) -> StoreResult<()> {
        validate_name(name)?;
        if !self.contains(parent) {
            return Err(StoreError::NotFound(parent.to_string()));
        }
        if self.child(parent, name).is_some() {
            let path = self.child_path(parent, name);
            return Err(StoreError::ItemExists(path));
        }
        if self.contains(id) {
            return Err(StoreError::ItemExists(id.to_string()));
        }

        self.nodes.insert(
            id,
            NodeRecord {
                id,
                name: name.to_string(),
                parent: Some(parent),
                children: Vec::new(),
                properties: BTreeMap::new(),
            },
        );
        if let Some(record) = self.nodes.get_mut(&parent) {
            record.children.push(id);
        }
        Ok(())
    }

    pub fn rename(&mut self, id: NodeId, new_name: &str) -> StoreResult<()> {
        validate_name(new_name)?;
        let parent = self
            .nodes
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?
            .parent
            .ok_or_else(|| StoreError::InvalidName("/".to_string()))?;

        if let Some(existing) = self.child(parent, new_name)
            && existing != id
        {
            return Err(StoreError::ItemExists(self.child_path(parent, new_name)));
        }
        if let Some(record) = self.nodes.get_mut(&id) {
            record.name = new_name.to_string();
        }
        Ok(())
    }

    pub fn property(&self, id: NodeId, key: &str) -> Option<&Value> {
        self.nodes.get(&id)?.properties.get(key)
    }

    /// Set or clear a property, returning the previous value.
    pub fn set_property(
        &mut self,
        id: NodeId,
        key: &str,
        value: Option<Value>,
    ) -> StoreResult<Option<Value>> {
        let record = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let previous = match value.clone() {
            Some(value) => record.properties.insert(key.to_string(), value),
            None => record.properties.remove(key),
        };

        if let Some(Value::Reference(target)) = &previous
            && !self.holds_reference(id, *target)
        {
            self.unindex_reference(*target, id);
        }
        if let Some(Value::Reference(target)) = value {
            self.refs.entry(target).or_default().insert(id);
        }
        Ok(previous)
    }

    /// Remove a node and its subtree, returning the number of removed nodes.
    pub fn remove(&mut self, id: NodeId) -> StoreResult<usize> {
        let parent = self
            .nodes
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?
            .parent
            .ok_or_else(|| StoreError::InvalidName("/".to_string()))?;

        let subtree = self.subtree(id);
        for node in &subtree {
            let Some(record) = self.nodes.remove(node) else {
                continue;
            };
            for value in record.properties.values() {
                if let Value::Reference(target) = value {
                    self.unindex_reference(*target, *node);
                }
            }
        }
        if let Some(record) = self.nodes.get_mut(&parent) {
            record.children.retain(|child| *child != id);
        }
        Ok(subtree.len())
    }

    /// Node and all descendants, pre-order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if let Some(record) = self.nodes.get(&node) {
                out.push(node);
                stack.extend(record.children.iter().rev().copied());
            }
        }
        out
    }

    /// Nodes holding a reference to `target`, in identifier order.
    pub fn referrers(&self, target: Uuid) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .refs
            .get(&target)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Whether any property of `node` still references `target`.
    fn holds_reference(&self, node: NodeId, target: Uuid) -> bool {
        self.nodes.get(&node).is_some_and(|record| {
            record
                .properties
                .values()
                .any(|value| matches!(value, Value::Reference(t) if *t == target))
        })
    }

    fn unindex_reference(&mut self, target: Uuid, node: NodeId) {
        if let Some(set) = self.refs.get_mut(&target) {
            set.remove(&node);
            if set.is_empty() {
                self.refs.remove(&target);
            }
        }
    }

    fn child_path(&self, parent: NodeId, name: &str) -> String {
        match self.path_of(parent).as_deref() {
            Some("/") | None => format!("/{name}"),
            Some(path) => format!("{path}/{name}"),
        }
    }

    // ========================================================================
    // snapshots
    // ========================================================================

    pub fn to_snapshot(&self, version: u64) -> Snapshot {
        // Pre-order keeps parents ahead of children in the file
        let nodes = self
            .subtree(self.root)
            .into_iter()
            .filter_map(|id| self.nodes.get(&id).cloned())
            .collect();
        Snapshot {
            version,
            root: self.root,
            nodes,
        }
    }

    pub fn from_snapshot(snapshot: Snapshot) -> StoreResult<(Self, u64)> {
        let mut nodes = FxHashMap::default();
        let mut refs: FxHashMap<Uuid, FxHashSet<NodeId>> = FxHashMap::default();
        for record in snapshot.nodes {
            for value in record.properties.values() {
                if let Value::Reference(target) = value {
                    refs.entry(*target).or_default().insert(record.id);
                }
            }
            nodes.insert(record.id, record);
        }
        if !nodes.contains_key(&snapshot.root) {
            return Err(StoreError::NotFound(snapshot.root.to_string()));
        }
        Ok((
            Self {
                root: snapshot.root,
                nodes,
                refs,
            },
            snapshot.version,
        ))
    }
}

fn validate_name(name: &str) -> StoreResult<()> {
    validate_segment(name).map_err(|_| StoreError::InvalidName(name.to_string()))
}
